//! Configuration errors. All of them are fatal at startup.

/// Errors raised while validating keeper configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required option: {option}")]
    MissingOption { option: String },

    #[error("Invalid value for {option}: {reason}")]
    InvalidOption { option: String, reason: String },

    #[error("Invalid private key: {message}")]
    InvalidPrivateKey { message: String },

    #[error("Account {account} does not match the signing key address {signer}")]
    AccountMismatch { account: String, signer: String },
}

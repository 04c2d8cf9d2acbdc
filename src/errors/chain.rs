//! Chain access errors that are not covered by Alloy's own error types.

/// Errors raised by chain collaborators
#[derive(Debug, thiserror::Error)]
pub enum ChainError {
    #[error("Transient chain error: {message}")]
    Transient { message: String },

    #[error("Chain unreachable: {message}")]
    Unreachable { message: String },

    #[error("Receipt for {tx_hash} not found")]
    ReceiptNotFound { tx_hash: String },

    #[error("Unexpected chain response: {message}")]
    UnexpectedResponse { message: String },
}

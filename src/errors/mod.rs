//! Error handling and reporting for the arbitrage keeper.
//!
//! The error system is organized into domain-specific error types:
//!
//! - **`ChainError`**: Failures talking to the chain that Alloy does not model
//! - **`ConfigError`**: Invalid or missing configuration (fatal at startup)
//! - **`ExecutionError`**: Approval staging and plan submission failures
//! - **`GraphError`**: Asset/edge graph construction errors
//! - **`MarketError`**: Snapshot construction errors such as a stale feed
//! - **`NumericError`**: Fixed-decimal parsing and arithmetic errors
//! - **`PathError`**: Path validation and sizing errors
//! - **`UtilityError`**: Type conversion errors
//!
//! `KeeperError` wraps all of them plus the Alloy errors that can surface
//! from contract calls, RPC transport and local signing.
//!
//! # Propagation policy
//!
//! Transient chain errors are retried inside a phase (see
//! [`KeeperError::is_transient`]). Configuration errors and arithmetic
//! invariant violations propagate to process exit with the code given by
//! [`KeeperError::exit_code`]. Everything else abandons the current cycle.

pub mod chain;
pub mod config;
pub mod execution;
pub mod graph;
pub mod market;
pub mod numeric;
pub mod path;
pub mod utility;

pub use chain::ChainError;
pub use config::ConfigError;
pub use execution::ExecutionError;
pub use graph::GraphError;
pub use market::MarketError;
pub use numeric::NumericError;
pub use path::PathError;
pub use utility::UtilityError;

/// Main result type for the library
pub type Result<T> = std::result::Result<T, KeeperError>;

/// Exit code for a missing or invalid argument.
pub const EXIT_INVALID_ARGUMENT: u8 = 2;
/// Exit code when the chain cannot be reached at startup.
pub const EXIT_CHAIN_UNREACHABLE: u8 = 3;
/// Exit code for a base asset outside the market universe.
pub const EXIT_UNKNOWN_BASE_ASSET: u8 = 4;

/// Top-level error enum that encompasses all possible errors in the keeper.
#[derive(Debug, thiserror::Error)]
pub enum KeeperError {
    /// Chain access failure not covered by Alloy's error types.
    #[error("Chain error: {0}")]
    Chain(#[from] ChainError),

    /// Invalid configuration; fatal at startup.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Approval staging or submission failure.
    #[error("Execution failed: {0}")]
    Execution(#[from] ExecutionError),

    /// Market graph construction failure.
    #[error("Graph operation failed: {0}")]
    Graph(#[from] GraphError),

    /// Snapshot construction failure, including a stale price feed.
    #[error("Market snapshot failed: {0}")]
    Market(#[from] MarketError),

    /// Fixed-decimal parsing or arithmetic failure.
    #[error("Numeric error: {0}")]
    Numeric(#[from] NumericError),

    /// Path validation or sizing failure.
    #[error("Path operation failed: {0}")]
    Path(#[from] PathError),

    /// Type conversion failure.
    #[error("Utility error: {0}")]
    Utility(#[from] UtilityError),

    /// Contract call error from an Alloy contract instance.
    #[error("Contract error: {0}")]
    Contract(#[from] alloy::contract::Error),

    /// RPC communication error with the node.
    #[error("RPC error: {0}")]
    Rpc(#[from] alloy::transports::RpcError<alloy::transports::TransportErrorKind>),

    /// Local signer error for private key operations.
    #[error("Local signer error: {0}")]
    LocalSigner(#[from] alloy::signers::local::LocalSignerError),

    /// Generic error for cases not covered by specific error types.
    #[error("Generic error: {0}")]
    Other(#[from] anyhow::Error),
}

impl KeeperError {
    /// Whether retrying the current phase may succeed.
    ///
    /// Network timeouts, transport failures and missing receipts are
    /// transient. Reverts, configuration and arithmetic errors are not.
    pub fn is_transient(&self) -> bool {
        match self {
            KeeperError::Chain(ChainError::Transient { .. })
            | KeeperError::Chain(ChainError::ReceiptNotFound { .. }) => true,
            KeeperError::Rpc(err) => is_transient_rpc(err),
            KeeperError::Contract(alloy::contract::Error::TransportError(err)) => is_transient_rpc(err),
            _ => false,
        }
    }

    /// Whether the error means the snapshot could not be trusted this block.
    pub fn is_stale_feed(&self) -> bool {
        matches!(self, KeeperError::Market(MarketError::StaleFeed))
    }

    /// Process exit code for errors that abort startup.
    pub fn exit_code(&self) -> u8 {
        match self {
            KeeperError::Config(_) | KeeperError::Numeric(NumericError::InvalidDecimal { .. }) => {
                EXIT_INVALID_ARGUMENT
            }
            KeeperError::Utility(UtilityError::AddressParsingFailed { .. }) => EXIT_INVALID_ARGUMENT,
            KeeperError::LocalSigner(_) => EXIT_INVALID_ARGUMENT,
            KeeperError::Market(MarketError::UnknownBaseAsset { .. }) => EXIT_UNKNOWN_BASE_ASSET,
            KeeperError::Chain(ChainError::Unreachable { .. }) | KeeperError::Rpc(_) => {
                EXIT_CHAIN_UNREACHABLE
            }
            _ => 1,
        }
    }
}

fn is_transient_rpc(err: &alloy::transports::RpcError<alloy::transports::TransportErrorKind>) -> bool {
    use alloy::transports::RpcError;

    match err {
        RpcError::Transport(_) | RpcError::NullResp => true,
        RpcError::ErrorResp(payload) => payload.code == -32005 || payload.code == 429,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        let transient: KeeperError = ChainError::Transient {
            message: "timeout".to_string(),
        }
        .into();
        assert!(transient.is_transient());

        let missing_receipt: KeeperError = ChainError::ReceiptNotFound {
            tx_hash: "0xabc".to_string(),
        }
        .into();
        assert!(missing_receipt.is_transient());

        let stale: KeeperError = MarketError::StaleFeed.into();
        assert!(!stale.is_transient());
        assert!(stale.is_stale_feed());
    }

    #[test]
    fn test_exit_codes() {
        let config: KeeperError = ConfigError::MissingOption {
            option: "account".to_string(),
        }
        .into();
        assert_eq!(config.exit_code(), EXIT_INVALID_ARGUMENT);

        let unreachable: KeeperError = ChainError::Unreachable {
            message: "connection refused".to_string(),
        }
        .into();
        assert_eq!(unreachable.exit_code(), EXIT_CHAIN_UNREACHABLE);

        let unknown: KeeperError = MarketError::UnknownBaseAsset {
            asset: "mkr".to_string(),
        }
        .into();
        assert_eq!(unknown.exit_code(), EXIT_UNKNOWN_BASE_ASSET);

        let other: KeeperError = ExecutionError::EmptyPlan.into();
        assert_eq!(other.exit_code(), 1);
    }
}

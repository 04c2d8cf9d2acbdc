//! Market snapshot errors.

use alloy::primitives::Address;

/// Errors that prevent a market snapshot from being built
#[derive(Debug, thiserror::Error)]
pub enum MarketError {
    #[error("Price feed is stale or missing")]
    StaleFeed,

    #[error("Unknown base asset: {asset}")]
    UnknownBaseAsset { asset: String },

    #[error("Token {token} is not part of the market universe")]
    UnknownToken { token: Address },

    #[error("Invalid vault state: {reason}")]
    InvalidVaultState { reason: String },

    #[error("Market graph error: {0}")]
    Graph(#[from] super::GraphError),
}

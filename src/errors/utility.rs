//! Utility function errors

use thiserror::Error;

/// Errors that can occur in utility functions
#[derive(Debug, Error)]
pub enum UtilityError {
    #[error("Failed to parse address from string '{input}': {source}")]
    AddressParsingFailed {
        input: String,
        #[source]
        source: alloy::primitives::AddressError,
    },

    #[error("Value too large to fit in the target integer type")]
    ValueTooLarge,
}

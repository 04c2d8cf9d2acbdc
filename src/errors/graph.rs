//! Market graph construction errors.

use alloy::primitives::Address;

/// Errors that can occur while assembling the asset/edge graph
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    #[error("Asset not found with address: {address}")]
    AssetNotFound { address: Address },

    #[error("Invalid asset index: {index}")]
    InvalidAssetIndex { index: usize },

    #[error("Invalid edge index: {index}")]
    InvalidEdgeIndex { index: usize },

    #[error("Edge {key} already exists in the graph")]
    DuplicateEdge { key: String },

    #[error("Edge {key} connects an asset to itself")]
    SelfLoop { key: String },
}

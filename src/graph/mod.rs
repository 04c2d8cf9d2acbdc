//! Market graph for cycle discovery.
//!
//! Nodes are the three vault tokens `gem`, `skr` and `sai`; edges are directed
//! exchanges between them. Book orders in any other token are left out.
//! Vault operations become fixed-price edges with optional supply caps.
//! Resting book orders become edges that fill linearly up to the order's
//! remaining `buy_amount`.

pub mod types;
pub mod core;

// Re-export all public types for convenience
pub use types::{Asset, AssetId, Capacity, Edge, EdgeId, EdgeKey, EdgeKind, OrderId, VaultOp};
pub use core::MarketGraph;

//! Core market graph implementation.
//!
//! This module contains the `MarketGraph` struct and its methods for holding
//! the assets and directed edges of one market snapshot.

use super::types::{Asset, AssetId, Edge, EdgeId, EdgeKey};
use crate::errors::GraphError;
use crate::GraphResult;
use alloy::primitives::Address;
use std::collections::{HashMap, HashSet, VecDeque};

/// Directed multigraph of assets and exchange edges.
///
/// - Nodes are tokens
/// - Edges are vault operations or resting book orders, one direction each
/// - Several edges may connect the same ordered pair (one per order)
///
/// Every edge key appears at most once, so an edge id identifies one market
/// instance for the lifetime of the graph.
#[derive(Debug, Clone, Default)]
pub struct MarketGraph {
    /// All assets in the graph
    assets: Vec<Asset>,
    /// All directed edges in the graph
    edges: Vec<Edge>,
    /// Mapping from token address to asset ID for fast lookup
    asset_address_to_id: HashMap<Address, AssetId>,
    /// Mapping from ordered asset pairs to the edges between them
    pair_to_edges: HashMap<[AssetId; 2], Vec<EdgeId>>,
    /// Outbound edges per asset
    outbound: Vec<Vec<EdgeId>>,
    keys: HashSet<EdgeKey>,
}

impl MarketGraph {
    /// Create a new empty market graph
    pub fn new() -> Self {
        Self::default()
    }

    // ================================
    // Construction Methods
    // ================================

    /// Add an asset to the graph.
    ///
    /// If an asset with the same address already exists, returns the existing ID.
    pub fn add_asset(&mut self, asset: Asset) -> AssetId {
        if let Some(&existing_id) = self.asset_address_to_id.get(&asset.address()) {
            return existing_id;
        }

        let asset_id = self.assets.len();
        self.asset_address_to_id.insert(asset.address(), asset_id);
        self.assets.push(asset);
        self.outbound.push(Vec::new());
        asset_id
    }

    /// Add a directed edge.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Either endpoint doesn't exist in the graph
    /// - The edge connects an asset to itself
    /// - An edge with the same key already exists
    pub fn add_edge(&mut self, edge: Edge) -> GraphResult<EdgeId> {
        for asset_id in [edge.from, edge.to] {
            if asset_id >= self.assets.len() {
                return Err(GraphError::InvalidAssetIndex { index: asset_id });
            }
        }

        let key = edge.key();
        if edge.from == edge.to {
            return Err(GraphError::SelfLoop { key: key.to_string() });
        }
        if !self.keys.insert(key) {
            return Err(GraphError::DuplicateEdge { key: key.to_string() });
        }

        let edge_id = self.edges.len();
        self.pair_to_edges
            .entry([edge.from, edge.to])
            .or_default()
            .push(edge_id);
        self.outbound[edge.from].push(edge_id);
        self.edges.push(edge);

        Ok(edge_id)
    }

    // ================================
    // Query Methods
    // ================================

    pub fn asset_count(&self) -> usize {
        self.assets.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn assets(&self) -> &[Asset] {
        &self.assets
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn asset(&self, asset_id: AssetId) -> GraphResult<&Asset> {
        self.assets
            .get(asset_id)
            .ok_or(GraphError::InvalidAssetIndex { index: asset_id })
    }

    pub fn edge(&self, edge_id: EdgeId) -> GraphResult<&Edge> {
        self.edges
            .get(edge_id)
            .ok_or(GraphError::InvalidEdgeIndex { index: edge_id })
    }

    /// Find the asset ID for a token address.
    pub fn find_asset_id(&self, address: &Address) -> GraphResult<AssetId> {
        self.asset_address_to_id
            .get(address)
            .copied()
            .ok_or(GraphError::AssetNotFound { address: *address })
    }

    /// Edges leaving an asset.
    pub fn outbound_edges(&self, asset_id: AssetId) -> GraphResult<&[EdgeId]> {
        self.outbound
            .get(asset_id)
            .map(Vec::as_slice)
            .ok_or(GraphError::InvalidAssetIndex { index: asset_id })
    }

    /// Edges from `pair[0]` to `pair[1]`; empty if there are none.
    pub fn edges_between(&self, pair: [AssetId; 2]) -> &[EdgeId] {
        self.pair_to_edges
            .get(&pair)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn contains_key(&self, key: &EdgeKey) -> bool {
        self.keys.contains(key)
    }

    /// Assets reachable from `start` in at most `max_hops` edges, `start` included.
    pub fn reachable_within(&self, start: AssetId, max_hops: usize) -> HashSet<AssetId> {
        let mut reached = HashSet::new();
        if start >= self.assets.len() {
            return reached;
        }

        reached.insert(start);
        let mut frontier = VecDeque::from([(start, 0usize)]);

        while let Some((asset_id, hops)) = frontier.pop_front() {
            if hops == max_hops {
                continue;
            }
            for &edge_id in &self.outbound[asset_id] {
                let next = self.edges[edge_id].to;
                if reached.insert(next) {
                    frontier.push_back((next, hops + 1));
                }
            }
        }

        reached
    }
}

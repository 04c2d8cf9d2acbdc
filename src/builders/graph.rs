//! Builder pattern for MarketGraph

use crate::graph::{Asset, Edge, MarketGraph};
use crate::GraphResult;

/// Builder for creating MarketGraph instances with a fluent API
#[derive(Debug, Clone, Default)]
pub struct MarketGraphBuilder {
    assets: Vec<Asset>,
    edges: Vec<Edge>,
}

impl MarketGraphBuilder {
    /// Create a new MarketGraphBuilder
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an asset to the graph
    pub fn add_asset(mut self, asset: Asset) -> Self {
        self.assets.push(asset);
        self
    }

    /// Add multiple assets to the graph
    pub fn add_assets<I>(mut self, assets: I) -> Self
    where
        I: IntoIterator<Item = Asset>,
    {
        self.assets.extend(assets);
        self
    }

    /// Add a directed edge; endpoints index the assets in insertion order
    pub fn add_edge(mut self, edge: Edge) -> Self {
        self.edges.push(edge);
        self
    }

    /// Add multiple edges to the graph
    pub fn add_edges<I>(mut self, edges: I) -> Self
    where
        I: IntoIterator<Item = Edge>,
    {
        self.edges.extend(edges);
        self
    }

    /// Build the MarketGraph
    ///
    /// # Errors
    ///
    /// Returns an error if any edge references a non-existent asset, loops
    /// onto its own asset, or repeats another edge's key
    pub fn build(self) -> GraphResult<MarketGraph> {
        let mut graph = MarketGraph::new();

        // Add all assets first
        for asset in self.assets {
            graph.add_asset(asset);
        }

        // Then add all edges
        for edge in self.edges {
            graph.add_edge(edge)?;
        }

        Ok(graph)
    }
}

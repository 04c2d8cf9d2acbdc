//! Trading cycles over the market graph.
//!
//! This module provides cycle functionality for the keeper, organized into
//! focused sub-modules:
//!
//! - **`enumeration`**: bounded-depth discovery of every simple cycle at the base asset
//! - **`optimization`**: bottleneck sizing, engagement cap, profit filter and ranking
//! - **`execution`**: the sized [`Plan`] with every intermediate amount

pub mod enumeration;
pub mod execution;
pub mod optimization;

// Re-export types for convenience
pub use enumeration::PathEnumerator;
pub use execution::{Plan, PlanReport, PlannedStep, StepReport};
pub use optimization::{CycleEvaluator, Evaluation, RejectedCandidate, RejectionReason};

use crate::config::MIN_PATH_LENGTH;
use crate::errors::PathError;
use crate::graph::{AssetId, Edge, EdgeId, MarketGraph};
use crate::numeric::Rate;
use crate::PathResult;
use std::collections::HashSet;
use std::fmt::Write;
use std::iter::FromIterator;
use std::ops::Deref;

/// An ordered list of edge ids forming a cycle.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Path(pub Vec<EdgeId>);

impl Deref for Path {
    type Target = Vec<EdgeId>;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromIterator<EdgeId> for Path {
    fn from_iter<I: IntoIterator<Item = EdgeId>>(iter: I) -> Self {
        Path(iter.into_iter().collect())
    }
}

impl Path {
    /// Number of edges in the path.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Resolve the path's edges in order.
    pub fn edges<'g>(&self, graph: &'g MarketGraph) -> PathResult<Vec<&'g Edge>> {
        self.iter()
            .map(|&edge_id| {
                graph.edge(edge_id).map_err(|e| PathError::InvalidPath { reason: e.to_string() })
            })
            .collect()
    }

    /// Check that the path is a well-formed cycle at `base`.
    ///
    /// # Errors
    ///
    /// Returns an error if the path:
    /// - Is empty, shorter than two edges or longer than `max_depth`
    /// - References an unknown edge
    /// - Has consecutive edges that do not connect
    /// - Does not start and end at `base`
    /// - Uses the same vault operation or order twice
    pub fn validate(&self, graph: &MarketGraph, base: AssetId, max_depth: usize) -> PathResult<()> {
        if self.is_empty() {
            return Err(PathError::EmptyPath);
        }
        if self.len() < MIN_PATH_LENGTH {
            return Err(PathError::PathTooShort {
                min_length: MIN_PATH_LENGTH,
                actual_length: self.len(),
            });
        }
        if self.len() > max_depth {
            return Err(PathError::PathTooLong {
                max_length: max_depth,
                actual_length: self.len(),
            });
        }

        let edges = self.edges(graph)?;

        for (index, pair) in edges.windows(2).enumerate() {
            if pair[0].to != pair[1].from {
                return Err(PathError::Disconnected { index, next: index + 1 });
            }
        }

        let first = edges.first().ok_or(PathError::EmptyPath)?;
        let last = edges.last().ok_or(PathError::EmptyPath)?;
        if first.from != base || last.to != base {
            return Err(PathError::InvalidCycle);
        }

        let mut seen = HashSet::with_capacity(edges.len());
        for edge in &edges {
            if !seen.insert(edge.key()) {
                return Err(PathError::RepeatedEdge {
                    key: edge.key().to_string(),
                });
            }
        }

        Ok(())
    }

    /// Exact end-to-end rate of the path.
    pub fn rate(&self, graph: &MarketGraph) -> PathResult<Rate> {
        Ok(self
            .edges(graph)?
            .iter()
            .fold(Rate::unity(), |rate, edge| rate.then(&edge.rate())))
    }

    /// Human-readable route, e.g. `sai -[take #1]-> skr -[exit]-> gem`.
    pub fn describe(&self, graph: &MarketGraph) -> String {
        let mut route = String::new();

        for (index, &edge_id) in self.iter().enumerate() {
            let Ok(edge) = graph.edge(edge_id) else {
                let _ = write!(route, " -[?{edge_id}]->");
                continue;
            };
            if index == 0 {
                route.push_str(symbol(graph, edge.from));
            }
            let _ = write!(route, " -[{}]-> {}", edge.key(), symbol(graph, edge.to));
        }

        route
    }
}

fn symbol(graph: &MarketGraph, asset_id: AssetId) -> &str {
    graph.asset(asset_id).map(|asset| asset.symbol()).unwrap_or("?")
}

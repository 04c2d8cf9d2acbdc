//! Cycle discovery over a market snapshot.
//!
//! Depth-first traversal from the base asset. A branch is pruned when it would
//! revisit an intermediate asset, reuse a vault operation or order already on
//! the branch, or grow beyond `max_depth` edges. A cycle is emitted whenever an
//! edge leads back to the base asset after at least two edges.
//!
//! With at most four vault edges and a few hundred orders at depth three the
//! traversal is cheap, so it is redone from scratch for every snapshot.

use crate::config::MIN_PATH_LENGTH;
use crate::graph::{AssetId, EdgeId, EdgeKey, MarketGraph};
use crate::path::Path;
use std::collections::HashSet;

/// Enumerates every simple cycle at one base asset.
#[derive(Debug, Clone, Copy)]
pub struct PathEnumerator {
    /// Maximum allowed path length (number of edges)
    max_depth: usize,
}

struct Search<'g> {
    graph: &'g MarketGraph,
    base: AssetId,
    edges: Vec<EdgeId>,
    visited: HashSet<AssetId>,
    used_keys: HashSet<EdgeKey>,
    found: Vec<Path>,
}

impl PathEnumerator {
    pub fn new(max_depth: usize) -> Self {
        Self { max_depth }
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// All cycles of length `2..=max_depth` starting and ending at `base`.
    ///
    /// Emission order is unspecified.
    pub fn enumerate(&self, graph: &MarketGraph, base: AssetId) -> Vec<Path> {
        if base >= graph.asset_count() || self.max_depth < MIN_PATH_LENGTH {
            return Vec::new();
        }

        let mut search = Search {
            graph,
            base,
            edges: Vec::with_capacity(self.max_depth),
            visited: HashSet::from([base]),
            used_keys: HashSet::new(),
            found: Vec::new(),
        };
        search.extend_from(base, self.max_depth);

        tracing::debug!(
            base = base,
            max_depth = self.max_depth,
            edges = graph.edge_count(),
            cycles = search.found.len(),
            "Cycle enumeration completed"
        );

        search.found
    }
}

impl Search<'_> {
    fn extend_from(&mut self, asset_id: AssetId, max_depth: usize) {
        let graph = self.graph;
        let Ok(outbound) = graph.outbound_edges(asset_id) else {
            return;
        };

        for &edge_id in outbound {
            let Ok(edge) = graph.edge(edge_id) else {
                continue;
            };

            let key = edge.key();
            if self.used_keys.contains(&key) {
                continue;
            }

            if edge.to == self.base {
                if self.edges.len() + 1 >= MIN_PATH_LENGTH {
                    let mut cycle = self.edges.clone();
                    cycle.push(edge_id);
                    self.found.push(Path(cycle));
                }
                continue;
            }

            // Room left for this edge plus one closing edge
            if self.edges.len() + 2 > max_depth || self.visited.contains(&edge.to) {
                continue;
            }

            self.edges.push(edge_id);
            self.used_keys.insert(key);
            self.visited.insert(edge.to);

            self.extend_from(edge.to, max_depth);

            self.visited.remove(&edge.to);
            self.used_keys.remove(&key);
            self.edges.pop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builders::MarketGraphBuilder;
    use crate::graph::{Asset, Capacity, Edge, OrderId, VaultOp};
    use crate::numeric::Wad;
    use alloy::primitives::Address;

    const SAI: AssetId = 0;
    const SKR: AssetId = 1;
    const GEM: AssetId = 2;

    fn assets() -> [Asset; 3] {
        [
            Asset::new("sai", Address::repeat_byte(1)),
            Asset::new("skr", Address::repeat_byte(2)),
            Asset::new("gem", Address::repeat_byte(3)),
        ]
    }

    fn order(from: AssetId, to: AssetId, id: u64) -> Edge {
        Edge::book(from, to, OrderId::from_number(id), Wad::from_number(1), Wad::from_number(1))
    }

    fn three_step_book() -> MarketGraph {
        MarketGraphBuilder::new()
            .add_assets(assets())
            .add_edge(order(SAI, SKR, 1))
            .add_edge(order(SKR, GEM, 2))
            .add_edge(order(GEM, SAI, 3))
            .build()
            .unwrap()
    }

    #[test]
    fn test_depth_three_finds_three_cycle() {
        let graph = three_step_book();
        let cycles = PathEnumerator::new(3).enumerate(&graph, SAI);

        assert_eq!(cycles.len(), 1);
        assert_eq!(cycles[0], Path(vec![0, 1, 2]));
        assert!(cycles[0].validate(&graph, SAI, 3).is_ok());
    }

    #[test]
    fn test_depth_two_misses_three_cycle() {
        let graph = three_step_book();
        assert!(PathEnumerator::new(2).enumerate(&graph, SAI).is_empty());
    }

    #[test]
    fn test_two_cycle_with_book_and_vault_edge() {
        let graph = MarketGraphBuilder::new()
            .add_assets(assets())
            .add_edge(order(GEM, SKR, 7))
            .add_edge(Edge::fixed(SKR, GEM, VaultOp::Exit, Wad::one(), Capacity::Unbounded))
            .build()
            .unwrap();

        let cycles = PathEnumerator::new(3).enumerate(&graph, GEM);
        assert_eq!(cycles, vec![Path(vec![0, 1])]);
    }

    #[test]
    fn test_parallel_orders_give_distinct_cycles() {
        let graph = MarketGraphBuilder::new()
            .add_assets(assets())
            .add_edge(order(SAI, SKR, 1))
            .add_edge(order(SAI, SKR, 2))
            .add_edge(order(SKR, SAI, 3))
            .build()
            .unwrap();

        let cycles = PathEnumerator::new(3).enumerate(&graph, SAI);
        assert_eq!(cycles.len(), 2);
        for cycle in &cycles {
            assert!(cycle.validate(&graph, SAI, 3).is_ok());
        }
    }

    #[test]
    fn test_intermediate_assets_not_revisited() {
        // sai -> skr -> gem -> skr -> sai would revisit skr
        let graph = MarketGraphBuilder::new()
            .add_assets(assets())
            .add_edge(order(SAI, SKR, 1))
            .add_edge(order(SKR, GEM, 2))
            .add_edge(order(GEM, SKR, 3))
            .add_edge(order(SKR, SAI, 4))
            .build()
            .unwrap();

        let cycles = PathEnumerator::new(4).enumerate(&graph, SAI);
        assert_eq!(cycles, vec![Path(vec![0, 3])]);
    }

    #[test]
    fn test_every_cycle_starts_and_ends_at_base() {
        let graph = MarketGraphBuilder::new()
            .add_assets(assets())
            .add_edge(order(SAI, SKR, 1))
            .add_edge(order(SKR, SAI, 2))
            .add_edge(order(SKR, GEM, 3))
            .add_edge(order(GEM, SAI, 4))
            .add_edge(order(SAI, GEM, 5))
            .add_edge(order(GEM, SKR, 6))
            .add_edge(Edge::fixed(GEM, SKR, VaultOp::Join, Wad::one(), Capacity::Unbounded))
            .add_edge(Edge::fixed(SKR, GEM, VaultOp::Exit, Wad::one(), Capacity::Unbounded))
            .build()
            .unwrap();

        let cycles = PathEnumerator::new(3).enumerate(&graph, SAI);
        assert!(!cycles.is_empty());
        for cycle in &cycles {
            assert!(cycle.validate(&graph, SAI, 3).is_ok());
        }

        // Two 2-cycles, plus two ways each across skr->gem (order 3, exit)
        // and gem->skr (order 6, join)
        assert_eq!(cycles.len(), 6);
    }
}

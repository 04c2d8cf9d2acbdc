//! Plan derivation for sized cycles.
//!
//! A [`Plan`] is a cycle plus a chosen input: every intermediate amount is
//! derived left to right with round-down arithmetic, and each input is checked
//! against its edge's capacity. Plans are owned by the executor until
//! submission completes, so every step carries its own copy of the edge and
//! both assets.

use crate::errors::PathError;
use crate::graph::{Asset, Edge, EdgeId, MarketGraph};
use crate::numeric::Wad;
use crate::path::Path;
use crate::PathResult;
use alloy::primitives::Address;
use itertools::Itertools;
use serde::Serialize;

/// One sized step of a plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedStep {
    pub edge_id: EdgeId,
    pub edge: Edge,
    pub from: Asset,
    pub to: Asset,
    pub amount_in: Wad,
    pub amount_out: Wad,
}

/// A sized cycle: input `x₀`, outputs `x₁..xₖ`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    path: Path,
    steps: Vec<PlannedStep>,
    engagement: Wad,
    output: Wad,
}

impl Plan {
    /// Derive every intermediate amount for `engagement` of the base asset.
    ///
    /// # Errors
    ///
    /// This function will return an error if:
    /// - The path is empty or references an unknown edge or asset
    /// - Any step's input exceeds the edge's capacity
    pub fn derive(graph: &MarketGraph, path: &Path, engagement: Wad) -> PathResult<Self> {
        if path.is_empty() {
            return Err(PathError::EmptyPath);
        }

        let mut current = engagement.clone();
        let mut steps = Vec::with_capacity(path.len());

        for (index, edge) in path.edges(graph)?.into_iter().enumerate() {
            if let Some(limit) = edge.max_input() {
                if current > limit {
                    return Err(PathError::AmountExceedsCapacity {
                        step: index,
                        requested: current.to_string(),
                        max_available: limit.to_string(),
                    });
                }
            }

            let amount_out = edge.output(&current);
            let (from, to) = graph
                .asset(edge.from)
                .and_then(|from| Ok((from.clone(), graph.asset(edge.to)?.clone())))
                .map_err(|e| PathError::InvalidPath { reason: e.to_string() })?;

            tracing::trace!(
                step = index,
                edge = %edge.key(),
                amount_in = %current,
                amount_out = %amount_out,
                "Step sized"
            );

            steps.push(PlannedStep {
                edge_id: path[index],
                edge: edge.clone(),
                from,
                to,
                amount_in: current,
                amount_out: amount_out.clone(),
            });
            current = amount_out;
        }

        Ok(Self {
            path: path.clone(),
            steps,
            engagement,
            output: current,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn steps(&self) -> &[PlannedStep] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Base-asset input `x₀`.
    pub fn engagement(&self) -> &Wad {
        &self.engagement
    }

    /// Base-asset output `xₖ`.
    pub fn output(&self) -> &Wad {
        &self.output
    }

    pub fn is_profitable(&self) -> bool {
        self.output > self.engagement
    }

    /// `xₖ − x₀`, zero for an unprofitable plan.
    pub fn profit(&self) -> Wad {
        self.output.saturating_sub(&self.engagement)
    }

    /// Distinct tokens touched by the plan, in first-use order.
    pub fn tokens(&self) -> Vec<Address> {
        self.steps
            .iter()
            .flat_map(|step| [step.from.address(), step.to.address()])
            .unique()
            .collect()
    }

    /// `sai -> skr -> gem -> sai`
    pub fn route(&self) -> String {
        self.steps
            .iter()
            .map(|step| step.from.symbol())
            .chain(self.steps.last().map(|step| step.to.symbol()))
            .join(" -> ")
    }

    pub fn report(&self, block_number: u64) -> PlanReport {
        PlanReport {
            block_number,
            route: self.route(),
            engagement: self.engagement.clone(),
            output: self.output.clone(),
            profit: self.profit(),
            steps: self
                .steps
                .iter()
                .map(|step| StepReport {
                    market: step.edge.key().to_string(),
                    from: step.from.symbol().to_string(),
                    to: step.to.symbol().to_string(),
                    amount_in: step.amount_in.clone(),
                    amount_out: step.amount_out.clone(),
                })
                .collect(),
        }
    }
}

/// Machine-readable summary of a plan.
#[derive(Debug, Clone, Serialize)]
pub struct PlanReport {
    pub block_number: u64,
    pub route: String,
    pub engagement: Wad,
    pub output: Wad,
    pub profit: Wad,
    pub steps: Vec<StepReport>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StepReport {
    pub market: String,
    pub from: String,
    pub to: String,
    pub amount_in: Wad,
    pub amount_out: Wad,
}

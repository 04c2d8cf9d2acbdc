//! Cycle sizing and ranking.
//!
//! Every edge on a path is linear up to its capacity, so a cycle's profit grows
//! with its input and the best input is the largest one the path admits. The
//! evaluator therefore sizes each cycle at its bottleneck, caps it by the
//! engagement limit, and only then applies the profit threshold:
//!
//! ```text
//! x₀ = min(bottleneck, engagement_cap)
//! accept iff xₖ > x₀ and xₖ − x₀ ≥ min_profit
//! ```
//!
//! The bottleneck of edge `i` is its input limit divided by the exact rate of
//! the edges before it. Intermediate amounts are rounded down, never up, so an
//! input at the bottleneck stays within every capacity.

use crate::config::OperatingConfig;
use crate::graph::MarketGraph;
use crate::market::MarketSnapshot;
use crate::numeric::{Rate, Wad};
use crate::path::{Path, Plan};
use std::cmp::Ordering;
use std::fmt;

/// Why a candidate cycle was not selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectionReason {
    /// Some edge on the path admits no input, or the engagement cap is zero.
    NoCapacity,
    /// Output does not exceed input at the chosen size.
    Unprofitable,
    /// Profitable, but below `min_profit`.
    BelowMinProfit {
        /// The engagement cap, not the path's capacity, limited the size.
        capped_by_engagement: bool,
    },
}

impl RejectionReason {
    fn rank(&self) -> u8 {
        match self {
            RejectionReason::NoCapacity => 0,
            RejectionReason::Unprofitable => 1,
            RejectionReason::BelowMinProfit { .. } => 2,
        }
    }
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectionReason::NoCapacity => write!(f, "no capacity"),
            RejectionReason::Unprofitable => write!(f, "unprofitable"),
            RejectionReason::BelowMinProfit {
                capped_by_engagement: true,
            } => write!(f, "below min profit (capped by engagement)"),
            RejectionReason::BelowMinProfit {
                capped_by_engagement: false,
            } => write!(f, "below min profit"),
        }
    }
}

/// A sized cycle that did not pass the filters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedCandidate {
    pub path: Path,
    pub engagement: Wad,
    pub output: Wad,
    pub reason: RejectionReason,
}

impl RejectedCandidate {
    /// `output − engagement`, zero for a losing cycle.
    pub fn profit(&self) -> Wad {
        self.output.saturating_sub(&self.engagement)
    }

    fn outranks(&self, other: &RejectedCandidate) -> bool {
        self.reason
            .rank()
            .cmp(&other.reason.rank())
            .then_with(|| self.profit().cmp(&other.profit()))
            .then_with(|| other.path.len().cmp(&self.path.len()))
            == Ordering::Greater
    }
}

/// Outcome of evaluating every candidate cycle of one snapshot.
#[derive(Debug, Clone, Default)]
pub struct Evaluation {
    /// Highest-ranked plan that passed every filter.
    pub best: Option<Plan>,
    /// Closest miss, reported when nothing executes.
    pub best_rejected: Option<RejectedCandidate>,
    /// Number of cycles evaluated.
    pub candidates: usize,
    /// Number of cycles that passed every filter.
    pub accepted: usize,
}

/// Sizes cycles at their bottleneck and picks the most profitable one.
#[derive(Debug, Clone)]
pub struct CycleEvaluator {
    min_profit: Wad,
    engagement_cap: Wad,
}

impl CycleEvaluator {
    /// # Arguments
    ///
    /// * `min_profit` - Smallest acceptable profit in base-asset units
    /// * `max_engagement` - Configured cap on the base-asset input
    /// * `base_balance` - Base asset held by the keeper; also caps the input
    pub fn new(min_profit: Wad, max_engagement: Wad, base_balance: Wad) -> Self {
        let engagement_cap = if base_balance < max_engagement {
            base_balance
        } else {
            max_engagement
        };
        Self {
            min_profit,
            engagement_cap,
        }
    }

    pub fn from_snapshot(config: &OperatingConfig, snapshot: &MarketSnapshot) -> Self {
        Self::new(
            config.min_profit().clone(),
            config.max_engagement().clone(),
            snapshot.base_balance().clone(),
        )
    }

    pub fn engagement_cap(&self) -> &Wad {
        &self.engagement_cap
    }

    pub fn min_profit(&self) -> &Wad {
        &self.min_profit
    }

    /// Largest input every edge of the path admits, or `None` if nothing on
    /// the path is capped.
    pub fn bottleneck(&self, graph: &MarketGraph, path: &Path) -> Option<Wad> {
        let edges = path.edges(graph).ok()?;
        let mut prefix = Rate::unity();
        let mut bound: Option<Wad> = None;

        for edge in edges {
            if let Some(limit) = edge.max_input() {
                if let Some(candidate) = prefix.max_input_for(&limit) {
                    bound = Some(match bound {
                        Some(current) if current <= candidate => current,
                        _ => candidate,
                    });
                }
            }
            prefix = prefix.then(&edge.rate());
        }

        bound
    }

    /// Size one cycle and apply the profit filters.
    pub fn size(&self, graph: &MarketGraph, path: &Path) -> Result<Plan, RejectedCandidate> {
        let bottleneck = self.bottleneck(graph, path);
        let (engagement, capped_by_engagement) = match bottleneck {
            Some(limit) if limit < self.engagement_cap => (limit, false),
            Some(limit) => (self.engagement_cap.clone(), self.engagement_cap < limit),
            None => (self.engagement_cap.clone(), true),
        };

        let rejected = |engagement: Wad, output: Wad, reason: RejectionReason| RejectedCandidate {
            path: path.clone(),
            engagement,
            output,
            reason,
        };

        if engagement.is_zero() {
            return Err(rejected(Wad::zero(), Wad::zero(), RejectionReason::NoCapacity));
        }

        let plan = match Plan::derive(graph, path, engagement.clone()) {
            Ok(plan) => plan,
            Err(e) => {
                tracing::debug!(path = ?path.0, error = %e, "Cycle could not be sized");
                return Err(rejected(engagement, Wad::zero(), RejectionReason::NoCapacity));
            }
        };

        if !plan.is_profitable() {
            return Err(rejected(engagement, plan.output().clone(), RejectionReason::Unprofitable));
        }
        if plan.profit() < self.min_profit {
            return Err(rejected(
                engagement,
                plan.output().clone(),
                RejectionReason::BelowMinProfit { capped_by_engagement },
            ));
        }

        Ok(plan)
    }

    /// Evaluate every candidate and select the best plan.
    ///
    /// Ranking is by profit (higher first), then path length (shorter first),
    /// then engagement (lower first). Rejections are never errors.
    pub fn evaluate(&self, graph: &MarketGraph, paths: &[Path]) -> Evaluation {
        let mut evaluation = Evaluation {
            candidates: paths.len(),
            ..Evaluation::default()
        };

        for path in paths {
            match self.size(graph, path) {
                Ok(plan) => {
                    tracing::trace!(
                        route = %path.describe(graph),
                        engagement = %plan.engagement(),
                        profit = %plan.profit(),
                        "Candidate accepted"
                    );
                    evaluation.accepted += 1;
                    let replace = match &evaluation.best {
                        Some(best) => compare_plans(&plan, best) == Ordering::Less,
                        None => true,
                    };
                    if replace {
                        evaluation.best = Some(plan);
                    }
                }
                Err(candidate) => {
                    tracing::trace!(
                        route = %path.describe(graph),
                        reason = %candidate.reason,
                        "Candidate rejected"
                    );
                    let replace = match &evaluation.best_rejected {
                        Some(best) => candidate.outranks(best),
                        None => true,
                    };
                    if replace {
                        evaluation.best_rejected = Some(candidate);
                    }
                }
            }
        }

        evaluation
    }
}

/// `Less` means `a` ranks ahead of `b`.
fn compare_plans(a: &Plan, b: &Plan) -> Ordering {
    b.profit()
        .cmp(&a.profit())
        .then_with(|| a.len().cmp(&b.len()))
        .then_with(|| a.engagement().cmp(b.engagement()))
        .then_with(|| a.path().0.cmp(&b.path().0))
}

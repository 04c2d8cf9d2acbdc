//! The per-block arbitrage cycle.
//!
//! Each new block runs one pass of the state machine:
//!
//! ```text
//! Idle → Snapshot → Enumerate → Evaluate ─┬─→ Idle
//!                                         └─→ Submit → Settle → Idle
//! ```
//!
//! A cycle never overlaps another. Blocks that arrive while a cycle is in
//! flight are coalesced by the [`BlockSource`] and the loop resumes at the
//! newest one.

use crate::chain::{retry_with_backoff, BlockSource, MarketReader, TransactionSender};
use crate::config::{OperatingConfig, RetryPolicy};
use crate::errors::{KeeperError, Result};
use crate::executor::{ApprovalReport, Executor, SubmissionReport};
use crate::market::{MarketSnapshot, TokenSet};
use crate::path::{CycleEvaluator, PathEnumerator, PlanReport, RejectedCandidate, RejectionReason};
use alloy::primitives::Address;
use std::fmt;
use std::sync::Arc;

/// Phase of the current cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeeperState {
    Idle,
    Snapshot,
    Enumerate,
    Evaluate,
    Submit,
    Settle,
}

impl fmt::Display for KeeperState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            KeeperState::Idle => "idle",
            KeeperState::Snapshot => "snapshot",
            KeeperState::Enumerate => "enumerate",
            KeeperState::Evaluate => "evaluate",
            KeeperState::Submit => "submit",
            KeeperState::Settle => "settle",
        };
        f.write_str(name)
    }
}

/// Why a block was not evaluated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    StaleFeed,
    /// Chain reads kept failing after every retry.
    ChainUnavailable(String),
}

/// What one cycle did.
#[derive(Debug, Clone)]
pub enum CycleOutcome {
    /// The block was not evaluated.
    Skipped(SkipReason),
    /// No cycle passed the filters.
    NoOpportunity {
        candidates: usize,
        best_rejected: Option<RejectedCandidate>,
    },
    /// A plan was submitted and every transaction succeeded.
    Executed {
        plan: PlanReport,
        submission: SubmissionReport,
    },
    /// Submission failed; the cycle was abandoned.
    Failed { plan: PlanReport, reason: String },
}

impl CycleOutcome {
    pub fn is_executed(&self) -> bool {
        matches!(self, CycleOutcome::Executed { .. })
    }
}

/// Drives the per-block pipeline against the chain collaborators.
pub struct Keeper<R: ?Sized, S: ?Sized> {
    reader: Arc<R>,
    executor: Executor<S>,
    config: OperatingConfig,
    tokens: TokenSet,
    account: Address,
    retry: RetryPolicy,
    enumerator: PathEnumerator,
    state: KeeperState,
    last_block: Option<u64>,
}

impl<R, S> Keeper<R, S>
where
    R: MarketReader + ?Sized,
    S: TransactionSender + ?Sized,
{
    pub fn new(
        reader: Arc<R>,
        executor: Executor<S>,
        config: OperatingConfig,
        tokens: TokenSet,
        account: Address,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            reader,
            executor,
            enumerator: PathEnumerator::new(config.max_depth()),
            config,
            tokens,
            account,
            retry,
            state: KeeperState::Idle,
            last_block: None,
        }
    }

    pub fn state(&self) -> KeeperState {
        self.state
    }

    pub fn config(&self) -> &OperatingConfig {
        &self.config
    }

    pub fn executor(&self) -> &Executor<S> {
        &self.executor
    }

    /// Stage approvals before the first cycle.
    pub async fn initialize(&self) -> Result<ApprovalReport> {
        tracing::info!(
            base_asset = %self.config.base_asset(),
            min_profit = %self.config.min_profit(),
            max_engagement = %self.config.max_engagement(),
            max_depth = self.config.max_depth(),
            mode = %self.executor.mode(),
            "Keeper initialized"
        );
        self.executor.stage_approvals().await
    }

    /// Follow `blocks` until it fails permanently.
    ///
    /// # Errors
    ///
    /// Returns the first error that is neither transient nor confined to a
    /// single cycle: a failing block source, an unknown base asset or a
    /// malformed snapshot.
    pub async fn run<B: BlockSource + ?Sized>(&mut self, blocks: &mut B) -> Result<()> {
        let mut failures = 0;
        loop {
            let tick = match blocks.next_block().await {
                Ok(tick) => {
                    failures = 0;
                    tick
                }
                Err(e) if e.is_transient() => {
                    let delay = self.retry.delay_for(failures.min(6));
                    tracing::warn!(error = %e, delay_ms = delay.as_millis() as u64, "Block poll failed");
                    tokio::time::sleep(delay).await;
                    failures += 1;
                    continue;
                }
                Err(e) => return Err(e),
            };

            if self.last_block.is_some_and(|last| tick.number <= last) {
                continue;
            }
            self.process_block(tick.number).await?;
        }
    }

    /// Run one full cycle for `block_number`.
    ///
    /// Per-cycle failures (stale feed, exhausted retries, a failed submission)
    /// are reported in the outcome and leave the keeper ready for the next
    /// block.
    pub async fn process_block(&mut self, block_number: u64) -> Result<CycleOutcome> {
        self.last_block = Some(block_number);
        let outcome = self.cycle(block_number).await;
        self.state = KeeperState::Idle;
        outcome
    }

    async fn cycle(&mut self, block_number: u64) -> Result<CycleOutcome> {
        self.state = KeeperState::Snapshot;
        let snapshot = match self.snapshot(block_number).await? {
            Ok(snapshot) => snapshot,
            Err(reason) => return Ok(CycleOutcome::Skipped(reason)),
        };

        self.state = KeeperState::Enumerate;
        let paths = self.enumerator.enumerate(snapshot.graph(), snapshot.base());

        self.state = KeeperState::Evaluate;
        let evaluation = CycleEvaluator::from_snapshot(&self.config, &snapshot).evaluate(snapshot.graph(), &paths);

        let Some(plan) = evaluation.best else {
            log_rejection(block_number, &snapshot, evaluation.candidates, evaluation.best_rejected.as_ref());
            return Ok(CycleOutcome::NoOpportunity {
                candidates: evaluation.candidates,
                best_rejected: evaluation.best_rejected,
            });
        };

        let report = plan.report(block_number);
        tracing::info!(
            block_number = block_number,
            route = %plan.path().describe(snapshot.graph()),
            engagement = %plan.engagement(),
            output = %plan.output(),
            profit = %plan.profit(),
            candidates = evaluation.candidates,
            mode = %self.executor.mode(),
            "Submitting arbitrage plan"
        );

        self.state = KeeperState::Submit;
        let submission = self.executor.submit(&plan).await;

        self.state = KeeperState::Settle;
        match submission {
            Ok(submission) => {
                tracing::info!(
                    block_number = block_number,
                    transactions = submission.transaction_count(),
                    tx_hashes = ?submission.receipts.iter().map(|receipt| receipt.tx_hash).collect::<Vec<_>>(),
                    gas_used = submission.gas_used(),
                    profit = %report.profit,
                    "Arbitrage executed"
                );
                match serde_json::to_string(&report) {
                    Ok(json) => tracing::info!(plan = %json, "Executed plan"),
                    Err(e) => tracing::warn!(error = %e, "Failed to serialize plan report"),
                }
                Ok(CycleOutcome::Executed {
                    plan: report,
                    submission,
                })
            }
            Err(e) => {
                tracing::error!(
                    block_number = block_number,
                    route = %report.route,
                    error = %e,
                    "Arbitrage submission failed, abandoning cycle"
                );
                Ok(CycleOutcome::Failed {
                    plan: report,
                    reason: e.to_string(),
                })
            }
        }
    }

    /// Read the chain and build the snapshot.
    ///
    /// The outer error is fatal; the inner one skips this block.
    async fn snapshot(&self, block_number: u64) -> Result<std::result::Result<MarketSnapshot, SkipReason>> {
        let reader = self.reader.as_ref();
        let account = self.account;
        let base = self.config.base_asset();

        let state = match retry_with_backoff(&self.retry, "snapshot", move || {
            reader.read_market(block_number, account, base)
        })
        .await
        {
            Ok(state) => state,
            Err(e) => {
                tracing::warn!(block_number = block_number, error = %e, "Market read failed, skipping block");
                return Ok(Err(SkipReason::ChainUnavailable(e.to_string())));
            }
        };

        match MarketSnapshot::from_state(&state, &self.config, &self.tokens) {
            Ok(snapshot) => Ok(Ok(snapshot)),
            Err(e) => {
                let e = KeeperError::from(e);
                if e.is_stale_feed() {
                    tracing::info!(block_number = block_number, "Price feed stale, skipping block");
                    Ok(Err(SkipReason::StaleFeed))
                } else {
                    Err(e)
                }
            }
        }
    }
}

fn log_rejection(
    block_number: u64,
    snapshot: &MarketSnapshot,
    candidates: usize,
    best_rejected: Option<&RejectedCandidate>,
) {
    match best_rejected {
        Some(candidate) if matches!(candidate.reason, RejectionReason::BelowMinProfit { .. }) => {
            tracing::info!(
                block_number = block_number,
                route = %candidate.path.describe(snapshot.graph()),
                engagement = %candidate.engagement,
                profit = %candidate.profit(),
                reason = %candidate.reason,
                "Best candidate rejected"
            );
        }
        Some(candidate) => {
            tracing::debug!(
                block_number = block_number,
                candidates = candidates,
                reason = %candidate.reason,
                "No profitable cycle"
            );
        }
        None => {
            tracing::debug!(block_number = block_number, "No cycles at base asset");
        }
    }
}

//! Plan submission.
//!
//! This module turns the selected [`Plan`] into transactions:
//!
//! - **`encoding`**: one [`ContractCall`] per plan step, plus the batch wrapper
//! - **`approvals`**: allowance staging, idempotent at [`MAX_ALLOWANCE`]
//!
//! # Submission modes
//!
//! - **Direct**: one transaction per step, in path order, each receipt awaited
//!   before the next send. The first failure aborts the rest; earlier steps
//!   stay executed and the next snapshot sees the leftover inventory.
//! - **Batched**: one `execute(tokens, invocations)` on the Batch Executor.
//!   A failing invocation reverts the whole batch.
//!
//! Allowance reads and receipt waits are retried under the executor's
//! [`RetryPolicy`]; a broadcast is never repeated.

pub mod approvals;
pub mod encoding;

pub use approvals::{ApprovalPair, ApprovalReport, ApprovalStager, MAX_ALLOWANCE};
pub use encoding::{CallAction, ContractCall};

use crate::chain::{retry_with_backoff, send_and_confirm, TransactionSender, TxReceipt};
use crate::config::{ContractAddresses, RetryPolicy};
use crate::errors::{ExecutionError, Result};
use crate::market::TokenSet;
use crate::path::Plan;
use alloy::primitives::Address;
use std::fmt;
use std::sync::Arc;

/// How a plan reaches the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionMode {
    Direct,
    Batched { executor: Address },
}

impl SubmissionMode {
    /// Batched when requested and an executor address is configured.
    pub fn select(addresses: &ContractAddresses, use_batch_executor: bool) -> Self {
        match addresses.batch_executor {
            Some(executor) if use_batch_executor => SubmissionMode::Batched { executor },
            _ => SubmissionMode::Direct,
        }
    }

    pub fn is_batched(&self) -> bool {
        matches!(self, SubmissionMode::Batched { .. })
    }
}

impl fmt::Display for SubmissionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubmissionMode::Direct => write!(f, "direct"),
            SubmissionMode::Batched { .. } => write!(f, "batched"),
        }
    }
}

/// Receipts of one successful submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionReport {
    pub mode: SubmissionMode,
    pub receipts: Vec<TxReceipt>,
    /// Plan steps executed on chain
    pub completed_steps: usize,
}

impl SubmissionReport {
    pub fn transaction_count(&self) -> usize {
        self.receipts.len()
    }

    pub fn gas_used(&self) -> u64 {
        self.receipts.iter().map(|receipt| receipt.gas_used).sum()
    }
}

/// Submits plans through a [`TransactionSender`].
pub struct Executor<S: ?Sized> {
    sender: Arc<S>,
    tokens: TokenSet,
    addresses: ContractAddresses,
    mode: SubmissionMode,
    retry: RetryPolicy,
}

impl<S: TransactionSender + ?Sized> Executor<S> {
    pub fn new(sender: Arc<S>, tokens: TokenSet, addresses: ContractAddresses, mode: SubmissionMode) -> Self {
        Self {
            sender,
            tokens,
            addresses,
            mode,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn mode(&self) -> SubmissionMode {
        self.mode
    }

    pub fn retry(&self) -> RetryPolicy {
        self.retry
    }

    /// Account the plans trade from.
    pub fn account(&self) -> Address {
        self.sender.account()
    }

    pub fn approvals(&self) -> ApprovalStager<'_, S> {
        ApprovalStager::new(self.sender.as_ref(), self.tokens, self.addresses, self.mode).with_retry(self.retry)
    }

    /// Stage every approval the current mode needs.
    pub async fn stage_approvals(&self) -> Result<ApprovalReport> {
        self.approvals().stage().await
    }

    /// The calls a plan compiles to, in path order.
    pub fn calls_for(&self, plan: &Plan) -> Vec<ContractCall> {
        plan.steps()
            .iter()
            .map(|step| ContractCall::for_step(step, &self.addresses))
            .collect()
    }

    /// Submit a plan in the configured mode.
    ///
    /// Keeper-owned allowances are re-checked first; in batched mode any
    /// missing Batch Executor allowance is prepended to the batch.
    ///
    /// # Errors
    ///
    /// This function will return an error if:
    /// - The plan is empty or an amount cannot be encoded
    /// - A direct-mode step reverts, cannot be sent, or its receipt wait
    ///   exhausts the retry policy (later steps are not sent)
    /// - The batch reverts
    pub async fn submit(&self, plan: &Plan) -> Result<SubmissionReport> {
        if plan.is_empty() {
            return Err(ExecutionError::EmptyPlan.into());
        }

        let calls = self.calls_for(plan);
        // Encode everything before the first send so a bad amount sends nothing
        for call in &calls {
            call.calldata()?;
        }

        let approvals = self.approvals();
        retry_with_backoff(&self.retry, "submit", || approvals.stage_keeper()).await?;

        match self.mode {
            SubmissionMode::Direct => self.submit_direct(calls).await,
            SubmissionMode::Batched { executor } => {
                let mut invocations =
                    retry_with_backoff(&self.retry, "submit", || approvals.missing_downstream()).await?;
                if !invocations.is_empty() {
                    tracing::info!(approvals = invocations.len(), "Prepending executor approvals to batch");
                }
                invocations.extend(calls);
                self.submit_batched(executor, plan.tokens(), invocations, plan.len())
                    .await
            }
        }
    }

    async fn submit_direct(&self, calls: Vec<ContractCall>) -> Result<SubmissionReport> {
        let mut receipts = Vec::with_capacity(calls.len());

        for (step, call) in calls.iter().enumerate() {
            let receipt = match send_and_confirm(self.sender.as_ref(), &self.retry, call).await {
                Ok(receipt) => receipt,
                Err(e) => {
                    tracing::warn!(step = step, call = %call, error = %e, "Step failed, aborting plan");
                    return Err(ExecutionError::StepFailed {
                        step,
                        completed: step,
                        reason: e.to_string(),
                    }
                    .into());
                }
            };

            if !receipt.success {
                tracing::warn!(
                    step = step,
                    call = %call,
                    tx_hash = %receipt.tx_hash,
                    "Step reverted, aborting plan"
                );
                return Err(ExecutionError::Reverted {
                    step,
                    tx_hash: receipt.tx_hash,
                }
                .into());
            }

            tracing::debug!(
                step = step,
                call = %call,
                tx_hash = %receipt.tx_hash,
                gas_used = receipt.gas_used,
                "Step confirmed"
            );
            receipts.push(receipt);
        }

        Ok(SubmissionReport {
            mode: SubmissionMode::Direct,
            completed_steps: receipts.len(),
            receipts,
        })
    }

    async fn submit_batched(
        &self,
        executor: Address,
        tokens: Vec<Address>,
        invocations: Vec<ContractCall>,
        steps: usize,
    ) -> Result<SubmissionReport> {
        let batch = ContractCall::execute(executor, tokens, invocations);
        let receipt = send_and_confirm(self.sender.as_ref(), &self.retry, &batch).await?;

        if !receipt.success {
            tracing::warn!(tx_hash = %receipt.tx_hash, "Batch reverted");
            return Err(ExecutionError::BatchReverted {
                tx_hash: receipt.tx_hash,
            }
            .into());
        }

        tracing::debug!(
            tx_hash = %receipt.tx_hash,
            gas_used = receipt.gas_used,
            "Batch confirmed"
        );

        Ok(SubmissionReport {
            mode: self.mode,
            receipts: vec![receipt],
            completed_steps: steps,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::mock::MockChain;
    use crate::errors::KeeperError;
    use crate::graph::OrderId;
    use crate::market::MarketSnapshot;
    use crate::numeric::Wad;
    use crate::path::{CycleEvaluator, PathEnumerator};

    async fn plan_for(chain: &MockChain, base: &str) -> (MarketSnapshot, Plan) {
        let snapshot = chain.snapshot(base).await;
        let config = chain.operating_config(base);
        let paths = PathEnumerator::new(3).enumerate(snapshot.graph(), snapshot.base());
        let plan = CycleEvaluator::from_snapshot(&config, &snapshot)
            .evaluate(snapshot.graph(), &paths)
            .best
            .unwrap();
        (snapshot, plan)
    }

    fn executor(chain: &Arc<MockChain>, mode: SubmissionMode) -> Executor<MockChain> {
        Executor::new(Arc::clone(chain), chain.tokens(), chain.addresses(), mode)
            .with_retry(RetryPolicy::new(3, std::time::Duration::from_millis(1)))
    }

    #[test]
    fn test_mode_selection() {
        let mut addresses = MockChain::scenario_base().addresses();
        assert_eq!(SubmissionMode::select(&addresses, true), SubmissionMode::Direct);

        addresses.batch_executor = Some(Address::repeat_byte(0xee));
        assert!(SubmissionMode::select(&addresses, true).is_batched());
        assert_eq!(SubmissionMode::select(&addresses, false), SubmissionMode::Direct);
    }

    #[tokio::test]
    async fn test_direct_mode_sends_one_transaction_per_step() {
        let chain = Arc::new(MockChain::scenario_b());
        let executor = executor(&chain, SubmissionMode::Direct);
        executor.stage_approvals().await.unwrap();
        let before = chain.transaction_count().await;

        let (_, plan) = plan_for(&chain, "sai").await;
        let report = executor.submit(&plan).await.unwrap();

        assert_eq!(report.transaction_count(), 3);
        assert_eq!(report.completed_steps, 3);
        assert_eq!(chain.transaction_count().await - before, 3);
    }

    #[tokio::test]
    async fn test_direct_mode_aborts_after_revert() {
        let chain = Arc::new(MockChain::scenario_b());
        let executor = executor(&chain, SubmissionMode::Direct);
        executor.stage_approvals().await.unwrap();
        chain.revert_order(OrderId::from_number(2)).await;

        let (_, plan) = plan_for(&chain, "sai").await;
        let before = chain.transaction_count().await;
        let error = executor.submit(&plan).await.unwrap_err();

        assert!(matches!(
            error,
            KeeperError::Execution(ExecutionError::Reverted { step: 1, .. })
        ));
        // First take mined, second reverted, third never sent
        assert_eq!(chain.transaction_count().await - before, 2);
        assert!(chain.order(OrderId::from_number(1)).await.is_none());
        assert!(chain.order(OrderId::from_number(3)).await.is_some());
    }

    #[tokio::test]
    async fn test_batched_mode_sends_one_transaction() {
        let chain = Arc::new(MockChain::scenario_b());
        let executor = executor(&chain, SubmissionMode::Batched {
            executor: chain.batch_executor(),
        });
        executor.stage_approvals().await.unwrap();

        let (_, plan) = plan_for(&chain, "sai").await;
        let before = chain.transaction_count().await;
        let report = executor.submit(&plan).await.unwrap();

        assert_eq!(report.transaction_count(), 1);
        assert_eq!(report.completed_steps, 3);
        assert_eq!(chain.transaction_count().await - before, 1);
        assert_eq!(
            chain.balance(chain.tokens().sai, chain.account()).await,
            Wad::from_number(1_015)
        );
    }

    #[tokio::test]
    async fn test_batched_revert_leaves_state_untouched() {
        let chain = Arc::new(MockChain::scenario_b());
        let executor = executor(&chain, SubmissionMode::Batched {
            executor: chain.batch_executor(),
        });
        executor.stage_approvals().await.unwrap();
        chain.revert_order(OrderId::from_number(3)).await;

        let (_, plan) = plan_for(&chain, "sai").await;
        let error = executor.submit(&plan).await.unwrap_err();

        assert!(matches!(error, KeeperError::Execution(ExecutionError::BatchReverted { .. })));
        assert!(chain.order(OrderId::from_number(1)).await.is_some());
        assert_eq!(
            chain.balance(chain.tokens().sai, chain.account()).await,
            Wad::from_number(1_000)
        );
    }

    #[tokio::test]
    async fn test_batch_prepends_missing_executor_approvals() {
        let chain = Arc::new(MockChain::scenario_b());
        let executor = executor(&chain, SubmissionMode::Batched {
            executor: chain.batch_executor(),
        });
        // Keeper approves the executor, but the executor approves nothing yet
        executor.approvals().stage_keeper().await.unwrap();

        let (_, plan) = plan_for(&chain, "sai").await;
        let before = chain.transaction_count().await;
        executor.submit(&plan).await.unwrap();

        assert_eq!(chain.transaction_count().await - before, 1);
        assert!(executor.approvals().missing_downstream().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_batch_receipt_wait_is_retried() {
        let chain = Arc::new(MockChain::scenario_b());
        let executor = executor(&chain, SubmissionMode::Batched {
            executor: chain.batch_executor(),
        });
        executor.stage_approvals().await.unwrap();

        let (_, plan) = plan_for(&chain, "sai").await;
        let before = chain.transaction_count().await;
        chain.fail_receipts(2).await;
        let report = executor.submit(&plan).await.unwrap();

        assert_eq!(report.transaction_count(), 1);
        assert_eq!(chain.transaction_count().await - before, 1);
    }
}

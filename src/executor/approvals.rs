//! Allowance staging.
//!
//! Every `(token, spender)` pair an edge may pull from is approved for
//! [`MAX_ALLOWANCE`] ahead of time, so submission never waits on an approval:
//!
//! | Edge  | Pulls            | Spender |
//! |-------|------------------|---------|
//! | join  | gem              | Tub     |
//! | exit  | skr              | Tub     |
//! | boom  | skr              | Tap     |
//! | bust  | sai              | Tap     |
//! | order | the order's buy token | OASIS |
//!
//! In batched mode the keeper only approves the Batch Executor for each token;
//! the table above then applies to the Batch Executor as owner, and its
//! approvals are issued as `approve` invocations through `execute`.

use crate::chain::{send_and_confirm, TransactionSender};
use crate::config::{ContractAddresses, RetryPolicy};
use crate::errors::{ExecutionError, Result};
use crate::executor::{ContractCall, SubmissionMode};
use crate::market::TokenSet;
use alloy::primitives::{Address, U256};

/// Allowance every staged pair is raised to.
pub const MAX_ALLOWANCE: U256 = U256::MAX;

/// A token and the contract allowed to pull it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ApprovalPair {
    pub token: Address,
    pub spender: Address,
}

/// Pairs written or found already at the maximum during one staging pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApprovalReport {
    pub written: Vec<ApprovalPair>,
    pub already_set: Vec<ApprovalPair>,
}

impl ApprovalReport {
    pub fn is_noop(&self) -> bool {
        self.written.is_empty()
    }
}

/// The pairs needed to trade every edge directly.
pub fn protocol_pairs(tokens: &TokenSet, addresses: &ContractAddresses) -> Vec<ApprovalPair> {
    let pair = |token, spender| ApprovalPair { token, spender };
    vec![
        pair(tokens.gem, addresses.tub),
        pair(tokens.skr, addresses.tub),
        pair(tokens.skr, addresses.tap),
        pair(tokens.sai, addresses.tap),
        pair(tokens.gem, addresses.otc),
        pair(tokens.skr, addresses.otc),
        pair(tokens.sai, addresses.otc),
    ]
}

/// Checks and raises allowances for one submission mode.
pub struct ApprovalStager<'a, S: ?Sized> {
    sender: &'a S,
    tokens: TokenSet,
    addresses: ContractAddresses,
    mode: SubmissionMode,
    retry: RetryPolicy,
}

impl<'a, S: TransactionSender + ?Sized> ApprovalStager<'a, S> {
    pub fn new(sender: &'a S, tokens: TokenSet, addresses: ContractAddresses, mode: SubmissionMode) -> Self {
        Self {
            sender,
            tokens,
            addresses,
            mode,
            retry: RetryPolicy::default(),
        }
    }

    /// Policy for receipt waits of approval transactions.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Pairs owned by the keeper's account.
    pub fn keeper_pairs(&self) -> Vec<ApprovalPair> {
        match self.mode {
            SubmissionMode::Direct => protocol_pairs(&self.tokens, &self.addresses),
            SubmissionMode::Batched { executor } => self
                .tokens
                .all()
                .into_iter()
                .map(|(_, token)| ApprovalPair {
                    token,
                    spender: executor,
                })
                .collect(),
        }
    }

    /// Raise every allowance the current mode needs.
    ///
    /// Keeper-owned pairs are approved one transaction each. In batched mode
    /// the Batch Executor's missing approvals follow as a single `execute`
    /// call. Nothing is sent when every allowance is already at the maximum.
    ///
    /// # Errors
    ///
    /// Returns `ExecutionError::ApprovalFailed` if an approval reverts.
    pub async fn stage(&self) -> Result<ApprovalReport> {
        let mut report = self.stage_keeper().await?;

        if let SubmissionMode::Batched { executor } = self.mode {
            let (missing, present) = self.partition(executor, protocol_pairs(&self.tokens, &self.addresses)).await?;
            report.already_set.extend(present);

            if !missing.is_empty() {
                let approvals = missing
                    .iter()
                    .map(|pair| ContractCall::approve(pair.token, pair.spender, MAX_ALLOWANCE))
                    .collect();
                let batch = ContractCall::execute(executor, Vec::new(), approvals);
                let receipt = send_and_confirm(self.sender, &self.retry, &batch).await?;
                if !receipt.success {
                    return Err(ExecutionError::BatchReverted {
                        tx_hash: receipt.tx_hash,
                    }
                    .into());
                }
                report.written.extend(missing);
            }
        }

        tracing::info!(
            written = report.written.len(),
            already_set = report.already_set.len(),
            mode = %self.mode,
            "Approvals staged"
        );

        Ok(report)
    }

    /// Raise keeper-owned allowances only.
    pub async fn stage_keeper(&self) -> Result<ApprovalReport> {
        let owner = self.sender.account();
        let (missing, present) = self.partition(owner, self.keeper_pairs()).await?;
        let mut report = ApprovalReport {
            written: Vec::with_capacity(missing.len()),
            already_set: present,
        };

        for pair in missing {
            let approve = ContractCall::approve(pair.token, pair.spender, MAX_ALLOWANCE);
            let receipt = send_and_confirm(self.sender, &self.retry, &approve).await?;
            if !receipt.success {
                return Err(ExecutionError::ApprovalFailed {
                    token: pair.token,
                    spender: pair.spender,
                    reason: format!("transaction {} reverted", receipt.tx_hash),
                }
                .into());
            }
            tracing::debug!(token = %pair.token, spender = %pair.spender, "Allowance raised");
            report.written.push(pair);
        }

        Ok(report)
    }

    /// Batch Executor approvals missing right now, as invocations to prepend
    /// to the next batch. Empty in direct mode.
    pub async fn missing_downstream(&self) -> Result<Vec<ContractCall>> {
        let SubmissionMode::Batched { executor } = self.mode else {
            return Ok(Vec::new());
        };

        let (missing, _) = self.partition(executor, protocol_pairs(&self.tokens, &self.addresses)).await?;
        Ok(missing
            .into_iter()
            .map(|pair| ContractCall::approve(pair.token, pair.spender, MAX_ALLOWANCE))
            .collect())
    }

    async fn partition(
        &self,
        owner: Address,
        pairs: Vec<ApprovalPair>,
    ) -> Result<(Vec<ApprovalPair>, Vec<ApprovalPair>)> {
        let mut missing = Vec::new();
        let mut present = Vec::new();

        for pair in pairs {
            let allowance = self.sender.allowance(pair.token, owner, pair.spender).await?;
            if allowance == MAX_ALLOWANCE {
                present.push(pair);
            } else {
                missing.push(pair);
            }
        }

        Ok((missing, present))
    }
}

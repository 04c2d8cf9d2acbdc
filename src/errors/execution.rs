//! Approval staging and submission errors.

use alloy::primitives::{Address, B256};

/// Errors that can occur while staging approvals or submitting a plan
#[derive(Debug, thiserror::Error)]
pub enum ExecutionError {
    #[error("Transaction {tx_hash} for step {step} reverted")]
    Reverted { step: usize, tx_hash: B256 },

    #[error("Step {step} failed after {completed} completed steps: {reason}")]
    StepFailed {
        step: usize,
        completed: usize,
        reason: String,
    },

    #[error("Approval of {token} for {spender} failed: {reason}")]
    ApprovalFailed {
        token: Address,
        spender: Address,
        reason: String,
    },

    #[error("Batch transaction {tx_hash} reverted")]
    BatchReverted { tx_hash: B256 },

    #[error("Plan has no steps to submit")]
    EmptyPlan,

    #[error("Amount {amount} cannot be encoded: {reason}")]
    AmountEncoding { amount: String, reason: String },
}

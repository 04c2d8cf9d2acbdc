//! Retry of transient chain failures.

use crate::chain::{TransactionSender, TxReceipt};
use crate::config::RetryPolicy;
use crate::errors::Result;
use crate::executor::ContractCall;
use std::future::Future;

/// Run `operation` until it succeeds, fails permanently, or the policy's
/// attempts are exhausted.
///
/// Only errors for which [`KeeperError::is_transient`] holds are retried; the
/// delay doubles after every failed attempt.
///
/// [`KeeperError::is_transient`]: crate::errors::KeeperError::is_transient
pub async fn retry_with_backoff<T, F, Fut>(policy: &RetryPolicy, phase: &str, mut operation: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 0;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_transient() && attempt + 1 < policy.attempts => {
                let delay = policy.delay_for(attempt);
                tracing::warn!(
                    phase = phase,
                    attempt = attempt + 1,
                    max_attempts = policy.attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "Transient chain error, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Broadcast `call` once and wait for its receipt.
///
/// Only the receipt wait is retried, so a timed-out wait never sends the
/// transaction a second time.
pub async fn send_and_confirm<S>(sender: &S, policy: &RetryPolicy, call: &ContractCall) -> Result<TxReceipt>
where
    S: TransactionSender + ?Sized,
{
    let tx_hash = sender.broadcast(call).await?;
    retry_with_backoff(policy, "submit", move || sender.receipt(tx_hash)).await
}

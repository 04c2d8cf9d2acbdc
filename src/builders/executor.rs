//! Builder pattern for Executor

use crate::chain::TransactionSender;
use crate::config::{ContractAddresses, RetryPolicy};
use crate::errors::{ConfigError, Result};
use crate::executor::{Executor, SubmissionMode};
use crate::market::TokenSet;
use std::sync::Arc;

/// Builder for creating Executor instances with a fluent API
pub struct ExecutorBuilder<S: ?Sized> {
    sender: Option<Arc<S>>,
    tokens: Option<TokenSet>,
    addresses: Option<ContractAddresses>,
    use_batch_executor: bool,
    retry: RetryPolicy,
}

impl<S: TransactionSender + ?Sized> ExecutorBuilder<S> {
    /// Create a new ExecutorBuilder
    pub fn new() -> Self {
        Self {
            sender: None,
            tokens: None,
            addresses: None,
            use_batch_executor: true,
            retry: RetryPolicy::default(),
        }
    }

    /// Set the transaction sender
    pub fn with_sender(mut self, sender: Arc<S>) -> Self {
        self.sender = Some(sender);
        self
    }

    /// Set the vault token addresses
    pub fn with_tokens(mut self, tokens: TokenSet) -> Self {
        self.tokens = Some(tokens);
        self
    }

    /// Set the protocol contract addresses
    pub fn with_addresses(mut self, addresses: ContractAddresses) -> Self {
        self.addresses = Some(addresses);
        self
    }

    /// Submit through the Batch Executor when its address is configured
    pub fn use_batch_executor(mut self, enabled: bool) -> Self {
        self.use_batch_executor = enabled;
        self
    }

    /// Set the retry policy for allowance reads and receipt waits
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Build the Executor
    ///
    /// # Errors
    ///
    /// Returns an error if the sender, tokens or addresses were not provided
    pub fn build(self) -> Result<Executor<S>> {
        let sender = self.sender.ok_or_else(|| missing("sender"))?;
        let tokens = self.tokens.ok_or_else(|| missing("tokens"))?;
        let addresses = self.addresses.ok_or_else(|| missing("addresses"))?;

        let mode = SubmissionMode::select(&addresses, self.use_batch_executor);
        if self.use_batch_executor && !mode.is_batched() {
            tracing::info!("No batch executor configured, submitting directly");
        }

        Ok(Executor::new(sender, tokens, addresses, mode).with_retry(self.retry))
    }
}

impl<S: TransactionSender + ?Sized> Default for ExecutorBuilder<S> {
    fn default() -> Self {
        Self::new()
    }
}

fn missing(option: &str) -> ConfigError {
    ConfigError::MissingOption {
        option: option.to_string(),
    }
}

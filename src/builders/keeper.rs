//! Builder pattern for Keeper

use crate::chain::{MarketReader, TransactionSender};
use crate::config::{OperatingConfig, RetryPolicy};
use crate::errors::{ConfigError, Result};
use crate::executor::Executor;
use crate::keeper::Keeper;
use crate::market::TokenSet;
use std::sync::Arc;

/// Builder for creating Keeper instances with a fluent API
pub struct KeeperBuilder<R: ?Sized, S: ?Sized> {
    reader: Option<Arc<R>>,
    executor: Option<Executor<S>>,
    config: Option<OperatingConfig>,
    tokens: Option<TokenSet>,
    retry: RetryPolicy,
}

impl<R, S> KeeperBuilder<R, S>
where
    R: MarketReader + ?Sized,
    S: TransactionSender + ?Sized,
{
    /// Create a new KeeperBuilder with the default retry policy
    pub fn new() -> Self {
        Self {
            reader: None,
            executor: None,
            config: None,
            tokens: None,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_reader(mut self, reader: Arc<R>) -> Self {
        self.reader = Some(reader);
        self
    }

    pub fn with_executor(mut self, executor: Executor<S>) -> Self {
        self.executor = Some(executor);
        self
    }

    pub fn with_config(mut self, config: OperatingConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn with_tokens(mut self, tokens: TokenSet) -> Self {
        self.tokens = Some(tokens);
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Build the Keeper; the trading account is the executor's sender.
    ///
    /// # Errors
    ///
    /// Returns an error if a component is missing or the base asset is not a
    /// vault token
    pub fn build(self) -> Result<Keeper<R, S>> {
        let reader = self.reader.ok_or_else(|| missing("reader"))?;
        let executor = self.executor.ok_or_else(|| missing("executor"))?;
        let config = self.config.ok_or_else(|| missing("config"))?;
        let tokens = self.tokens.ok_or_else(|| missing("tokens"))?;

        if !tokens.contains(&config.base_asset()) {
            return Err(ConfigError::InvalidOption {
                option: "base_asset".to_string(),
                reason: format!("{} is not gem, skr or sai", config.base_asset()),
            }
            .into());
        }

        let account = executor.account();
        Ok(Keeper::new(reader, executor, config, tokens, account, self.retry))
    }
}

impl<R, S> Default for KeeperBuilder<R, S>
where
    R: MarketReader + ?Sized,
    S: TransactionSender + ?Sized,
{
    fn default() -> Self {
        Self::new()
    }
}

fn missing(option: &str) -> ConfigError {
    ConfigError::MissingOption {
        option: option.to_string(),
    }
}

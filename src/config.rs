//! Configuration management for the arbitrage keeper.
//!
//! Raw option values (from the command line or the environment) are collected
//! in [`ConfigOptions`] and validated into a [`KeeperConfig`]. The keeper's
//! trading parameters live in [`OperatingConfig`], which is constructed once
//! the base asset has been resolved against the on-chain token set and is
//! immutable afterwards.

use crate::errors::ConfigError;
use crate::numeric::Wad;
use crate::utils::parse_address;
use crate::ConfigResult;
use alloy::primitives::Address;
use alloy::signers::local::PrivateKeySigner;
use std::str::FromStr;
use std::time::Duration;
use url::Url;

/// Default cycle length cap.
pub const DEFAULT_MAX_DEPTH: usize = 3;
/// Shortest cycle the keeper considers.
pub const MIN_PATH_LENGTH: usize = 2;
/// Upper bound accepted for `max_depth`.
pub const MAX_SUPPORTED_DEPTH: usize = 6;

/// Trading parameters for one keeper process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperatingConfig {
    base_asset: Address,
    min_profit: Wad,
    max_engagement: Wad,
    use_batch_executor: bool,
    max_depth: usize,
}

impl OperatingConfig {
    /// Create operating parameters with the default depth and direct submission.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidOption` if `max_engagement` is zero.
    pub fn new(base_asset: Address, min_profit: Wad, max_engagement: Wad) -> ConfigResult<Self> {
        if max_engagement.is_zero() {
            return Err(ConfigError::InvalidOption {
                option: "max_engagement".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }

        Ok(Self {
            base_asset,
            min_profit,
            max_engagement,
            use_batch_executor: false,
            max_depth: DEFAULT_MAX_DEPTH,
        })
    }

    /// Set the cycle length cap.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidOption` outside `2..=6`.
    pub fn with_max_depth(mut self, max_depth: usize) -> ConfigResult<Self> {
        if !(MIN_PATH_LENGTH..=MAX_SUPPORTED_DEPTH).contains(&max_depth) {
            return Err(ConfigError::InvalidOption {
                option: "max_depth".to_string(),
                reason: format!("must be between {MIN_PATH_LENGTH} and {MAX_SUPPORTED_DEPTH}, got {max_depth}"),
            });
        }
        self.max_depth = max_depth;
        Ok(self)
    }

    pub fn with_batch_executor(mut self, use_batch_executor: bool) -> Self {
        self.use_batch_executor = use_batch_executor;
        self
    }

    pub fn base_asset(&self) -> Address {
        self.base_asset
    }

    pub fn min_profit(&self) -> &Wad {
        &self.min_profit
    }

    pub fn max_engagement(&self) -> &Wad {
        &self.max_engagement
    }

    pub fn use_batch_executor(&self) -> bool {
        self.use_batch_executor
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }
}

/// Addresses of the contracts the keeper talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContractAddresses {
    /// Tub: `join`, `exit`, `per`, the token set and the price feed
    pub tub: Address,
    /// Tap: `boom`, `bust` and the liquidation state
    pub tap: Address,
    /// OASIS matching market
    pub otc: Address,
    /// Batch Executor (TxManager); batched mode when present
    pub batch_executor: Option<Address>,
}

/// Retry policy for transient chain errors within one phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub attempts: u32,
    /// Delay before the first retry; doubled after every failure
    pub backoff: Duration,
}

impl RetryPolicy {
    pub fn new(attempts: u32, backoff: Duration) -> Self {
        Self {
            attempts: attempts.max(1),
            backoff,
        }
    }

    /// Delay before retry number `retry` (0-based).
    pub fn delay_for(&self, retry: u32) -> Duration {
        self.backoff.saturating_mul(2u32.saturating_pow(retry))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_millis(500))
    }
}

/// Unvalidated option values.
#[derive(Debug, Clone, Default)]
pub struct ConfigOptions {
    pub rpc_url: String,
    pub private_key: String,
    pub account: String,
    pub vault_address: String,
    pub vault_liquidation_address: String,
    pub book_address: String,
    pub base_asset: String,
    pub min_profit: String,
    pub max_engagement: String,
    pub batch_executor_address: Option<String>,
    pub max_depth: Option<usize>,
    pub retry_attempts: u32,
    pub retry_backoff_ms: u64,
    pub poll_interval_ms: u64,
}

/// Validated process configuration.
#[derive(Debug, Clone)]
pub struct KeeperConfig {
    pub rpc_url: Url,
    pub signer: PrivateKeySigner,
    pub account: Address,
    pub addresses: ContractAddresses,
    /// Symbol (`gem`, `skr`, `sai`) or token address; resolved at startup
    pub base_asset: String,
    pub min_profit: Wad,
    pub max_engagement: Wad,
    pub max_depth: usize,
    pub retry: RetryPolicy,
    pub poll_interval: Duration,
}

impl KeeperConfig {
    /// Validate raw options.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if:
    /// - A required option is empty
    /// - An address, amount or URL is malformed
    /// - The private key is malformed or does not belong to `account`
    /// - `max_depth` or `max_engagement` is out of range
    pub fn from_options(options: ConfigOptions) -> ConfigResult<Self> {
        let rpc_url = required(&options.rpc_url, "rpc_url")?;
        let rpc_url = Url::parse(rpc_url).map_err(|e| ConfigError::InvalidOption {
            option: "rpc_url".to_string(),
            reason: e.to_string(),
        })?;
        if !matches!(rpc_url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidOption {
                option: "rpc_url".to_string(),
                reason: format!("unsupported scheme '{}'", rpc_url.scheme()),
            });
        }

        let signer = parse_private_key(required(&options.private_key, "private_key")?)?;
        let account = address_option(&options.account, "account")?;
        if signer.address() != account {
            return Err(ConfigError::AccountMismatch {
                account: account.to_string(),
                signer: signer.address().to_string(),
            });
        }

        let addresses = ContractAddresses {
            tub: address_option(&options.vault_address, "vault_address")?,
            tap: address_option(&options.vault_liquidation_address, "vault_liquidation_address")?,
            otc: address_option(&options.book_address, "book_address")?,
            batch_executor: options
                .batch_executor_address
                .as_deref()
                .filter(|value| !value.trim().is_empty())
                .map(|value| address_option(value, "batch_executor_address"))
                .transpose()?,
        };

        let base_asset = required(&options.base_asset, "base_asset")?.to_string();
        let min_profit = wad_option(&options.min_profit, "min_profit")?;
        let max_engagement = wad_option(&options.max_engagement, "max_engagement")?;
        if max_engagement.is_zero() {
            return Err(ConfigError::InvalidOption {
                option: "max_engagement".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }

        let max_depth = options.max_depth.unwrap_or(DEFAULT_MAX_DEPTH);
        if !(MIN_PATH_LENGTH..=MAX_SUPPORTED_DEPTH).contains(&max_depth) {
            return Err(ConfigError::InvalidOption {
                option: "max_depth".to_string(),
                reason: format!("must be between {MIN_PATH_LENGTH} and {MAX_SUPPORTED_DEPTH}, got {max_depth}"),
            });
        }

        if options.poll_interval_ms == 0 {
            return Err(ConfigError::InvalidOption {
                option: "poll_interval_ms".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }

        let config = Self {
            rpc_url,
            signer,
            account,
            addresses,
            base_asset,
            min_profit,
            max_engagement,
            max_depth,
            retry: RetryPolicy::new(options.retry_attempts, Duration::from_millis(options.retry_backoff_ms)),
            poll_interval: Duration::from_millis(options.poll_interval_ms),
        };

        tracing::debug!(
            account = %config.account,
            tub = %config.addresses.tub,
            tap = %config.addresses.tap,
            otc = %config.addresses.otc,
            batched = config.addresses.batch_executor.is_some(),
            max_depth = config.max_depth,
            "Keeper configuration validated"
        );

        Ok(config)
    }

    /// Operating parameters once the base asset is known.
    pub fn operating(&self, base_asset: Address) -> ConfigResult<OperatingConfig> {
        Ok(OperatingConfig::new(base_asset, self.min_profit.clone(), self.max_engagement.clone())?
            .with_max_depth(self.max_depth)?
            .with_batch_executor(self.addresses.batch_executor.is_some()))
    }
}

fn required<'a>(value: &'a str, option: &str) -> ConfigResult<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::MissingOption {
            option: option.to_string(),
        });
    }
    Ok(trimmed)
}

fn address_option(value: &str, option: &str) -> ConfigResult<Address> {
    parse_address(required(value, option)?).map_err(|e| ConfigError::InvalidOption {
        option: option.to_string(),
        reason: e.to_string(),
    })
}

fn wad_option(value: &str, option: &str) -> ConfigResult<Wad> {
    Wad::from_str(required(value, option)?).map_err(|e| ConfigError::InvalidOption {
        option: option.to_string(),
        reason: e.to_string(),
    })
}

/// Parse and validate a private key from a string
fn parse_private_key(key_str: &str) -> ConfigResult<PrivateKeySigner> {
    let clean_key = key_str.trim_start_matches("0x");

    if clean_key.len() != 64 {
        return Err(ConfigError::InvalidPrivateKey {
            message: "private_key must be 64 hex characters (32 bytes)".to_string(),
        });
    }

    if !clean_key.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(ConfigError::InvalidPrivateKey {
            message: "private_key contains invalid hex characters".to_string(),
        });
    }

    PrivateKeySigner::from_str(clean_key).map_err(|e| ConfigError::InvalidPrivateKey {
        message: e.to_string(),
    })
}

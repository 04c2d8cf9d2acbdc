use arbitrage_keeper::config::ConfigOptions;
use clap::Parser;

#[derive(Parser, Debug)]
#[clap(author, version, about = "Single-Collateral Dai arbitrage keeper", long_about = None)]
pub struct Args {
    #[clap(long, env = "KEEPER_RPC_URL", help = "HTTP(S) RPC endpoint of the node")]
    pub rpc_url: String,

    #[clap(long, env = "KEEPER_PRIVATE_KEY", hide_env_values = true, help = "Private key of the trading account")]
    pub private_key: String,

    #[clap(long, env = "KEEPER_ACCOUNT", help = "Trading account address; must match the private key")]
    pub account: String,

    #[clap(long, env = "KEEPER_VAULT_ADDRESS", help = "Tub contract address")]
    pub vault_address: String,

    #[clap(long, env = "KEEPER_VAULT_LIQUIDATION_ADDRESS", help = "Tap contract address")]
    pub vault_liquidation_address: String,

    #[clap(long, env = "KEEPER_BOOK_ADDRESS", help = "OASIS matching market address")]
    pub book_address: String,

    #[clap(long, env = "KEEPER_BASE_ASSET", help = "Token every cycle starts and ends in: gem, skr, sai or an address")]
    pub base_asset: String,

    #[clap(long, env = "KEEPER_MIN_PROFIT", help = "Minimum profit in base asset units (e.g. 0.5)")]
    pub min_profit: String,

    #[clap(long, env = "KEEPER_MAX_ENGAGEMENT", help = "Maximum base asset amount committed per cycle")]
    pub max_engagement: String,

    #[clap(long, env = "KEEPER_BATCH_EXECUTOR_ADDRESS", help = "TxManager address; enables batched submission")]
    pub batch_executor_address: Option<String>,

    #[clap(long, env = "KEEPER_MAX_DEPTH", help = "Longest cycle considered, 2 to 6 edges [default: 3]")]
    pub max_depth: Option<usize>,

    #[clap(long, env = "KEEPER_RETRY_ATTEMPTS", default_value_t = 3, help = "Attempts per phase on transient chain errors")]
    pub retry_attempts: u32,

    #[clap(long, env = "KEEPER_RETRY_BACKOFF_MS", default_value_t = 500, help = "Initial retry backoff, doubled per attempt")]
    pub retry_backoff_ms: u64,

    #[clap(long, env = "KEEPER_POLL_INTERVAL_MS", default_value_t = 1000, help = "Block polling interval")]
    pub poll_interval_ms: u64,
}

impl Args {
    pub fn into_options(self) -> ConfigOptions {
        ConfigOptions {
            rpc_url: self.rpc_url,
            private_key: self.private_key,
            account: self.account,
            vault_address: self.vault_address,
            vault_liquidation_address: self.vault_liquidation_address,
            book_address: self.book_address,
            base_asset: self.base_asset,
            min_profit: self.min_profit,
            max_engagement: self.max_engagement,
            batch_executor_address: self.batch_executor_address,
            max_depth: self.max_depth,
            retry_attempts: self.retry_attempts,
            retry_backoff_ms: self.retry_backoff_ms,
            poll_interval_ms: self.poll_interval_ms,
        }
    }
}

/// Parse arguments, printing usage and exiting with code 2 on failure.
pub fn parse_cli_args() -> Args {
    Args::parse()
}

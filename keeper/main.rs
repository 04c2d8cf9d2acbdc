pub mod cli;

use arbitrage_keeper::builders::{ExecutorBuilder, KeeperBuilder};
use arbitrage_keeper::chain::{AlloyChain, MarketReader, PollingBlockSource};
use arbitrage_keeper::config::KeeperConfig;
use arbitrage_keeper::errors::{ChainError, Result};
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("arbitrage_keeper=info")))
        .compact()
        .with_file(false)
        .with_line_number(false)
        .with_target(false)
        .init();

    let args = cli::parse_cli_args();

    tokio::select! {
        result = run(args) => match result {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                tracing::error!(error = %e, "Keeper stopped");
                ExitCode::from(e.exit_code())
            }
        },
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Interrupted, shutting down");
            ExitCode::SUCCESS
        }
    }
}

async fn run(args: cli::Args) -> Result<()> {
    let config = KeeperConfig::from_options(args.into_options())?;
    let chain = Arc::new(AlloyChain::connect(&config).await?);

    let tokens = chain.token_set().await.map_err(|e| ChainError::Unreachable {
        message: format!("reading vault tokens: {e}"),
    })?;
    let base = tokens.resolve_base(&config.base_asset)?;
    let operating = config.operating(base)?;

    let executor = ExecutorBuilder::new()
        .with_sender(Arc::clone(&chain))
        .with_tokens(tokens)
        .with_addresses(config.addresses)
        .use_batch_executor(operating.use_batch_executor())
        .with_retry(config.retry)
        .build()?;

    let mut keeper = KeeperBuilder::new()
        .with_reader(Arc::clone(&chain))
        .with_executor(executor)
        .with_config(operating)
        .with_tokens(tokens)
        .with_retry(config.retry)
        .build()?;

    keeper.initialize().await?;

    let mut blocks = PollingBlockSource::new(chain, config.poll_interval);
    tracing::info!("Starting arbitrage keeper");
    keeper.run(&mut blocks).await
}

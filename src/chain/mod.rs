//! Chain collaborators.
//!
//! The keeper talks to the chain through three seams:
//!
//! - **[`MarketReader`]**: block number, vault state, book orders and balances
//! - **[`TransactionSender`]**: allowances and signed transaction submission
//! - **[`BlockSource`]**: the stream of new blocks driving the cycle loop
//!
//! [`client::AlloyChain`] implements the first two over an Alloy provider,
//! [`blocks::PollingBlockSource`] the third.

pub mod blocks;
pub mod client;
pub mod contracts;
pub mod retry;

#[cfg(test)]
pub(crate) mod mock;

pub use blocks::{BlockTick, PollingBlockSource};
pub use client::AlloyChain;
pub use retry::{retry_with_backoff, send_and_confirm};

use crate::errors::Result;
use crate::executor::ContractCall;
use crate::market::{BookOrder, MarketState, TokenSet, VaultState};
use crate::numeric::Wad;
use alloy::primitives::{Address, B256, U256};
use async_trait::async_trait;

/// Outcome of one mined transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxReceipt {
    pub tx_hash: B256,
    pub block_number: Option<u64>,
    pub gas_used: u64,
    /// `false` if the transaction reverted
    pub success: bool,
}

/// Read access to the markets.
#[async_trait]
pub trait MarketReader: Send + Sync {
    async fn block_number(&self) -> Result<u64>;

    /// The Tub's `gem`, `skr` and `sai` tokens.
    async fn token_set(&self) -> Result<TokenSet>;

    async fn vault_state(&self) -> Result<VaultState>;

    /// Every order currently on the book, live or not.
    async fn book_orders(&self) -> Result<Vec<BookOrder>>;

    async fn balance_of(&self, token: Address, owner: Address) -> Result<Wad>;

    /// Collect everything a snapshot needs for `block_number`.
    async fn read_market(&self, block_number: u64, account: Address, base: Address) -> Result<MarketState> {
        let (vault, orders, base_balance) = tokio::try_join!(
            self.vault_state(),
            self.book_orders(),
            self.balance_of(base, account),
        )?;

        Ok(MarketState {
            block_number,
            vault,
            orders,
            base_balance,
        })
    }
}

/// Signed writes from the keeper's account.
#[async_trait]
pub trait TransactionSender: Send + Sync {
    /// The account transactions are sent from.
    fn account(&self) -> Address;

    async fn allowance(&self, token: Address, owner: Address, spender: Address) -> Result<U256>;

    /// Sign and broadcast one call without waiting for it to be mined.
    async fn broadcast(&self, call: &ContractCall) -> Result<B256>;

    /// Wait for the receipt of a broadcast transaction.
    ///
    /// A mined-but-reverted transaction is `Ok` with `success == false`.
    /// Returns `ChainError::ReceiptNotFound` if the transaction is not mined
    /// in time; the wait may be retried without re-broadcasting.
    async fn receipt(&self, tx_hash: B256) -> Result<TxReceipt>;
}

/// Source of new blocks for the cycle loop.
#[async_trait]
pub trait BlockSource: Send {
    /// Wait for the next block newer than the last one returned.
    async fn next_block(&mut self) -> Result<BlockTick>;
}

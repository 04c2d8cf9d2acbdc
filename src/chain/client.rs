//! Alloy-backed chain client.
//!
//! One wallet-filled provider serves both reads and writes. Nonce, gas and
//! chain id are filled by the provider's recommended fillers. Broadcasting and
//! waiting for the receipt are separate calls so a timed-out wait can be
//! retried without sending the transaction twice.

use crate::chain::contracts::{DSValue, Otc, Tap, Tub, ERC20};
use crate::chain::{MarketReader, TransactionSender, TxReceipt};
use crate::config::{ContractAddresses, KeeperConfig};
use crate::errors::{ChainError, Result};
use crate::executor::ContractCall;
use crate::graph::OrderId;
use crate::market::{BookOrder, FeedReading, TokenSet, VaultState};
use crate::numeric::{Ray, Wad};
use alloy::network::{EthereumWallet, ReceiptResponse, TransactionBuilder};
use alloy::primitives::{Address, B256, U256};
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::rpc::types::TransactionRequest;
use async_trait::async_trait;
use futures::stream::{self, StreamExt, TryStreamExt};
use std::time::Duration;
use tokio::time::Instant;

/// Concurrent `offers(id)` reads per book scan.
const ORDER_READ_CONCURRENCY: usize = 10;

/// How long one receipt wait polls before reporting `ReceiptNotFound`.
const RECEIPT_TIMEOUT: Duration = Duration::from_secs(60);

const RECEIPT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Chain access through an Alloy provider.
#[derive(Clone)]
pub struct AlloyChain {
    provider: DynProvider,
    account: Address,
    addresses: ContractAddresses,
}

impl AlloyChain {
    /// Connect to the configured node and check that it answers.
    ///
    /// # Errors
    ///
    /// Returns `ChainError::Unreachable` if the node does not report a chain
    /// id.
    pub async fn connect(config: &KeeperConfig) -> Result<Self> {
        let wallet = EthereumWallet::from(config.signer.clone());
        let provider = ProviderBuilder::new()
            .wallet(wallet)
            .connect_http(config.rpc_url.clone())
            .erased();

        let chain_id = provider.get_chain_id().await.map_err(|e| ChainError::Unreachable {
            message: e.to_string(),
        })?;

        tracing::info!(
            chain_id = chain_id,
            account = %config.account,
            tub = %config.addresses.tub,
            tap = %config.addresses.tap,
            otc = %config.addresses.otc,
            "Connected to chain"
        );

        Ok(Self::new(provider, config.account, config.addresses))
    }

    pub fn new(provider: DynProvider, account: Address, addresses: ContractAddresses) -> Self {
        Self {
            provider,
            account,
            addresses,
        }
    }

    pub fn addresses(&self) -> &ContractAddresses {
        &self.addresses
    }

    async fn order(&self, id: U256) -> Result<BookOrder> {
        let otc = Otc::new(self.addresses.otc, self.provider.clone());
        let offer = otc.offers(id).call().await?;

        Ok(BookOrder {
            id: OrderId(id),
            pay_token: offer.pay_gem,
            pay_amount: Wad::from_u256(offer.pay_amt),
            buy_token: offer.buy_gem,
            buy_amount: Wad::from_u256(offer.buy_amt),
            owner: offer.owner,
        })
    }
}

#[async_trait]
impl MarketReader for AlloyChain {
    async fn block_number(&self) -> Result<u64> {
        Ok(self.provider.get_block_number().await?)
    }

    async fn token_set(&self) -> Result<TokenSet> {
        let tub = Tub::new(self.addresses.tub, self.provider.clone());
        let (gem, skr, sai) = tokio::try_join!(
            async { tub.gem().call().await },
            async { tub.skr().call().await },
            async { tub.sai().call().await },
        )?;
        Ok(TokenSet { gem, skr, sai })
    }

    async fn vault_state(&self) -> Result<VaultState> {
        let tub = Tub::new(self.addresses.tub, self.provider.clone());
        let tap = Tap::new(self.addresses.tap, self.provider.clone());

        let (per, off, pip, s2s, gap, joy, woe, fog) = tokio::try_join!(
            async { tub.per().call().await },
            async { tub.off().call().await },
            async { tub.pip().call().await },
            async { tap.s2s().call().await },
            async { tap.gap().call().await },
            async { tap.joy().call().await },
            async { tap.woe().call().await },
            async { tap.fog().call().await },
        )?;

        let peek = DSValue::new(pip, self.provider.clone()).peek().call().await?;

        Ok(VaultState {
            per: Ray::from_u256(per),
            // s2s is a ray; the tap prices in wads
            tag: Wad::from(Ray::from_u256(s2s)),
            gap: Wad::from_u256(gap),
            joy: Wad::from_u256(joy),
            woe: Wad::from_u256(woe),
            fog: Wad::from_u256(fog),
            off,
            feed: FeedReading {
                value: Wad::from_u256(U256::from_be_bytes(peek.value.0)),
                live: peek.has,
            },
        })
    }

    async fn book_orders(&self) -> Result<Vec<BookOrder>> {
        let otc = Otc::new(self.addresses.otc, self.provider.clone());
        let last_id: u64 = otc
            .last_offer_id()
            .call()
            .await?
            .try_into()
            .map_err(|_| ChainError::UnexpectedResponse {
                message: "last_offer_id does not fit in u64".to_string(),
            })?;

        let orders: Vec<BookOrder> = stream::iter(1..=last_id)
            .map(|id| self.order(U256::from(id)))
            .buffer_unordered(ORDER_READ_CONCURRENCY)
            .try_collect()
            .await?;

        tracing::debug!(
            last_offer_id = last_id,
            live_orders = orders.iter().filter(|order| order.is_live()).count(),
            "Book orders read"
        );

        Ok(orders)
    }

    async fn balance_of(&self, token: Address, owner: Address) -> Result<Wad> {
        let balance = ERC20::new(token, self.provider.clone()).balanceOf(owner).call().await?;
        Ok(Wad::from_u256(balance))
    }
}

#[async_trait]
impl TransactionSender for AlloyChain {
    fn account(&self) -> Address {
        self.account
    }

    async fn allowance(&self, token: Address, owner: Address, spender: Address) -> Result<U256> {
        Ok(ERC20::new(token, self.provider.clone())
            .allowance(owner, spender)
            .call()
            .await?)
    }

    async fn broadcast(&self, call: &ContractCall) -> Result<B256> {
        let request = TransactionRequest::default()
            .with_from(self.account)
            .with_to(call.target)
            .with_input(call.calldata()?);

        let pending = self.provider.send_transaction(request).await?;
        let tx_hash = *pending.tx_hash();
        tracing::debug!(tx_hash = %tx_hash, call = %call, "Transaction sent");

        Ok(tx_hash)
    }

    async fn receipt(&self, tx_hash: B256) -> Result<TxReceipt> {
        let deadline = Instant::now() + RECEIPT_TIMEOUT;

        loop {
            if let Some(receipt) = self.provider.get_transaction_receipt(tx_hash).await? {
                return Ok(TxReceipt {
                    tx_hash,
                    block_number: receipt.block_number,
                    gas_used: receipt.gas_used,
                    success: receipt.status(),
                });
            }

            if Instant::now() >= deadline {
                return Err(ChainError::ReceiptNotFound {
                    tx_hash: tx_hash.to_string(),
                }
                .into());
            }

            tokio::time::sleep(RECEIPT_POLL_INTERVAL).await;
        }
    }
}

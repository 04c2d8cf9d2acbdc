//! In-memory chain for tests.
//!
//! Simulates the token movements of `join`, `exit`, `boom`, `bust`, OASIS
//! `take`, ERC-20 `approve` and the Batch Executor's atomic `execute`, with
//! allowance checks and transaction counting. A failing call is mined as a
//! reverted transaction and leaves balances untouched.

use crate::chain::{MarketReader, TransactionSender, TxReceipt};
use crate::config::{ContractAddresses, OperatingConfig};
use crate::errors::{ChainError, Result};
use crate::executor::{CallAction, ContractCall};
use crate::graph::OrderId;
use crate::market::{BookOrder, FeedReading, MarketSnapshot, TokenSet, VaultState};
use crate::numeric::{Ray, Wad};
use alloy::primitives::{Address, B256, U256};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::str::FromStr;
use tokio::sync::Mutex;

pub(crate) const GEM: Address = Address::repeat_byte(0x11);
pub(crate) const SKR: Address = Address::repeat_byte(0x22);
pub(crate) const SAI: Address = Address::repeat_byte(0x33);

const KEEPER: Address = Address::repeat_byte(0x0c);
const MAKER: Address = Address::repeat_byte(0x99);
const TUB: Address = Address::repeat_byte(0xa1);
const TAP: Address = Address::repeat_byte(0xa2);
const OTC: Address = Address::repeat_byte(0xa3);
const EXECUTOR: Address = Address::repeat_byte(0xee);

#[derive(Debug, Clone)]
struct MockState {
    block: u64,
    vault: VaultState,
    orders: BTreeMap<OrderId, BookOrder>,
    balances: HashMap<(Address, Address), Wad>,
    allowances: HashMap<(Address, Address, Address), U256>,
    skr_total: Wad,
    tx_count: usize,
    receipts: HashMap<B256, TxReceipt>,
    failing_reads: u32,
    failing_receipts: u32,
    reverting_orders: HashSet<OrderId>,
}

pub(crate) struct MockChain {
    tokens: TokenSet,
    addresses: ContractAddresses,
    min_profit: Wad,
    max_engagement: Wad,
    state: Mutex<MockState>,
}

pub(crate) fn default_vault() -> VaultState {
    VaultState {
        per: Ray::one(),
        tag: Wad::from_number(500),
        gap: wad("1.05"),
        joy: Wad::zero(),
        woe: Wad::zero(),
        fog: Wad::zero(),
        off: false,
        feed: FeedReading {
            value: Wad::from_number(500),
            live: true,
        },
    }
}

fn wad(value: &str) -> Wad {
    Wad::from_str(value).unwrap()
}

impl MockChain {
    /// Default vault, empty book, keeper holding 1000 of each token.
    pub fn new() -> Self {
        let mut balances = HashMap::new();
        for token in [GEM, SKR, SAI] {
            balances.insert((token, KEEPER), Wad::from_number(1_000));
        }

        Self {
            tokens: TokenSet {
                gem: GEM,
                skr: SKR,
                sai: SAI,
            },
            addresses: ContractAddresses {
                tub: TUB,
                tap: TAP,
                otc: OTC,
                batch_executor: None,
            },
            min_profit: Wad::one(),
            max_engagement: Wad::from_number(100),
            state: Mutex::new(MockState {
                block: 1,
                vault: default_vault(),
                orders: BTreeMap::new(),
                balances,
                allowances: HashMap::new(),
                skr_total: Wad::from_number(1_110),
                tx_count: 0,
                receipts: HashMap::new(),
                failing_reads: 0,
                failing_receipts: 0,
                reverting_orders: HashSet::new(),
            }),
        }
    }

    /// Feed at 500, gap 1.05, no orders.
    pub fn scenario_base() -> Self {
        Self::new()
    }

    /// Three orders forming a sai → skr → gem → sai cycle worth 15 sai on 100.
    pub fn scenario_b() -> Self {
        Self::new()
            .with_limits(13, 100)
            .with_order(1, SKR, 105, SAI, 100)
            .with_order(2, GEM, 110, SKR, 105)
            .with_order(3, SAI, 115, GEM, 110)
    }

    /// `join` at par, then an order paying 110 gem for 100 skr.
    pub fn scenario_d() -> Self {
        Self::new()
            .with_limits(5, 100)
            .with_keeper_balance(SKR, Wad::zero())
            .with_skr_total(Wad::from_number(110))
            .with_order(1, GEM, 110, SKR, 100)
    }

    /// An order paying 110 skr for 100 gem, then `exit` at par.
    pub fn scenario_e() -> Self {
        Self::new()
            .with_limits(5, 100)
            .with_keeper_balance(SKR, Wad::zero())
            .with_skr_total(Wad::from_number(110))
            .with_order(1, SKR, 110, GEM, 100)
    }

    pub fn with_limits(mut self, min_profit: u64, max_engagement: u64) -> Self {
        self.min_profit = Wad::from_number(min_profit);
        self.max_engagement = Wad::from_number(max_engagement);
        self
    }

    pub fn with_min_profit(mut self, min_profit: Wad) -> Self {
        self.min_profit = min_profit;
        self
    }

    pub fn with_order(mut self, id: u64, pay_token: Address, pay: u64, buy_token: Address, buy: u64) -> Self {
        let order = BookOrder {
            id: OrderId::from_number(id),
            pay_token,
            pay_amount: Wad::from_number(pay),
            buy_token,
            buy_amount: Wad::from_number(buy),
            owner: MAKER,
        };
        self.state.get_mut().orders.insert(order.id, order);
        self
    }

    pub fn with_vault(mut self, vault: VaultState) -> Self {
        self.state.get_mut().vault = vault;
        self
    }

    pub fn with_keeper_balance(mut self, token: Address, amount: Wad) -> Self {
        self.state.get_mut().balances.insert((token, KEEPER), amount);
        self
    }

    pub fn with_skr_total(mut self, total: Wad) -> Self {
        self.state.get_mut().skr_total = total;
        self
    }

    pub fn tokens(&self) -> TokenSet {
        self.tokens
    }

    pub fn addresses(&self) -> ContractAddresses {
        self.addresses
    }

    pub fn batch_executor(&self) -> Address {
        EXECUTOR
    }

    /// Operating config for `base` with this chain's limits.
    pub fn operating_config(&self, base: &str) -> OperatingConfig {
        let base = self.tokens.resolve_base(base).unwrap();
        OperatingConfig::new(base, self.min_profit.clone(), self.max_engagement.clone()).unwrap()
    }

    pub async fn snapshot(&self, base: &str) -> MarketSnapshot {
        let config = self.operating_config(base);
        let block = self.state.lock().await.block;
        let state = self.read_market(block, KEEPER, config.base_asset()).await.unwrap();
        MarketSnapshot::from_state(&state, &config, &self.tokens).unwrap()
    }

    pub async fn set_block(&self, block: u64) {
        self.state.lock().await.block = block;
    }

    pub async fn set_vault(&self, vault: VaultState) {
        self.state.lock().await.vault = vault;
    }

    /// The next `count` vault reads fail with a transient error.
    pub async fn fail_reads(&self, count: u32) {
        self.state.lock().await.failing_reads = count;
    }

    /// The next `count` receipt waits time out.
    pub async fn fail_receipts(&self, count: u32) {
        self.state.lock().await.failing_receipts = count;
    }

    /// Every `take` of `id` reverts.
    pub async fn revert_order(&self, id: OrderId) {
        self.state.lock().await.reverting_orders.insert(id);
    }

    pub async fn transaction_count(&self) -> usize {
        self.state.lock().await.tx_count
    }

    pub async fn order(&self, id: OrderId) -> Option<BookOrder> {
        self.state.lock().await.orders.get(&id).cloned()
    }

    pub async fn balance(&self, token: Address, owner: Address) -> Wad {
        self.state.lock().await.balance(token, owner)
    }

    pub async fn vault(&self) -> VaultState {
        self.state.lock().await.vault.clone()
    }

    pub async fn skr_total(&self) -> Wad {
        self.state.lock().await.skr_total.clone()
    }
}

impl MockState {
    fn balance(&self, token: Address, owner: Address) -> Wad {
        self.balances.get(&(token, owner)).cloned().unwrap_or_default()
    }

    fn credit(&mut self, token: Address, owner: Address, amount: &Wad) {
        let entry = self.balances.entry((token, owner)).or_default();
        *entry = &*entry + amount;
    }

    fn debit(&mut self, token: Address, owner: Address, amount: &Wad) -> std::result::Result<(), String> {
        let remaining = self
            .balance(token, owner)
            .checked_sub(amount)
            .ok_or_else(|| format!("insufficient {token} balance"))?;
        self.balances.insert((token, owner), remaining);
        Ok(())
    }

    /// `transferFrom(owner, spender, amount)` on behalf of `spender`.
    fn pull(
        &mut self,
        token: Address,
        owner: Address,
        spender: Address,
        amount: &Wad,
    ) -> std::result::Result<(), String> {
        let allowance = self
            .allowances
            .get(&(token, owner, spender))
            .copied()
            .unwrap_or_default();
        let needed = amount.to_u256().map_err(|e| e.to_string())?;
        if allowance < needed {
            return Err(format!("{spender} not approved for {token}"));
        }
        self.debit(token, owner, amount)
    }

    fn apply(&mut self, caller: Address, call: &ContractCall) -> std::result::Result<(), String> {
        let per = self.vault.per.clone();
        match &call.action {
            CallAction::Approve { spender, amount } => {
                self.allowances.insert((call.target, caller, *spender), *amount);
            }
            CallAction::Join(wad) => {
                let cost: Wad = wad * &per;
                self.pull(GEM, caller, TUB, &cost)?;
                self.credit(SKR, caller, wad);
                self.skr_total = &self.skr_total + wad;
            }
            CallAction::Exit(wad) => {
                self.pull(SKR, caller, TUB, wad)?;
                let proceeds: Wad = wad * &per;
                self.credit(GEM, caller, &proceeds);
                self.skr_total = &self.skr_total - wad;
            }
            CallAction::Boom(wad) => {
                let price = &self.vault.tag * &(&Wad::from_number(2) - &self.vault.gap);
                let proceeds = wad * &price;
                self.vault.joy = self.vault.joy.checked_sub(&proceeds).ok_or("boom exceeds joy")?;
                self.pull(SKR, caller, TAP, wad)?;
                self.credit(SAI, caller, &proceeds);
                self.skr_total = &self.skr_total - wad;
            }
            CallAction::Bust(wad) => {
                let cost = wad * &(&self.vault.tag * &self.vault.gap);
                self.vault.fog = self.vault.fog.checked_sub(wad).ok_or("bust exceeds fog")?;
                self.vault.woe = self.vault.woe.checked_sub(&cost).ok_or("bust exceeds woe")?;
                self.pull(SAI, caller, TAP, &cost)?;
                self.credit(SKR, caller, wad);
            }
            CallAction::Take { order_id, quantity } => {
                if self.reverting_orders.contains(order_id) {
                    return Err(format!("take {order_id} reverted"));
                }
                let mut order = self.orders.get(order_id).cloned().ok_or("order not found")?;
                let pay_left = order.pay_amount.checked_sub(quantity).ok_or("quantity exceeds order")?;
                let spend = Wad::from_raw(quantity.raw() * order.buy_amount.raw() / order.pay_amount.raw());

                self.pull(order.buy_token, caller, OTC, &spend)?;
                self.credit(order.buy_token, order.owner, &spend);
                self.credit(order.pay_token, caller, quantity);

                order.buy_amount = order.buy_amount.saturating_sub(&spend);
                order.pay_amount = pay_left;
                if order.pay_amount.is_zero() {
                    self.orders.remove(order_id);
                } else {
                    self.orders.insert(*order_id, order);
                }
            }
            CallAction::Execute { tokens, invocations } => {
                if caller == call.target {
                    return Err("nested execute".to_string());
                }
                let executor = call.target;
                for token in tokens {
                    let amount = self.balance(*token, caller);
                    self.pull(*token, caller, executor, &amount)?;
                    self.credit(*token, executor, &amount);
                }
                for invocation in invocations {
                    self.apply(executor, invocation)?;
                }
                for token in tokens {
                    let amount = self.balance(*token, executor);
                    self.debit(*token, executor, &amount)?;
                    self.credit(*token, caller, &amount);
                }
            }
        }
        Ok(())
    }
}

#[async_trait]
impl MarketReader for MockChain {
    async fn block_number(&self) -> Result<u64> {
        Ok(self.state.lock().await.block)
    }

    async fn token_set(&self) -> Result<TokenSet> {
        Ok(self.tokens)
    }

    async fn vault_state(&self) -> Result<VaultState> {
        let mut state = self.state.lock().await;
        if state.failing_reads > 0 {
            state.failing_reads -= 1;
            return Err(ChainError::Transient {
                message: "injected read failure".to_string(),
            }
            .into());
        }
        Ok(state.vault.clone())
    }

    async fn book_orders(&self) -> Result<Vec<BookOrder>> {
        Ok(self.state.lock().await.orders.values().cloned().collect())
    }

    async fn balance_of(&self, token: Address, owner: Address) -> Result<Wad> {
        Ok(self.state.lock().await.balance(token, owner))
    }
}

#[async_trait]
impl TransactionSender for MockChain {
    fn account(&self) -> Address {
        KEEPER
    }

    async fn allowance(&self, token: Address, owner: Address, spender: Address) -> Result<U256> {
        Ok(self
            .state
            .lock()
            .await
            .allowances
            .get(&(token, owner, spender))
            .copied()
            .unwrap_or_default())
    }

    async fn broadcast(&self, call: &ContractCall) -> Result<B256> {
        call.calldata()?;

        let mut state = self.state.lock().await;
        state.tx_count += 1;
        let tx_hash = B256::from(U256::from(state.tx_count));
        let block_number = Some(state.block);

        let before = state.clone();
        let success = match state.apply(KEEPER, call) {
            Ok(()) => true,
            Err(reason) => {
                let tx_count = state.tx_count;
                *state = before;
                state.tx_count = tx_count;
                tracing::debug!(call = %call, reason = %reason, "Mock transaction reverted");
                false
            }
        };

        state.receipts.insert(
            tx_hash,
            TxReceipt {
                tx_hash,
                block_number,
                gas_used: 21_000,
                success,
            },
        );

        Ok(tx_hash)
    }

    async fn receipt(&self, tx_hash: B256) -> Result<TxReceipt> {
        let mut state = self.state.lock().await;
        if state.failing_receipts > 0 {
            state.failing_receipts -= 1;
            return Err(ChainError::ReceiptNotFound {
                tx_hash: tx_hash.to_string(),
            }
            .into());
        }

        state.receipts.get(&tx_hash).cloned().ok_or_else(|| {
            ChainError::ReceiptNotFound {
                tx_hash: tx_hash.to_string(),
            }
            .into()
        })
    }
}

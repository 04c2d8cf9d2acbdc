//! Per-block market model.
//!
//! Chain reads are collected into a [`MarketState`]; [`MarketSnapshot::from_state`]
//! turns it into an immutable graph of every edge executable at that block.
//! Construction is pure, so two snapshots built from the same state carry the
//! same edge set.
//!
//! # Edge universe
//!
//! - The four vault operations, subject to price, capacity and cage checks
//!   (see [`vault`])
//! - One edge per live book order whose tokens are both vault tokens and both
//!   reachable from the base asset within `max_depth` hops
//!
//! Orders trading any other token are dropped.

pub mod book;
pub mod vault;

pub use book::BookOrder;
pub use vault::{FeedReading, VaultAssets, VaultState};

use crate::builders::MarketGraphBuilder;
use crate::config::OperatingConfig;
use crate::errors::MarketError;
use crate::graph::{Asset, AssetId, Edge, MarketGraph};
use crate::numeric::Wad;
use crate::utils::parse_address;
use crate::MarketResult;
use alloy::primitives::Address;
use std::collections::HashSet;

/// The three vault tokens, as reported by the Tub.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenSet {
    pub gem: Address,
    pub skr: Address,
    pub sai: Address,
}

impl TokenSet {
    pub fn all(&self) -> [(&'static str, Address); 3] {
        [("gem", self.gem), ("skr", self.skr), ("sai", self.sai)]
    }

    pub fn contains(&self, token: &Address) -> bool {
        self.symbol_of(token).is_some()
    }

    pub fn symbol_of(&self, token: &Address) -> Option<&'static str> {
        self.all()
            .into_iter()
            .find(|(_, address)| address == token)
            .map(|(symbol, _)| symbol)
    }

    /// Resolve a configured base asset given as a symbol or a token address.
    ///
    /// # Errors
    ///
    /// Returns `MarketError::UnknownBaseAsset` if the value names none of the
    /// vault tokens.
    pub fn resolve_base(&self, base_asset: &str) -> MarketResult<Address> {
        let wanted = base_asset.trim();

        if let Some((_, address)) = self
            .all()
            .into_iter()
            .find(|(symbol, _)| symbol.eq_ignore_ascii_case(wanted))
        {
            return Ok(address);
        }

        match parse_address(wanted) {
            Ok(address) if self.contains(&address) => Ok(address),
            _ => Err(MarketError::UnknownBaseAsset {
                asset: wanted.to_string(),
            }),
        }
    }
}

/// Raw chain reads for one block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarketState {
    pub block_number: u64,
    pub vault: VaultState,
    pub orders: Vec<BookOrder>,
    /// The keeper's balance of the base asset
    pub base_balance: Wad,
}

/// Immutable view of every executable edge at one block.
#[derive(Debug, Clone)]
pub struct MarketSnapshot {
    block_number: u64,
    graph: MarketGraph,
    base: AssetId,
    vault_assets: VaultAssets,
    base_balance: Wad,
}

impl MarketSnapshot {
    /// Build the snapshot for one block.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The price feed is stale or missing (`MarketError::StaleFeed`)
    /// - The configured base asset is not a vault token
    pub fn from_state(state: &MarketState, config: &OperatingConfig, tokens: &TokenSet) -> MarketResult<Self> {
        let base_address = config.base_asset();
        if !tokens.contains(&base_address) {
            return Err(MarketError::UnknownBaseAsset {
                asset: base_address.to_string(),
            });
        }

        let assets = tokens
            .all()
            .into_iter()
            .map(|(symbol, address)| Asset::new(symbol, address));
        let vault_assets = VaultAssets { gem: 0, skr: 1, sai: 2 };

        let fixed_edges = state.vault.fixed_edges(vault_assets)?;

        let mut orders: Vec<&BookOrder> = state.orders.iter().filter(|order| order.is_live()).collect();
        orders.sort_by_key(|order| order.id);

        let mut order_edges = Vec::with_capacity(orders.len());
        for order in orders {
            let (Some(from), Some(to)) = (token_index(tokens, &order.buy_token), token_index(tokens, &order.pay_token))
            else {
                tracing::trace!(
                    order_id = %order.id,
                    pay_token = %order.pay_token,
                    buy_token = %order.buy_token,
                    "Skipping order outside the vault tokens"
                );
                continue;
            };
            if from == to {
                continue;
            }
            order_edges.push(Edge::book(
                from,
                to,
                order.id,
                order.pay_amount.clone(),
                order.buy_amount.clone(),
            ));
        }

        let candidate = MarketGraphBuilder::new()
            .add_assets(assets.clone())
            .add_edges(fixed_edges.iter().cloned())
            .add_edges(order_edges.iter().cloned())
            .build()?;
        let base = candidate.find_asset_id(&base_address)?;
        let reachable = candidate.reachable_within(base, config.max_depth());

        let order_count = order_edges.len();
        let graph = MarketGraphBuilder::new()
            .add_assets(assets)
            .add_edges(fixed_edges)
            .add_edges(
                order_edges
                    .into_iter()
                    .filter(|edge| reachable.contains(&edge.from) && reachable.contains(&edge.to)),
            )
            .build()?;

        tracing::debug!(
            block_number = state.block_number,
            edges = graph.edge_count(),
            orders = order_count,
            base_balance = %state.base_balance,
            "Market snapshot built"
        );

        Ok(Self {
            block_number: state.block_number,
            graph,
            base,
            vault_assets,
            base_balance: state.base_balance.clone(),
        })
    }

    pub fn block_number(&self) -> u64 {
        self.block_number
    }

    pub fn graph(&self) -> &MarketGraph {
        &self.graph
    }

    pub fn base(&self) -> AssetId {
        self.base
    }

    pub fn vault_assets(&self) -> VaultAssets {
        self.vault_assets
    }

    pub fn base_balance(&self) -> &Wad {
        &self.base_balance
    }

    /// Edges as an unordered set.
    pub fn edge_set(&self) -> HashSet<Edge> {
        self.graph.edges().iter().cloned().collect()
    }
}

fn token_index(tokens: &TokenSet, token: &Address) -> Option<AssetId> {
    tokens.all().iter().position(|(_, address)| address == token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{EdgeKey, OrderId, VaultOp};
    use crate::numeric::Ray;
    use std::str::FromStr;

    fn tokens() -> TokenSet {
        TokenSet {
            gem: Address::repeat_byte(0x11),
            skr: Address::repeat_byte(0x22),
            sai: Address::repeat_byte(0x33),
        }
    }

    fn vault() -> VaultState {
        VaultState {
            per: Ray::one(),
            tag: Wad::from_number(500),
            gap: Wad::from_str("1.05").unwrap(),
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

    fn order(id: u64, pay_token: Address, pay: u64, buy_token: Address, buy: u64) -> BookOrder {
        BookOrder {
            id: OrderId::from_number(id),
            pay_token,
            pay_amount: Wad::from_number(pay),
            buy_token,
            buy_amount: Wad::from_number(buy),
            owner: Address::repeat_byte(0x99),
        }
    }

    fn state(orders: Vec<BookOrder>) -> MarketState {
        MarketState {
            block_number: 1,
            vault: vault(),
            orders,
            base_balance: Wad::from_number(1000),
        }
    }

    fn config() -> OperatingConfig {
        OperatingConfig::new(tokens().sai, Wad::one(), Wad::from_number(100)).unwrap()
    }

    #[test]
    fn test_resolve_base_by_symbol_and_address() {
        let tokens = tokens();
        assert_eq!(tokens.resolve_base("SAI").unwrap(), tokens.sai);
        assert_eq!(tokens.resolve_base("gem").unwrap(), tokens.gem);
        assert_eq!(
            tokens.resolve_base("0x2222222222222222222222222222222222222222").unwrap(),
            tokens.skr
        );
        assert!(matches!(
            tokens.resolve_base("mkr"),
            Err(MarketError::UnknownBaseAsset { .. })
        ));
        assert!(tokens
            .resolve_base("0x4444444444444444444444444444444444444444")
            .is_err());
    }

    #[test]
    fn test_book_edges_run_buy_to_pay() {
        let tokens = tokens();
        let snapshot =
            MarketSnapshot::from_state(&state(vec![order(1, tokens.skr, 105, tokens.sai, 100)]), &config(), &tokens)
                .unwrap();

        let graph = snapshot.graph();
        let sai = graph.find_asset_id(&tokens.sai).unwrap();
        let skr = graph.find_asset_id(&tokens.skr).unwrap();
        assert_eq!(snapshot.base(), sai);
        assert_eq!(graph.edges_between([sai, skr]).len(), 1);
        assert!(graph.contains_key(&EdgeKey::Order(OrderId::from_number(1))));

        // join and exit only: joy, woe and fog are zero
        assert!(graph.contains_key(&EdgeKey::Vault(VaultOp::Join)));
        assert!(!graph.contains_key(&EdgeKey::Vault(VaultOp::Boom)));
        assert_eq!(graph.edge_count(), 3);
    }

    #[test]
    fn test_foreign_and_dead_orders_dropped() {
        let tokens = tokens();
        let foreign = Address::repeat_byte(0x44);
        let mut dead = order(3, tokens.gem, 10, tokens.sai, 10);
        dead.pay_amount = Wad::zero();

        let snapshot = MarketSnapshot::from_state(
            &state(vec![order(2, foreign, 10, tokens.sai, 10), dead]),
            &config(),
            &tokens,
        )
        .unwrap();

        assert_eq!(snapshot.graph().edge_count(), 2);
    }

    #[test]
    fn test_unreachable_orders_dropped() {
        let tokens = tokens();
        let mut caged = state(vec![order(4, tokens.gem, 10, tokens.skr, 10)]);
        caged.vault.off = true;

        // exit only (skr -> gem): nothing leaves sai, so the skr/gem order is out of reach
        let snapshot = MarketSnapshot::from_state(&caged, &config(), &tokens).unwrap();
        assert!(!snapshot
            .graph()
            .contains_key(&EdgeKey::Order(OrderId::from_number(4))));
        assert_eq!(snapshot.graph().edge_count(), 1);
    }

    #[test]
    fn test_stale_feed_fails_construction() {
        let tokens = tokens();
        let mut stale = state(Vec::new());
        stale.vault.feed.live = false;

        assert!(matches!(
            MarketSnapshot::from_state(&stale, &config(), &tokens),
            Err(MarketError::StaleFeed)
        ));
    }

    #[test]
    fn test_same_state_gives_same_edge_set() {
        let tokens = tokens();
        let orders = vec![
            order(1, tokens.skr, 105, tokens.sai, 100),
            order(2, tokens.gem, 110, tokens.skr, 105),
            order(3, tokens.sai, 115, tokens.gem, 110),
        ];
        let mut reversed = orders.clone();
        reversed.reverse();

        let first = MarketSnapshot::from_state(&state(orders), &config(), &tokens).unwrap();
        let second = MarketSnapshot::from_state(&state(reversed), &config(), &tokens).unwrap();

        assert_eq!(first.edge_set(), second.edge_set());
        assert_eq!(first.edge_set().len(), 5);
    }

    #[test]
    fn test_unknown_base_asset() {
        let tokens = tokens();
        let config = OperatingConfig::new(Address::repeat_byte(0x55), Wad::one(), Wad::one()).unwrap();
        assert!(matches!(
            MarketSnapshot::from_state(&state(Vec::new()), &config, &tokens),
            Err(MarketError::UnknownBaseAsset { .. })
        ));
    }
}

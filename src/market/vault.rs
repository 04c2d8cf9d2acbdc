//! Vault (Tub and Tap) state and its fixed-price edges.
//!
//! | op   | edge        | price               | capacity                         |
//! |------|-------------|---------------------|----------------------------------|
//! | join | gem → skr   | `1 / per`           | none                             |
//! | exit | skr → gem   | `per`               | none                             |
//! | boom | skr → sai   | `tag · (2 − gap)`   | `joy / price` skr in             |
//! | bust | sai → skr   | `1 / (tag · gap)`   | `min(woe / (tag · gap), fog)` skr out |
//!
//! `tag` is the Tap's `s2s`, the reference price of skr in sai.

use crate::errors::MarketError;
use crate::graph::{AssetId, Capacity, Edge, VaultOp};
use crate::numeric::{Ray, Wad};
use crate::MarketResult;

/// Price feed reading (`pip.peek()`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedReading {
    pub value: Wad,
    pub live: bool,
}

impl FeedReading {
    pub fn is_usable(&self) -> bool {
        self.live && !self.value.is_zero()
    }
}

/// Vault parameters read at one block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaultState {
    /// gem per skr (`tub.per()`)
    pub per: Ray,
    /// sai per skr (`tap.s2s()`)
    pub tag: Wad,
    /// spread factor (`tap.gap()`), nominally in `[0.95, 1.05]`
    pub gap: Wad,
    /// surplus sai available to `boom` (`tap.joy()`)
    pub joy: Wad,
    /// bad debt to cover through `bust` (`tap.woe()`)
    pub woe: Wad,
    /// liquidated skr held by the Tap (`tap.fog()`)
    pub fog: Wad,
    /// whether the Tub has been caged
    pub off: bool,
    pub feed: FeedReading,
}

/// Asset ids of the vault tokens inside one graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VaultAssets {
    pub gem: AssetId,
    pub skr: AssetId,
    pub sai: AssetId,
}

impl VaultState {
    /// Fixed-price edges currently executable against the vault.
    ///
    /// Edges with a zero price or zero capacity are omitted, as are `join`,
    /// `boom` and `bust` once the Tub is caged. `boom` is also omitted when
    /// `gap` exceeds 2 (its ask would be negative).
    ///
    /// # Errors
    ///
    /// Returns `MarketError::StaleFeed` if the price feed is missing or
    /// stale.
    pub fn fixed_edges(&self, assets: VaultAssets) -> MarketResult<Vec<Edge>> {
        if !self.feed.is_usable() {
            return Err(MarketError::StaleFeed);
        }

        let mut edges = Vec::with_capacity(VaultOp::ALL.len());

        for op in VaultOp::ALL {
            if self.off && !op.allowed_when_caged() {
                tracing::trace!(op = %op, "Vault caged, skipping operation");
                continue;
            }

            let edge = match op {
                VaultOp::Join => self
                    .join_price()
                    .map(|price| Edge::fixed(assets.gem, assets.skr, op, price, Capacity::Unbounded)),
                VaultOp::Exit => self
                    .exit_price()
                    .map(|price| Edge::fixed(assets.skr, assets.gem, op, price, Capacity::Unbounded)),
                VaultOp::Boom => self.boom_edge(assets),
                VaultOp::Bust => self.bust_edge(assets),
            };

            match edge {
                Some(edge) => edges.push(edge),
                None => tracing::trace!(op = %op, "Vault operation unavailable"),
            }
        }

        Ok(edges)
    }

    /// skr per gem; `None` when `per` is zero.
    fn join_price(&self) -> Option<Wad> {
        if self.per.is_zero() {
            return None;
        }
        let price = Wad::from_raw(Wad::unit() * Ray::unit() / self.per.raw());
        (!price.is_zero()).then_some(price)
    }

    fn exit_price(&self) -> Option<Wad> {
        let price = Wad::from(&self.per);
        (!price.is_zero()).then_some(price)
    }

    /// Sai received per skr sold into the Tap.
    fn boom_price(&self) -> Option<Wad> {
        let two = Wad::from_number(2);
        let spread = two.checked_sub(&self.gap)?;
        let price = &self.tag * &spread;
        (!price.is_zero()).then_some(price)
    }

    /// Sai paid per skr bought from the Tap.
    fn bust_cost(&self) -> Option<Wad> {
        let cost = &self.tag * &self.gap;
        (!cost.is_zero()).then_some(cost)
    }

    fn boom_edge(&self, assets: VaultAssets) -> Option<Edge> {
        let price = self.boom_price()?;
        let capacity = self.joy.checked_div(&price)?;
        if capacity.is_zero() {
            return None;
        }
        Some(Edge::fixed(assets.skr, assets.sai, VaultOp::Boom, price, Capacity::Input(capacity)))
    }

    fn bust_edge(&self, assets: VaultAssets) -> Option<Edge> {
        let cost = self.bust_cost()?;
        let price = cost.checked_inverse()?;
        if price.is_zero() {
            return None;
        }
        let coverable = self.woe.checked_div(&cost)?;
        let capacity = coverable.min(self.fog.clone());
        if capacity.is_zero() {
            return None;
        }
        Some(Edge::fixed(assets.sai, assets.skr, VaultOp::Bust, price, Capacity::Output(capacity)))
    }
}

/// Ray from a whole-number ratio.
#[cfg(test)]
pub(crate) fn ray_ratio(numerator: u64, denominator: u64) -> Option<Ray> {
    if denominator == 0 {
        return None;
    }
    use num_bigint::BigUint;

    Some(Ray::from_raw(BigUint::from(numerator) * Ray::unit() / BigUint::from(denominator)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::EdgeKind;
    use std::str::FromStr;

    const ASSETS: VaultAssets = VaultAssets { gem: 0, skr: 1, sai: 2 };

    fn vault() -> VaultState {
        VaultState {
            per: Ray::one(),
            tag: Wad::from_number(500),
            gap: Wad::from_str("1.05").unwrap(),
            joy: Wad::from_number(950),
            woe: Wad::from_number(1050),
            fog: Wad::from_number(10),
            off: false,
            feed: FeedReading {
                value: Wad::from_number(500),
                live: true,
            },
        }
    }

    fn edge_for(edges: &[Edge], op: VaultOp) -> Option<&Edge> {
        edges.iter().find(|edge| edge.vault_op() == Some(op))
    }

    #[test]
    fn test_fixed_edge_prices_and_capacities() {
        let edges = vault().fixed_edges(ASSETS).unwrap();
        assert_eq!(edges.len(), 4);

        let join = edge_for(&edges, VaultOp::Join).unwrap();
        assert_eq!((join.from, join.to), (ASSETS.gem, ASSETS.skr));
        assert_eq!(join.output(&Wad::from_number(7)), Wad::from_number(7));

        // 500 * 0.95 = 475 sai per skr; 950 sai of surplus buys back 2 skr
        let boom = edge_for(&edges, VaultOp::Boom).unwrap();
        match &boom.kind {
            EdgeKind::FixedPrice { price, capacity, .. } => {
                assert_eq!(price, &Wad::from_number(475));
                assert_eq!(capacity, &Capacity::Input(Wad::from_number(2)));
            }
            other => panic!("unexpected edge kind {other:?}"),
        }

        // 525 sai per skr: woe covers 2 skr while fog would allow 10
        let bust = edge_for(&edges, VaultOp::Bust).unwrap();
        assert_eq!((bust.from, bust.to), (ASSETS.sai, ASSETS.skr));
        match &bust.kind {
            EdgeKind::FixedPrice { capacity, .. } => {
                assert_eq!(capacity, &Capacity::Output(Wad::from_number(2)));
            }
            other => panic!("unexpected edge kind {other:?}"),
        }
    }

    #[test]
    fn test_join_price_inverts_per() {
        let mut state = vault();
        state.per = ray_ratio(5, 4).unwrap();

        let edges = state.fixed_edges(ASSETS).unwrap();
        let join = edge_for(&edges, VaultOp::Join).unwrap();
        let exit = edge_for(&edges, VaultOp::Exit).unwrap();

        assert_eq!(join.output(&Wad::from_number(5)), Wad::from_number(4));
        assert_eq!(exit.output(&Wad::from_number(4)), Wad::from_number(5));
    }

    #[test]
    fn test_zero_capacity_edges_are_omitted() {
        let mut state = vault();
        state.joy = Wad::zero();
        state.woe = Wad::zero();

        let edges = state.fixed_edges(ASSETS).unwrap();
        assert!(edge_for(&edges, VaultOp::Boom).is_none());
        assert!(edge_for(&edges, VaultOp::Bust).is_none());
        assert_eq!(edges.len(), 2);
    }

    #[test]
    fn test_caged_vault_only_allows_exit() {
        let mut state = vault();
        state.off = true;

        let edges = state.fixed_edges(ASSETS).unwrap();
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].vault_op(), Some(VaultOp::Exit));
    }

    #[test]
    fn test_gap_above_two_disables_boom() {
        let mut state = vault();
        state.gap = Wad::from_str("2.5").unwrap();

        let edges = state.fixed_edges(ASSETS).unwrap();
        assert!(edge_for(&edges, VaultOp::Boom).is_none());
    }

    #[test]
    fn test_stale_feed_rejected() {
        let mut state = vault();
        state.feed.live = false;
        assert!(matches!(state.fixed_edges(ASSETS), Err(MarketError::StaleFeed)));

        let mut state = vault();
        state.feed.value = Wad::zero();
        assert!(matches!(state.fixed_edges(ASSETS), Err(MarketError::StaleFeed)));
    }
}

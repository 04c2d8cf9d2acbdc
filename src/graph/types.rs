//! Core types and data structures for the market graph.
//!
//! This module contains the fundamental types used throughout the graph system:
//! - Type aliases for identifiers
//! - Asset representation
//! - Edge keys identifying one market instance (a vault operation or an order)
//! - The tagged edge variant carried through enumeration and evaluation

use crate::numeric::{Rate, Wad};
use crate::utils::short_address;
use alloy::primitives::{Address, U256};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Type alias for asset identifiers within the graph
pub type AssetId = usize;

/// Type alias for edge identifiers within the graph
pub type EdgeId = usize;

/// A fungible token node in the market graph.
///
/// Equality and hashing use the token address only; the symbol is a label.
#[derive(Debug, Clone)]
pub struct Asset {
    symbol: String,
    address: Address,
}

impl Asset {
    pub fn new(symbol: impl Into<String>, address: Address) -> Self {
        Self {
            symbol: symbol.into(),
            address,
        }
    }

    /// Asset labelled by its shortened address.
    pub fn unlabelled(address: Address) -> Self {
        Self::new(short_address(&address), address)
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn address(&self) -> Address {
        self.address
    }
}

impl PartialEq for Asset {
    fn eq(&self, other: &Self) -> bool {
        self.address == other.address
    }
}

impl Eq for Asset {}

impl Hash for Asset {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.address.hash(state);
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.symbol)
    }
}

/// Fixed-price operations offered by the vault (Tub and Tap).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum VaultOp {
    /// gem → skr on the Tub
    Join,
    /// skr → gem on the Tub
    Exit,
    /// skr → sai on the Tap
    Boom,
    /// sai → skr on the Tap
    Bust,
}

impl VaultOp {
    pub const ALL: [VaultOp; 4] = [VaultOp::Join, VaultOp::Exit, VaultOp::Boom, VaultOp::Bust];

    pub fn name(&self) -> &'static str {
        match self {
            VaultOp::Join => "join",
            VaultOp::Exit => "exit",
            VaultOp::Boom => "boom",
            VaultOp::Bust => "bust",
        }
    }

    /// Whether the operation stays available after the Tub is caged.
    pub fn allowed_when_caged(&self) -> bool {
        matches!(self, VaultOp::Exit)
    }
}

impl fmt::Display for VaultOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// OASIS order identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OrderId(pub U256);

impl OrderId {
    pub fn from_number(id: u64) -> Self {
        Self(U256::from(id))
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Identity of the market instance behind an edge.
///
/// A cycle uses each key at most once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EdgeKey {
    Vault(VaultOp),
    Order(OrderId),
}

impl fmt::Display for EdgeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EdgeKey::Vault(op) => write!(f, "{op}"),
            EdgeKey::Order(id) => write!(f, "take {id}"),
        }
    }
}

/// Supply cap of a fixed-price edge.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Capacity {
    Unbounded,
    /// At most this much of the `from` asset may go in.
    Input(Wad),
    /// At most this much of the `to` asset may come out.
    Output(Wad),
}

/// The two edge variants.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EdgeKind {
    /// Vault operation at a protocol-determined price (`to` per `from`).
    FixedPrice {
        op: VaultOp,
        price: Wad,
        capacity: Capacity,
    },
    /// Resting order: the maker pays `pay_amount` of `to` for `buy_amount` of `from`.
    BookOrder {
        order_id: OrderId,
        pay_amount: Wad,
        buy_amount: Wad,
    },
}

/// A directed exchange from one asset to another.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Edge {
    pub from: AssetId,
    pub to: AssetId,
    pub kind: EdgeKind,
}

impl Edge {
    pub fn fixed(from: AssetId, to: AssetId, op: VaultOp, price: Wad, capacity: Capacity) -> Self {
        Self {
            from,
            to,
            kind: EdgeKind::FixedPrice { op, price, capacity },
        }
    }

    pub fn book(from: AssetId, to: AssetId, order_id: OrderId, pay_amount: Wad, buy_amount: Wad) -> Self {
        Self {
            from,
            to,
            kind: EdgeKind::BookOrder {
                order_id,
                pay_amount,
                buy_amount,
            },
        }
    }

    pub fn key(&self) -> EdgeKey {
        match &self.kind {
            EdgeKind::FixedPrice { op, .. } => EdgeKey::Vault(*op),
            EdgeKind::BookOrder { order_id, .. } => EdgeKey::Order(*order_id),
        }
    }

    pub fn vault_op(&self) -> Option<VaultOp> {
        match &self.kind {
            EdgeKind::FixedPrice { op, .. } => Some(*op),
            EdgeKind::BookOrder { .. } => None,
        }
    }

    pub fn order_id(&self) -> Option<OrderId> {
        match &self.kind {
            EdgeKind::FixedPrice { .. } => None,
            EdgeKind::BookOrder { order_id, .. } => Some(*order_id),
        }
    }

    /// Exact `to`-per-`from` ratio of the edge.
    pub fn rate(&self) -> Rate {
        match &self.kind {
            EdgeKind::FixedPrice { price, .. } => Rate::from_price(price),
            EdgeKind::BookOrder {
                pay_amount,
                buy_amount,
                ..
            } => Rate::new(pay_amount.raw().clone(), buy_amount.raw().clone())
                .unwrap_or_else(|| Rate::from_price(&Wad::zero())),
        }
    }

    /// Output for `amount_in` of the `from` asset, rounded down.
    pub fn output(&self, amount_in: &Wad) -> Wad {
        self.rate().apply(amount_in)
    }

    /// Largest input this edge accepts, or `None` if it is uncapped.
    pub fn max_input(&self) -> Option<Wad> {
        match &self.kind {
            EdgeKind::FixedPrice { capacity, .. } => match capacity {
                Capacity::Unbounded => None,
                Capacity::Input(limit) => Some(limit.clone()),
                Capacity::Output(limit) => Some(self.rate().max_input_for(limit).unwrap_or_else(Wad::zero)),
            },
            EdgeKind::BookOrder { buy_amount, .. } => Some(buy_amount.clone()),
        }
    }

    /// Whether `amount_in` stays within the edge's capacity.
    pub fn admits(&self, amount_in: &Wad) -> bool {
        match self.max_input() {
            Some(limit) => amount_in <= &limit,
            None => true,
        }
    }
}

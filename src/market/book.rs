//! Resting orders on the OASIS book.

use crate::graph::OrderId;
use crate::numeric::Wad;
use alloy::primitives::Address;

/// One resting order as read from `otc.offers(id)`.
///
/// The maker pays `pay_amount` of `pay_token` and asks `buy_amount` of
/// `buy_token` in return. Taking the order moves the taker from `buy_token`
/// into `pay_token`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookOrder {
    pub id: OrderId,
    pub pay_token: Address,
    pub pay_amount: Wad,
    pub buy_token: Address,
    pub buy_amount: Wad,
    pub owner: Address,
}

impl BookOrder {
    /// Cancelled or fully filled orders read back with zero amounts.
    pub fn is_live(&self) -> bool {
        !self.pay_amount.is_zero() && !self.buy_amount.is_zero()
    }
}

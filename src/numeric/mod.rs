//! Fixed-decimal arithmetic for on-chain amounts.
//!
//! `Wad` (18 decimals), `Ray` (27) and `Rad` (45) are distinct types backed by
//! `BigUint`, so mixing scales is a compile-time error. Multiplication and
//! scale conversion truncate toward zero; see [`mixed`] for the cross-scale
//! output table. [`Rate`] carries the exact ratio of an exchange edge.

pub mod fixed;
pub mod mixed;

pub use fixed::{Rad, Rate, Ray, Wad};

use crate::utils::{biguint_to_u256, u256_to_biguint};
use crate::UtilityResult;
use alloy::primitives::U256;

impl Wad {
    /// Interpret an on-chain `uint256` as a wad.
    pub fn from_u256(value: U256) -> Self {
        Wad::from_raw(u256_to_biguint(value))
    }

    /// Encode for an on-chain call.
    pub fn to_u256(&self) -> UtilityResult<U256> {
        biguint_to_u256(self.raw())
    }
}

impl Ray {
    /// Interpret an on-chain `uint256` as a ray.
    pub fn from_u256(value: U256) -> Self {
        Ray::from_raw(u256_to_biguint(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_bigint::BigUint;
    use std::str::FromStr;

    #[test]
    fn test_wad_mul_truncates() {
        let third = Wad::one().checked_div(&Wad::from_number(3)).unwrap();
        assert_eq!(third.to_string(), "0.333333333333333333");

        let product = &third * &Wad::from_number(3);
        assert_eq!(product.to_string(), "0.999999999999999999");
    }

    #[test]
    fn test_parse_and_display() {
        let wad = Wad::from_str("13.5").unwrap();
        assert_eq!(wad, Wad::from_raw(BigUint::from(135u32) * Wad::unit() / BigUint::from(10u32)));
        assert_eq!(wad.to_string(), "13.500000000000000000");

        assert_eq!(Wad::from_str("100").unwrap(), Wad::from_number(100));
        assert_eq!(Wad::from_str(".5").unwrap(), Wad::from_str("0.5").unwrap());

        assert!(Wad::from_str("").is_err());
        assert!(Wad::from_str("-1").is_err());
        assert!(Wad::from_str("1.2.3").is_err());
        assert!(Wad::from_str("0.0000000000000000001").is_err());
        assert!(Ray::from_str("0.0000000000000000001").is_ok());
    }

    #[test]
    fn test_checked_operations() {
        let five = Wad::from_number(5);
        let seven = Wad::from_number(7);

        assert_eq!(seven.checked_sub(&five), Some(Wad::from_number(2)));
        assert_eq!(five.checked_sub(&seven), None);
        assert_eq!(five.saturating_sub(&seven), Wad::zero());
        assert_eq!(five.checked_div(&Wad::zero()), None);
        assert_eq!(Wad::from_number(4).checked_inverse(), Wad::from_str("0.25").ok());
    }

    #[test]
    fn test_cross_scale_multiplication() {
        let amount = Wad::from_number(10);
        let ratio = Ray::from_str("1.5").unwrap();

        let wad_by_ray: Wad = &amount * &ratio;
        assert_eq!(wad_by_ray, Wad::from_number(15));

        let ray_by_wad: Wad = &ratio * &amount;
        assert_eq!(ray_by_wad, Wad::from_number(15));

        let rad = Rad::from_number(2);
        let rad_by_wad: Rad = &rad * &amount;
        assert_eq!(rad_by_wad, Rad::from_number(20));

        let ray_by_ray: Ray = &ratio * &ratio;
        assert_eq!(ray_by_ray, Ray::from_str("2.25").unwrap());
    }

    #[test]
    fn test_scale_conversions_truncate() {
        let ray = Ray::from_str("1.000000000000000000999").unwrap();
        let wad = Wad::from(&ray);
        assert_eq!(wad, Wad::one());

        let back = Ray::from(&wad);
        assert_eq!(back, Ray::one());

        let rad = Rad::from(Wad::from_number(3));
        assert_eq!(Wad::from(rad), Wad::from_number(3));
    }

    #[test]
    fn test_rate_application() {
        let rate = Rate::new(BigUint::from(115u32), BigUint::from(110u32)).unwrap();
        assert_eq!(rate.apply(&Wad::from_number(110)), Wad::from_number(115));
        assert!(rate.exceeds_unity());

        let limit = Wad::from_number(115);
        assert_eq!(rate.max_input_for(&limit), Some(Wad::from_number(110)));

        let composed = rate.then(&Rate::from_price(&Wad::from_str("0.5").unwrap()));
        assert_eq!(composed.apply(&Wad::from_number(110)), Wad::from_str("57.5").unwrap());

        assert!(Rate::new(BigUint::from(1u32), BigUint::from(0u32)).is_none());
    }

    #[test]
    fn test_u256_round_trip_boundary() {
        let max = Wad::from_u256(U256::MAX);
        assert_eq!(max.to_u256().unwrap(), U256::MAX);

        let too_large = &max + &Wad::from_raw(BigUint::from(1u32));
        assert!(too_large.to_u256().is_err());
    }
}

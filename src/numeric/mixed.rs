//! Cross-scale multiplication and conversions.
//!
//! Output scales:
//!
//! | A × B | Wad | Ray | Rad |
//! |-------|-----|-----|-----|
//! | Wad   | Wad | Wad | Wad |
//! | Ray   | Wad | Ray | Ray |
//! | Rad   | Rad | Rad | Rad |
//!
//! All conversions to a narrower scale truncate.

use super::fixed::{pow10, Rad, Ray, Wad};
use std::ops::Mul;

macro_rules! cross_mul {
    ($lhs:ident * $rhs:ident => $out:ident) => {
        impl<'a> Mul<&'a $rhs> for &'a $lhs {
            type Output = $out;
            fn mul(self, rhs: &'a $rhs) -> $out {
                let shift = $lhs::DECIMALS + $rhs::DECIMALS - $out::DECIMALS;
                $out::from_raw(self.raw() * rhs.raw() / pow10(shift))
            }
        }

        impl Mul<$rhs> for $lhs {
            type Output = $out;
            fn mul(self, rhs: $rhs) -> $out {
                &self * &rhs
            }
        }
    };
}

cross_mul!(Wad * Ray => Wad);
cross_mul!(Wad * Rad => Wad);
cross_mul!(Ray * Wad => Wad);
cross_mul!(Ray * Rad => Ray);
cross_mul!(Rad * Wad => Rad);
cross_mul!(Rad * Ray => Rad);

macro_rules! widen {
    ($from:ident => $to:ident) => {
        impl From<&$from> for $to {
            fn from(value: &$from) -> $to {
                $to::from_raw(value.raw() * pow10($to::DECIMALS - $from::DECIMALS))
            }
        }

        impl From<$from> for $to {
            fn from(value: $from) -> $to {
                $to::from(&value)
            }
        }
    };
}

macro_rules! narrow {
    ($from:ident => $to:ident) => {
        impl From<&$from> for $to {
            fn from(value: &$from) -> $to {
                $to::from_raw(value.raw() / pow10($from::DECIMALS - $to::DECIMALS))
            }
        }

        impl From<$from> for $to {
            fn from(value: $from) -> $to {
                $to::from(&value)
            }
        }
    };
}

widen!(Wad => Ray);
widen!(Wad => Rad);
widen!(Ray => Rad);
narrow!(Ray => Wad);
narrow!(Rad => Wad);
narrow!(Rad => Ray);

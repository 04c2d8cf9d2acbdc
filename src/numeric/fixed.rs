//! Same-scale fixed-decimal types.
//!
//! Every scale is its own type so that adding a `Wad` to a `Ray` does not
//! compile. Values are non-negative; subtracting past zero is an arithmetic
//! invariant violation and panics like `BigUint` does. Callers that can
//! legitimately underflow use `checked_sub`.

use crate::errors::NumericError;
use num_bigint::BigUint;
use num_traits::{One, Zero};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::ops::{Add, Div, Mul, Sub};
use std::str::FromStr;

/// `10^exp` as a `BigUint`.
pub(crate) fn pow10(exp: u32) -> BigUint {
    BigUint::from(10u32).pow(exp)
}

macro_rules! fixed_decimal {
    ($(#[$meta:meta])* $name:ident, $decimals:expr) => {
        $(#[$meta])*
        #[derive(Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(BigUint);

        impl $name {
            /// Number of decimal digits carried by this scale.
            pub const DECIMALS: u32 = $decimals;

            /// The raw integer representing exactly one unit.
            pub fn unit() -> BigUint {
                pow10(Self::DECIMALS)
            }

            /// Wrap a raw scaled integer.
            pub fn from_raw(raw: BigUint) -> Self {
                Self(raw)
            }

            /// The raw scaled integer.
            pub fn raw(&self) -> &BigUint {
                &self.0
            }

            pub fn into_raw(self) -> BigUint {
                self.0
            }

            pub fn zero() -> Self {
                Self(BigUint::zero())
            }

            pub fn one() -> Self {
                Self(Self::unit())
            }

            /// A whole number of units.
            pub fn from_number(units: u64) -> Self {
                Self(BigUint::from(units) * Self::unit())
            }

            pub fn is_zero(&self) -> bool {
                self.0.is_zero()
            }

            /// Subtraction that returns `None` instead of going negative.
            pub fn checked_sub(&self, other: &Self) -> Option<Self> {
                if self.0 >= other.0 {
                    Some(Self(&self.0 - &other.0))
                } else {
                    None
                }
            }

            pub fn saturating_sub(&self, other: &Self) -> Self {
                self.checked_sub(other).unwrap_or_else(Self::zero)
            }

            /// Truncating division; `None` when dividing by zero.
            pub fn checked_div(&self, other: &Self) -> Option<Self> {
                if other.0.is_zero() {
                    None
                } else {
                    Some(Self(&self.0 * Self::unit() / &other.0))
                }
            }

            /// Multiplicative inverse (`1 / self`), truncated.
            pub fn checked_inverse(&self) -> Option<Self> {
                Self::one().checked_div(self)
            }
        }

        impl Add for $name {
            type Output = $name;
            fn add(self, rhs: $name) -> $name {
                $name(self.0 + rhs.0)
            }
        }

        impl<'a> Add<&'a $name> for &'a $name {
            type Output = $name;
            fn add(self, rhs: &'a $name) -> $name {
                $name(&self.0 + &rhs.0)
            }
        }

        impl Sub for $name {
            type Output = $name;
            fn sub(self, rhs: $name) -> $name {
                $name(self.0 - rhs.0)
            }
        }

        impl<'a> Sub<&'a $name> for &'a $name {
            type Output = $name;
            fn sub(self, rhs: &'a $name) -> $name {
                $name(&self.0 - &rhs.0)
            }
        }

        impl Mul for $name {
            type Output = $name;
            fn mul(self, rhs: $name) -> $name {
                $name(self.0 * rhs.0 / $name::unit())
            }
        }

        impl<'a> Mul<&'a $name> for &'a $name {
            type Output = $name;
            fn mul(self, rhs: &'a $name) -> $name {
                $name(&self.0 * &rhs.0 / $name::unit())
            }
        }

        impl Div for $name {
            type Output = $name;
            fn div(self, rhs: $name) -> $name {
                $name(self.0 * $name::unit() / rhs.0)
            }
        }

        impl<'a> Div<&'a $name> for &'a $name {
            type Output = $name;
            fn div(self, rhs: &'a $name) -> $name {
                $name(&self.0 * $name::unit() / &rhs.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                let unit = Self::unit();
                let integer = &self.0 / &unit;
                let fraction = &self.0 % &unit;
                write!(
                    f,
                    "{}.{:0>width$}",
                    integer,
                    fraction.to_string(),
                    width = Self::DECIMALS as usize
                )
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self)
            }
        }

        impl FromStr for $name {
            type Err = NumericError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                parse_decimal(s, Self::DECIMALS).map(Self)
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.collect_str(self)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                s.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

fixed_decimal!(
    /// Fixed-decimal number with 18 decimals; token amounts and most prices.
    Wad,
    18
);

fixed_decimal!(
    /// Fixed-decimal number with 27 decimals; ratios such as the Tub's `per`.
    Ray,
    27
);

fixed_decimal!(
    /// Fixed-decimal number with 45 decimals; products of wads and rays.
    Rad,
    45
);

/// Parse a non-negative decimal string into a raw integer at `decimals` scale.
fn parse_decimal(input: &str, decimals: u32) -> Result<BigUint, NumericError> {
    let trimmed = input.trim();
    let invalid = |reason: &str| NumericError::InvalidDecimal {
        input: input.to_string(),
        reason: reason.to_string(),
    };

    if trimmed.is_empty() {
        return Err(invalid("empty value"));
    }

    let (integer, fraction) = match trimmed.split_once('.') {
        Some((integer, fraction)) => (integer, fraction),
        None => (trimmed, ""),
    };

    if integer.is_empty() && fraction.is_empty() {
        return Err(invalid("no digits"));
    }
    if !integer.chars().all(|c| c.is_ascii_digit()) || !fraction.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid("only unsigned decimal digits are allowed"));
    }
    if fraction.len() > decimals as usize {
        return Err(invalid("too many fractional digits for this scale"));
    }

    let integer_part = if integer.is_empty() {
        BigUint::zero()
    } else {
        BigUint::from_str(integer).map_err(|_| invalid("malformed integer part"))?
    };

    let fraction_part = if fraction.is_empty() {
        BigUint::zero()
    } else {
        let padded = format!("{:0<width$}", fraction, width = decimals as usize);
        BigUint::from_str(&padded).map_err(|_| invalid("malformed fractional part"))?
    };

    Ok(integer_part * pow10(decimals) + fraction_part)
}

/// Exact ratio used to move amounts across an edge.
///
/// Applying a rate computes `floor(amount * numerator / denominator)`, so
/// chaining rates never overstates an output.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Rate {
    numerator: BigUint,
    denominator: BigUint,
}

impl Rate {
    /// Build a rate; `None` for a zero denominator.
    pub fn new(numerator: BigUint, denominator: BigUint) -> Option<Self> {
        if denominator.is_zero() {
            None
        } else {
            Some(Self { numerator, denominator })
        }
    }

    /// Identity rate.
    pub fn unity() -> Self {
        Self {
            numerator: BigUint::one(),
            denominator: BigUint::one(),
        }
    }

    /// Rate equal to a wad-denominated price.
    pub fn from_price(price: &Wad) -> Self {
        Self {
            numerator: price.raw().clone(),
            denominator: Wad::unit(),
        }
    }

    pub fn numerator(&self) -> &BigUint {
        &self.numerator
    }

    pub fn denominator(&self) -> &BigUint {
        &self.denominator
    }

    pub fn is_zero(&self) -> bool {
        self.numerator.is_zero()
    }

    /// Compose two rates exactly.
    pub fn then(&self, next: &Rate) -> Rate {
        Rate {
            numerator: &self.numerator * &next.numerator,
            denominator: &self.denominator * &next.denominator,
        }
    }

    /// `floor(amount * rate)`.
    pub fn apply(&self, amount: &Wad) -> Wad {
        Wad::from_raw(amount.raw() * &self.numerator / &self.denominator)
    }

    /// Largest input whose exact image under this rate stays within `limit`.
    ///
    /// Returns `None` for a zero rate, which no limit can bind.
    pub fn max_input_for(&self, limit: &Wad) -> Option<Wad> {
        if self.numerator.is_zero() {
            None
        } else {
            Some(Wad::from_raw(limit.raw() * &self.denominator / &self.numerator))
        }
    }

    /// Whether the rate is strictly greater than one.
    pub fn exceeds_unity(&self) -> bool {
        self.numerator > self.denominator
    }
}

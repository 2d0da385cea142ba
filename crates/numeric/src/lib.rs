//! Stakeward Numeric
//!
//! Arbitrary-precision token amounts in the chain's smallest base unit.
//! One whole token is 10^24 base units; contract views and arguments carry
//! amounts as decimal strings to avoid float precision loss.

use std::fmt;
use std::ops::{Add, AddAssign, Div, Mul, Rem, Sub, SubAssign};

use num_bigint::BigInt;
use num_traits::{Signed, ToPrimitive, Zero};
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Decimal places below one whole token.
pub const TOKEN_DECIMALS: u32 = 24;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum AmountError {
    #[error("empty amount string")]
    Empty,
    #[error("invalid decimal amount: {0:?}")]
    InvalidDigits(String),
}

/// A signed base-unit amount of arbitrary precision.
///
/// Division truncates toward zero and `%` yields the matching remainder,
/// the same semantics the on-chain bookkeeping assumes.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Balance(BigInt);

impl Balance {
    pub fn zero() -> Self {
        Balance(BigInt::zero())
    }

    /// One whole token: 10^24 base units.
    pub fn one_token() -> Self {
        Balance(BigInt::from(10u32).pow(TOKEN_DECIMALS))
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn is_positive(&self) -> bool {
        self.0.is_positive()
    }

    /// Parse a base-10 integer string, with an optional leading sign.
    pub fn parse(s: &str) -> Result<Self, AmountError> {
        if s.is_empty() {
            return Err(AmountError::Empty);
        }
        BigInt::parse_bytes(s.as_bytes(), 10)
            .map(Balance)
            .ok_or_else(|| AmountError::InvalidDigits(s.to_owned()))
    }

    /// The decimal-string form used for JSON arguments.
    pub fn to_decimal_string(&self) -> String {
        self.0.to_str_radix(10)
    }

    /// `None` when the amount does not fit (or is negative).
    pub fn to_u64(&self) -> Option<u64> {
        self.0.to_u64()
    }
}

impl fmt::Display for Balance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.to_str_radix(10))
    }
}

impl From<u64> for Balance {
    fn from(v: u64) -> Self {
        Balance(BigInt::from(v))
    }
}

impl From<u128> for Balance {
    fn from(v: u128) -> Self {
        Balance(BigInt::from(v))
    }
}

macro_rules! balance_binop {
    ($trait:ident, $method:ident) => {
        impl $trait for Balance {
            type Output = Balance;
            fn $method(self, rhs: Balance) -> Balance {
                Balance(self.0.$method(rhs.0))
            }
        }

        impl $trait for &Balance {
            type Output = Balance;
            fn $method(self, rhs: &Balance) -> Balance {
                Balance((&self.0).$method(&rhs.0))
            }
        }
    };
}

balance_binop!(Add, add);
balance_binop!(Sub, sub);
balance_binop!(Mul, mul);
balance_binop!(Div, div);
balance_binop!(Rem, rem);

impl AddAssign<&Balance> for Balance {
    fn add_assign(&mut self, rhs: &Balance) {
        self.0 += &rhs.0;
    }
}

impl SubAssign<&Balance> for Balance {
    fn sub_assign(&mut self, rhs: &Balance) {
        self.0 -= &rhs.0;
    }
}

impl Serialize for Balance {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_decimal_string())
    }
}

struct BalanceVisitor;

impl Visitor<'_> for BalanceVisitor {
    type Value = Balance;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a decimal string or integer amount")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Balance, E> {
        Balance::parse(v).map_err(E::custom)
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Balance, E> {
        Ok(Balance::from(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Balance, E> {
        Ok(Balance(BigInt::from(v)))
    }
}

impl<'de> Deserialize<'de> for Balance {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Balance, D::Error> {
        deserializer.deserialize_any(BalanceVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(n: u64) -> Balance {
        Balance::from(n) * Balance::one_token()
    }

    #[test]
    fn test_one_token_magnitude() {
        assert_eq!(Balance::one_token().to_decimal_string(), format!("1{}", "0".repeat(24)));
    }

    #[test]
    fn test_parse_display_round_trip() {
        let s = "123456789012345678901234567890";
        let b = Balance::parse(s).unwrap();
        assert_eq!(b.to_decimal_string(), s);

        let neg = Balance::parse("-42").unwrap();
        assert_eq!(neg.to_string(), "-42");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!(Balance::parse(""), Err(AmountError::Empty));
        assert!(Balance::parse("12.5").is_err());
        assert!(Balance::parse("abc").is_err());
    }

    #[test]
    fn test_div_truncates_toward_zero() {
        // 10 tokens split 4 ways is exact: 2.5 tokens each.
        let part = tokens(10) / Balance::from(4u64);
        assert_eq!(part.to_decimal_string(), format!("25{}", "0".repeat(23)));
        assert!( (tokens(10) % Balance::from(4u64)).is_zero() );

        // 7 tokens split 3 ways leaves a one-base-unit remainder.
        let part = tokens(7) / Balance::from(3u64);
        let rem = tokens(7) % Balance::from(3u64);
        assert_eq!(&(&part * &Balance::from(3u64)) + &rem, tokens(7));
        assert_eq!(rem, Balance::from(1u64));
    }

    #[test]
    fn test_ordering_and_sign() {
        assert!(tokens(2) > tokens(1));
        assert!(Balance::zero() < Balance::one_token());
        assert!(tokens(1).is_positive());
        assert!(!Balance::zero().is_positive());
        assert!((tokens(1) - tokens(2)) < Balance::zero());
    }

    #[test]
    fn test_serde_string_and_number_forms() {
        let from_str: Balance = serde_json::from_str("\"5000000000000000000000000\"").unwrap();
        assert_eq!(from_str, tokens(5));

        let from_num: Balance = serde_json::from_str("43200").unwrap();
        assert_eq!(from_num, Balance::from(43_200u64));

        // Amounts always serialize back to the decimal-string form.
        assert_eq!(
            serde_json::to_string(&from_str).unwrap(),
            "\"5000000000000000000000000\""
        );
    }

    #[test]
    fn test_json_round_trip_is_byte_identical() {
        for s in ["0", "1", "999999999999999999999999999999999", "10000000000000000000000000"] {
            let b = Balance::parse(s).unwrap();
            let json = serde_json::to_string(&b).unwrap();
            let back: Balance = serde_json::from_str(&json).unwrap();
            assert_eq!(back.to_decimal_string(), s);
        }
    }
}

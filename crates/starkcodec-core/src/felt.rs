//! Field elements and their `0x`-hex wire form.
//!
//! Every hash, address, selector and numeric amount on the Starknet JSON-RPC
//! wire is a field element rendered as a `0x`-prefixed hex string of
//! variable length. [`Felt`] accepts any such string (leading zeros and upper
//! case digits included) and always renders the canonical lowercase, minimal
//! form.

use alloy_primitives::U256;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::{fmt, str::FromStr};
use thiserror::Error;

/// The Stark field prime, `2^251 + 17 * 2^192 + 1`.
pub const FIELD_PRIME: U256 = U256::from_limbs([1, 0, 0, 0x0800_0000_0000_0011]);

/// Maximum number of significant hex digits in a field element.
const MAX_DIGITS: usize = 64;

/// Errors produced while parsing a felt from its hex form.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FeltParseError {
    #[error("expected a 0x-prefixed hex string, got {0:?}")]
    MissingPrefix(String),

    #[error("hex string has no digits")]
    Empty,

    #[error("invalid hex digit {0:?}")]
    InvalidDigit(char),

    #[error("{digits} significant hex digits exceed the 64 digit limit")]
    TooLong { digits: usize },

    #[error("value is not below the field prime")]
    OutOfRange,
}

/// A Starknet field element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Felt(U256);

impl Felt {
    pub const ZERO: Felt = Felt(U256::ZERO);
    pub const ONE: Felt = Felt(U256::from_limbs([1, 0, 0, 0]));

    /// Parse a `0x`-prefixed hex string.
    pub fn from_hex(s: &str) -> Result<Self, FeltParseError> {
        s.parse()
    }

    /// Wrap a 256-bit integer, rejecting values outside the field.
    pub fn from_u256(value: U256) -> Result<Self, FeltParseError> {
        if value >= FIELD_PRIME {
            return Err(FeltParseError::OutOfRange);
        }
        Ok(Self(value))
    }

    pub fn as_u256(&self) -> U256 {
        self.0
    }

    /// Returns the value as a `u64` if it fits.
    pub fn to_u64(&self) -> Option<u64> {
        let limbs = self.0.as_limbs();
        if limbs[1..].iter().all(|limb| *limb == 0) {
            Some(limbs[0])
        } else {
            None
        }
    }

    pub fn is_zero(&self) -> bool {
        self.0 == U256::ZERO
    }

    /// Big-endian 32 byte representation.
    pub fn to_be_bytes(&self) -> [u8; 32] {
        self.0.to_be_bytes::<32>()
    }
}

impl From<u64> for Felt {
    fn from(value: u64) -> Self {
        Self(U256::from(value))
    }
}

impl FromStr for Felt {
    type Err = FeltParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s
            .strip_prefix("0x")
            .ok_or_else(|| FeltParseError::MissingPrefix(s.to_string()))?;
        if digits.is_empty() {
            return Err(FeltParseError::Empty);
        }
        if let Some(bad) = digits.chars().find(|c| !c.is_ascii_hexdigit()) {
            return Err(FeltParseError::InvalidDigit(bad));
        }

        let significant = digits.trim_start_matches('0');
        if significant.len() > MAX_DIGITS {
            return Err(FeltParseError::TooLong {
                digits: significant.len(),
            });
        }
        if significant.is_empty() {
            return Ok(Self::ZERO);
        }

        let value =
            U256::from_str_radix(significant, 16).map_err(|_| FeltParseError::OutOfRange)?;
        Self::from_u256(value)
    }
}

impl fmt::Display for Felt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let encoded = hex::encode(self.to_be_bytes());
        match encoded.trim_start_matches('0') {
            "" => f.write_str("0x0"),
            digits => write!(f, "0x{digits}"),
        }
    }
}

impl Serialize for Felt {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Felt {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct FeltVisitor;

        impl de::Visitor<'_> for FeltVisitor {
            type Value = Felt;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a 0x-prefixed hex string")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Felt, E> {
                v.parse().map_err(E::custom)
            }
        }

        deserializer.deserialize_str(FeltVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_variable_length_hex() {
        assert_eq!(Felt::from_hex("0x4").unwrap(), Felt::from(4));
        assert_eq!(Felt::from_hex("0x0004").unwrap(), Felt::from(4));
        assert_eq!(
            Felt::from_hex("0xde0b6b3a7640000").unwrap(),
            Felt::from(1_000_000_000_000_000_000)
        );
    }

    #[test]
    fn upper_case_digits_render_lowercase() {
        let felt = Felt::from_hex("0x41A78E741E5AF2FEC34B695679BC6891742439F7AFB8484ECD7766661AD02BF")
            .unwrap();
        assert_eq!(
            felt.to_string(),
            "0x41a78e741e5af2fec34b695679bc6891742439f7afb8484ecd7766661ad02bf"
        );
    }

    #[test]
    fn zero_renders_as_single_digit() {
        assert_eq!(Felt::from_hex("0x000").unwrap().to_string(), "0x0");
        assert!(Felt::ZERO.is_zero());
    }

    #[test]
    fn rejects_non_prefixed_and_non_hex() {
        assert!(matches!(
            Felt::from_hex("1234"),
            Err(FeltParseError::MissingPrefix(_))
        ));
        assert_eq!(Felt::from_hex("0x"), Err(FeltParseError::Empty));
        assert_eq!(Felt::from_hex("0xzz"), Err(FeltParseError::InvalidDigit('z')));
    }

    #[test]
    fn rejects_values_outside_the_field() {
        let prime = "0x800000000000011000000000000000000000000000000000000000000000001";
        assert_eq!(Felt::from_hex(prime), Err(FeltParseError::OutOfRange));

        let max = "0x800000000000011000000000000000000000000000000000000000000000000";
        assert!(Felt::from_hex(max).is_ok());

        let too_long = format!("0x1{}", "0".repeat(64));
        assert!(matches!(
            Felt::from_hex(&too_long),
            Err(FeltParseError::TooLong { digits: 65 })
        ));
    }

    #[test]
    fn serde_uses_hex_strings() {
        let felt: Felt = serde_json::from_str("\"0x00ff\"").unwrap();
        assert_eq!(felt.to_u64(), Some(255));
        assert_eq!(serde_json::to_string(&felt).unwrap(), "\"0xff\"");
        assert!(serde_json::from_str::<Felt>("255").is_err());
    }
}

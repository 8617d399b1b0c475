//! Base-unit value amounts
//!
//! Amounts are integers in the smallest indivisible unit (18 decimals by
//! default, like wei). rust_decimal handles conversion from human-denominated
//! values so no floating-point rounding ever touches custody arithmetic.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::errors::TypesError;
use crate::ids::WORD_LEN;

/// Decimals used by the native value unit.
pub const NATIVE_DECIMALS: u32 = 18;

/// Largest number of decimals a `Decimal` can scale by.
const MAX_DECIMALS: u32 = 28;

/// Quantity of custodied value in base units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Amount(u128);

impl Amount {
    pub const ZERO: Amount = Amount(0);

    pub const fn new(base_units: u128) -> Self {
        Self(base_units)
    }

    pub fn as_u128(&self) -> u128 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, other: Amount) -> Option<Amount> {
        self.0.checked_add(other.0).map(Amount)
    }

    pub fn checked_sub(self, other: Amount) -> Option<Amount> {
        self.0.checked_sub(other.0).map(Amount)
    }

    /// Big-endian encoding left-padded to a 32-byte word.
    pub fn to_word(&self) -> [u8; WORD_LEN] {
        let mut word = [0u8; WORD_LEN];
        word[WORD_LEN - 16..].copy_from_slice(&self.0.to_be_bytes());
        word
    }

    /// Convert a human-denominated value into base units.
    ///
    /// Rejects negative values and values carrying more precision than
    /// `decimals` allows.
    pub fn from_decimal(value: Decimal, decimals: u32) -> Result<Self, TypesError> {
        if value.is_sign_negative() && !value.is_zero() {
            return Err(TypesError::InvalidAmount(format!("negative value {}", value)));
        }
        if decimals > MAX_DECIMALS {
            return Err(TypesError::AmountOutOfRange(format!(
                "{} decimals exceeds maximum of {}",
                decimals, MAX_DECIMALS
            )));
        }

        let factor = Decimal::from_i128_with_scale(10i128.pow(decimals), 0);
        let scaled = value
            .checked_mul(factor)
            .ok_or_else(|| TypesError::AmountOutOfRange(value.to_string()))?;

        if !scaled.fract().is_zero() {
            return Err(TypesError::InvalidAmount(format!(
                "{} has more than {} decimals",
                value, decimals
            )));
        }

        scaled
            .trunc()
            .to_u128()
            .map(Self)
            .ok_or_else(|| TypesError::AmountOutOfRange(value.to_string()))
    }

    /// Parse a decimal string (e.g. `"1.5"`) into base units.
    pub fn parse_units(value: &str, decimals: u32) -> Result<Self, TypesError> {
        let parsed = Decimal::from_str_exact(value)
            .map_err(|e| TypesError::InvalidAmount(format!("{}: {}", value, e)))?;
        Self::from_decimal(parsed, decimals)
    }

    /// Parse a value denominated in whole native units.
    pub fn parse_native(value: &str) -> Result<Self, TypesError> {
        Self::parse_units(value, NATIVE_DECIMALS)
    }

    /// Human-denominated representation, if it fits in a `Decimal`.
    pub fn to_decimal(&self, decimals: u32) -> Option<Decimal> {
        let units = i128::try_from(self.0).ok()?;
        Decimal::try_from_i128_with_scale(units, decimals)
            .ok()
            .map(|d| d.normalize())
    }
}

impl From<u128> for Amount {
    fn from(base_units: u128) -> Self {
        Self(base_units)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Amount {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<u128>()
            .map(Self)
            .map_err(|e| TypesError::InvalidAmount(format!("{}: {}", s, e)))
    }
}

// u128 is not representable in every JSON consumer; amounts travel as strings.
impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

//! Token amounts in base units
//!
//! Amounts travel over the wire as decimal strings (u128 does not fit in a
//! JSON number) and are configured by operators in whole-token units.

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::errors::SharedError;

/// Decimals of the native NEAR token (yoctoNEAR)
pub const NEAR_DECIMALS: u32 = 24;

/// Amount expressed in a token's smallest unit
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Balance(pub u128);

impl Balance {
    pub const ZERO: Balance = Balance(0);

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Convert a whole-token amount into base units for a token with `decimals` precision
    pub fn from_decimal(amount: Decimal, decimals: u32) -> Result<Self, SharedError> {
        let invalid = |reason: &str| SharedError::InvalidAmount {
            input: amount.to_string(),
            reason: reason.to_string(),
        };

        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(invalid("amount must not be negative"));
        }

        let mantissa = u128::try_from(amount.mantissa()).map_err(|_| invalid("amount out of range"))?;
        let scale = amount.scale();

        if decimals >= scale {
            10u128
                .checked_pow(decimals - scale)
                .and_then(|factor| mantissa.checked_mul(factor))
                .map(Balance)
                .ok_or_else(|| invalid("amount overflows base units"))
        } else {
            let divisor = 10u128.pow(scale - decimals);
            if mantissa % divisor != 0 {
                return Err(invalid("amount has more precision than the token supports"));
            }
            Ok(Balance(mantissa / divisor))
        }
    }

    /// Parse a whole-token amount string such as `"0.1"`
    pub fn parse_units(input: &str, decimals: u32) -> Result<Self, SharedError> {
        let amount = Decimal::from_str(input.trim()).map_err(|e| SharedError::InvalidAmount {
            input: input.to_string(),
            reason: e.to_string(),
        })?;
        Self::from_decimal(amount, decimals)
    }
}

impl fmt::Display for Balance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Balance {
    type Err = SharedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<u128>().map(Balance).map_err(|e| SharedError::InvalidAmount {
            input: s.to_string(),
            reason: e.to_string(),
        })
    }
}

impl Serialize for Balance {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for Balance {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

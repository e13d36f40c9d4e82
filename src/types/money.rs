use crate::types::errors::MoneyError;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

const DECIMAL_PLACES: usize = 2;
const SCALE: i64 = 10i64.pow(DECIMAL_PLACES as u32);

/// A currency amount held as an integer count of minor units (1/100).
///
/// Only checked arithmetic is offered so an overflow always surfaces to the
/// caller instead of being clamped or wrapped.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    pub fn new() -> Self {
        Money(0)
    }

    pub fn from_minor_units(minor_units: i64) -> Self {
        Money(minor_units)
    }

    /// Whole currency units, e.g. `Money::from_major(30)` is `30.00`.
    pub fn from_major(major_units: i64) -> Result<Self, MoneyError> {
        major_units.checked_mul(SCALE).map(Money).ok_or(MoneyError::Overflow)
    }

    pub fn minor_units(&self) -> i64 {
        self.0
    }

    pub fn is_negative(&self) -> bool {
        self.0 < 0
    }

    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, rhs: Money) -> Option<Money> {
        self.0.checked_add(rhs.0).map(Money)
    }

    pub fn checked_sub(self, rhs: Money) -> Option<Money> {
        self.0.checked_sub(rhs.0).map(Money)
    }

    pub fn checked_mul(self, factor: u32) -> Option<Money> {
        self.0.checked_mul(i64::from(factor)).map(Money)
    }
}

impl Display for Money {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let integer = abs / SCALE as u64;
        let fraction = abs % SCALE as u64;
        write!(formatter, "{}{}.{:0width$}", sign, integer, fraction, width = DECIMAL_PLACES)
    }
}

impl FromStr for Money {
    type Err = MoneyError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim();

        if value.is_empty() {
            return Err(MoneyError::InvalidFormat("Value is an empty string".to_string()));
        }

        let (integer_part, fraction_part) = match value.split_once('.') {
            Some((integer, fraction)) => (integer, Some(fraction)),
            None => (value, None)
        };

        let integer: i64 = integer_part.parse().map_err(|error| {
            MoneyError::InvalidFormat(format!("Value has an invalid integer part: {:?}", error))
        })?;

        let fraction: i64 = match fraction_part {
            Some(fraction) => {
                if !fraction.chars().all(|c| c.is_ascii_digit()) {
                    return Err(MoneyError::InvalidFormat("Value has an invalid fraction part".to_string()));
                }

                if fraction.len() > DECIMAL_PLACES {
                    return Err(MoneyError::InvalidFormat("Value has too many decimal places".to_string()));
                }

                let padded = format!("{:0<width$}", fraction, width = DECIMAL_PLACES);

                padded.parse()?
            }
            None => 0
        };

        let sign = if value.starts_with('-') { -1 } else { 1 };
        let result = integer.checked_mul(SCALE)
            .and_then(|v| v.checked_add(sign * fraction))
            .ok_or(MoneyError::Overflow)?;

        Ok(Money(result))
    }
}

impl TryFrom<Decimal> for Money {
    type Error = MoneyError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        let scaled = value.checked_mul(Decimal::from(SCALE))
            .ok_or(MoneyError::Overflow)?;

        if !scaled.fract().is_zero() {
            return Err(MoneyError::Precision(value.to_string()));
        }

        scaled.to_i64().map(Money).ok_or(MoneyError::Overflow)
    }
}

impl From<Money> for Decimal {
    fn from(value: Money) -> Self {
        Decimal::new(value.0, DECIMAL_PLACES as u32)
    }
}

impl Serialize for Money {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Money::from_str(&value).map_err(de::Error::custom)
    }
}

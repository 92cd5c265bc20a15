use std::fmt;
use std::ops::{Add, Sub};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::CodecError;

/// A currency amount stored as whole cents.
///
/// Displays and serializes as a two-decimal string (`12.34`) so firmware and
/// admin clients never see floating point.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    pub const fn cents(self) -> i64 {
        self.0
    }

    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// `self - other`, never below zero.
    pub fn saturating_deduct(self, other: Money) -> Money {
        Money((self.0 - other.0).max(0))
    }
}

impl From<i64> for Money {
    fn from(cents: i64) -> Self {
        Money(cents)
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(self.0 + rhs.0)
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Money) -> Money {
        Money(self.0 - rhs.0)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
    }
}

impl FromStr for Money {
    type Err = CodecError;

    /// Accepts `12`, `12.3` and `12.34`, optionally signed. More than two
    /// decimals is rejected rather than silently rounded.
    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let invalid = || CodecError::InvalidAmount(input.to_string());
        let trimmed = input.trim();

        let (negative, digits) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
        };

        let (whole, fraction) = digits.split_once('.').unwrap_or((digits, ""));

        if whole.is_empty() && fraction.is_empty() {
            return Err(invalid());
        }
        if fraction.len() > 2 || !whole.chars().chain(fraction.chars()).all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }

        let whole: i64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| CodecError::AmountOverflow)?
        };
        let fraction: i64 = match fraction.len() {
            0 => 0,
            1 => fraction.parse::<i64>().map_err(|_| invalid())? * 10,
            _ => fraction.parse().map_err(|_| invalid())?,
        };

        let cents = whole
            .checked_mul(100)
            .and_then(|c| c.checked_add(fraction))
            .ok_or(CodecError::AmountOverflow)?;

        Ok(Money(if negative { -cents } else { cents }))
    }
}

impl TryFrom<String> for Money {
    type Error = CodecError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Money> for String {
    fn from(value: Money) -> Self {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_two_decimals() {
        assert_eq!(Money::from_cents(1000).to_string(), "10.00");
        assert_eq!(Money::from_cents(5).to_string(), "0.05");
        assert_eq!(Money::from_cents(-150).to_string(), "-1.50");
    }

    #[test]
    fn test_parse_amounts() {
        assert_eq!("5".parse::<Money>().unwrap(), Money::from_cents(500));
        assert_eq!("1.5".parse::<Money>().unwrap(), Money::from_cents(150));
        assert_eq!(" 0.07 ".parse::<Money>().unwrap(), Money::from_cents(7));
        assert_eq!(".5".parse::<Money>().unwrap(), Money::from_cents(50));
        assert_eq!("-2.25".parse::<Money>().unwrap(), Money::from_cents(-225));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!("".parse::<Money>().is_err());
        assert!(".".parse::<Money>().is_err());
        assert!("1.234".parse::<Money>().is_err());
        assert!("abc".parse::<Money>().is_err());
        assert!("1,5".parse::<Money>().is_err());
        assert_eq!(
            "99999999999999999999".parse::<Money>(),
            Err(CodecError::AmountOverflow)
        );
    }

    #[test]
    fn test_saturating_deduct() {
        let balance = Money::from_cents(300);
        assert_eq!(balance.saturating_deduct(Money::from_cents(500)), Money::ZERO);
        assert_eq!(balance.saturating_deduct(Money::from_cents(100)), Money::from_cents(200));
    }

    #[test]
    fn test_serde_as_string() {
        let json = serde_json::to_string(&Money::from_cents(1250)).unwrap();
        assert_eq!(json, "\"12.50\"");

        let parsed: Money = serde_json::from_str("\"3.10\"").unwrap();
        assert_eq!(parsed, Money::from_cents(310));
    }
}

//! Money type
//!
//! Fixed-scale decimal arithmetic for wallet balances: scale 2, precision 20,
//! banker's rounding. All amounts cross the API boundary as strings and are
//! stored as NUMERIC(20,2); binary floating point never touches a value.
//!
//! Construction is restricted to the audited paths in this module: canonical
//! string parsing, database decimals, and half-even rounding of higher-scale
//! intermediates.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Scale of every committed monetary value.
pub const MONEY_SCALE: u32 = 2;

/// Intermediate computations (interest math) run at this scale before
/// rounding back to [`MONEY_SCALE`].
pub const INTERMEDIATE_SCALE: u32 = 10;

/// Max integer digits: NUMERIC(20,2) leaves 18 before the point.
const MAX_INTEGER_DIGITS: usize = 18;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MoneyError {
    #[error("invalid amount format: {0}")]
    InvalidFormat(String),

    #[error("amount exceeds supported precision")]
    Overflow,
}

/// A monetary value held at scale 2.
///
/// The inner decimal is rescaled to 2 at every construction site, so equality
/// and ordering are plain value comparisons and `Display` always emits the
/// canonical two-decimal form (`"900.00"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Money(Decimal);

impl Money {
    pub const ZERO: Money = Money(Decimal::ZERO);

    /// Parse a canonical amount string: optional sign, integer digits, at
    /// most two fractional digits. Rejects everything else, including
    /// scientific notation, bare dots, `.5`, `5.`, `NaN` and infinities.
    pub fn parse(s: &str) -> Result<Self, MoneyError> {
        let s = s.trim();
        let unsigned = s.strip_prefix('-').unwrap_or(s);
        if unsigned.is_empty() {
            return Err(MoneyError::InvalidFormat("empty string".into()));
        }

        let (whole, frac) = match unsigned.split_once('.') {
            None => (unsigned, ""),
            Some((w, f)) => (w, f),
        };

        if whole.is_empty() || !whole.bytes().all(|b| b.is_ascii_digit()) {
            return Err(MoneyError::InvalidFormat(format!(
                "invalid integer part: {:?}",
                whole
            )));
        }
        if unsigned.contains('.') && (frac.is_empty() || frac.len() > MONEY_SCALE as usize) {
            return Err(MoneyError::InvalidFormat(format!(
                "expected 1 or 2 fractional digits, got {:?}",
                frac
            )));
        }
        if !frac.bytes().all(|b| b.is_ascii_digit()) {
            return Err(MoneyError::InvalidFormat(format!(
                "invalid fractional part: {:?}",
                frac
            )));
        }
        if whole.trim_start_matches('0').len() > MAX_INTEGER_DIGITS {
            return Err(MoneyError::Overflow);
        }

        let mut value =
            Decimal::from_str(s).map_err(|e| MoneyError::InvalidFormat(e.to_string()))?;
        value.rescale(MONEY_SCALE);
        Ok(Self(value))
    }

    /// Round an arbitrary-scale decimal to scale 2 with banker's rounding
    /// (half-even). Used where scale-10 intermediates re-enter money land.
    pub fn round_half_even(value: Decimal) -> Result<Self, MoneyError> {
        let mut rounded =
            value.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointNearestEven);
        if rounded.trunc().abs().to_string().len() > MAX_INTEGER_DIGITS {
            return Err(MoneyError::Overflow);
        }
        rounded.rescale(MONEY_SCALE);
        Ok(Self(rounded))
    }

    /// Rehydrate from a NUMERIC(20,2) column. The database enforces the
    /// scale, so this only normalizes representation.
    pub fn from_db(value: Decimal) -> Self {
        let mut v = value;
        v.rescale(MONEY_SCALE);
        Self(v)
    }

    pub fn checked_add(self, other: Self) -> Option<Self> {
        self.0.checked_add(other.0).map(|mut v| {
            v.rescale(MONEY_SCALE);
            Self(v)
        })
    }

    pub fn checked_sub(self, other: Self) -> Option<Self> {
        self.0.checked_sub(other.0).map(|mut v| {
            v.rescale(MONEY_SCALE);
            Self(v)
        })
    }

    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    pub fn is_negative(&self) -> bool {
        self.0 < Decimal::ZERO
    }

    /// Inner decimal, for SQL binds and interest math.
    pub fn as_decimal(&self) -> Decimal {
        self.0
    }
}

// Money is a string on the wire, so it is a string in the API schema too.
impl utoipa::PartialSchema for Money {
    fn schema() -> utoipa::openapi::RefOr<utoipa::openapi::schema::Schema> {
        String::schema()
    }
}

impl utoipa::ToSchema for Money {}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Money {
    type Err = MoneyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Money::parse(s)
    }
}

impl TryFrom<String> for Money {
    type Error = MoneyError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Money::parse(&s)
    }
}

impl From<Money> for String {
    fn from(m: Money) -> String {
        m.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn parse_canonical_forms() {
        assert_eq!(Money::parse("900.00").unwrap().to_string(), "900.00");
        assert_eq!(Money::parse("900").unwrap().to_string(), "900.00");
        assert_eq!(Money::parse("900.5").unwrap().to_string(), "900.50");
        assert_eq!(Money::parse("0.01").unwrap().to_string(), "0.01");
        assert_eq!(Money::parse("-12.34").unwrap().to_string(), "-12.34");
    }

    #[test]
    fn parse_rejects_invalid_formats() {
        for case in [
            "", " ", ".", ".5", "5.", "1.234", "1,000.00", "1.2.3", "1e2", "0x10", "NaN", "Inf",
            "+1.00", "1. 2", "--1",
        ] {
            assert!(Money::parse(case).is_err(), "should reject {:?}", case);
        }
    }

    #[test]
    fn parse_precision_boundary() {
        // 18 integer digits is the NUMERIC(20,2) ceiling
        assert!(Money::parse("999999999999999999.99").is_ok());
        assert!(matches!(
            Money::parse("9999999999999999999.00"),
            Err(MoneyError::Overflow)
        ));
        // leading zeros don't count against precision
        assert!(Money::parse("000000000000000000001.00").is_ok());
    }

    #[test]
    fn arithmetic_is_exact_at_scale_2() {
        let a = Money::parse("1000.00").unwrap();
        let b = Money::parse("99.99").unwrap();
        assert_eq!(a.checked_sub(b).unwrap().to_string(), "900.01");

        let c = Money::parse("500.00").unwrap();
        assert_eq!(c.checked_add(b).unwrap().to_string(), "599.99");
    }

    #[test]
    fn equality_ignores_input_scale() {
        assert_eq!(Money::parse("900").unwrap(), Money::parse("900.0").unwrap());
        assert_eq!(
            Money::parse("900.0").unwrap(),
            Money::parse("900.00").unwrap()
        );
    }

    #[test]
    fn bankers_rounding_half_even() {
        assert_eq!(
            Money::round_half_even(dec("1.005")).unwrap().to_string(),
            "1.00"
        );
        assert_eq!(
            Money::round_half_even(dec("1.015")).unwrap().to_string(),
            "1.02"
        );
        assert_eq!(
            Money::round_half_even(dec("1.025")).unwrap().to_string(),
            "1.02"
        );
        assert_eq!(
            Money::round_half_even(dec("2.675")).unwrap().to_string(),
            "2.68"
        );
        assert_eq!(
            Money::round_half_even(dec("0.0000000001"))
                .unwrap()
                .to_string(),
            "0.00"
        );
    }

    #[test]
    fn serde_round_trips_as_string() {
        let m = Money::parse("599.99").unwrap();
        let json = serde_json::to_string(&m).unwrap();
        assert_eq!(json, r#""599.99""#);
        let back: Money = serde_json::from_str(&json).unwrap();
        assert_eq!(back, m);

        // numbers are rejected: amounts must arrive as strings
        assert!(serde_json::from_str::<Money>("599.99").is_err());
    }

    #[test]
    fn comparison_and_sign() {
        let small = Money::parse("0.01").unwrap();
        let big = Money::parse("1000000000.00").unwrap();
        assert!(small < big);
        assert!(small.is_positive());
        assert!(!Money::ZERO.is_positive());
        assert!(Money::parse("-0.01").unwrap().is_negative());
    }
}

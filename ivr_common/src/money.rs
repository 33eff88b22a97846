use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, Mul},
    str::FromStr,
};

use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;

use crate::op;

//--------------------------------------       Money         ---------------------------------------------------------
/// A fixed-point currency amount, stored as an integer number of cents.
///
/// Invoice totals and unit prices are declared to two decimal places, so all arithmetic happens on the minor unit and
/// is exact. Use [`Money::from_str`] to parse decimal strings like `"123.45"`.
#[derive(Debug, Clone, Copy, Default, Type, Ord, PartialOrd, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct Money(i64);

op!(binary Money, Add, add);
op!(binary Money, Sub, sub);
op!(inplace Money, AddAssign, add_assign);
op!(inplace Money, SubAssign, sub_assign);
op!(unary Money, Neg, neg);

impl Mul<i64> for Money {
    type Output = Self;

    fn mul(self, rhs: i64) -> Self::Output {
        Self::from(self.value() * rhs)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Value cannot be represented as a currency amount: {0}")]
pub struct MoneyConversionError(String);

impl From<i64> for Money {
    fn from(cents: i64) -> Self {
        Self(cents)
    }
}

impl PartialEq for Money {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for Money {}

impl FromStr for Money {
    type Err = MoneyConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (sign, digits) = match s.strip_prefix('-') {
            Some(rest) => (-1, rest),
            None => (1, s),
        };
        let (whole, frac) = match digits.split_once('.') {
            Some((w, f)) => (w, f),
            None => (digits, ""),
        };
        if frac.len() > 2 {
            return Err(MoneyConversionError(format!("More than 2 decimal places in '{s}'")));
        }
        let whole = if whole.is_empty() { 0 } else {
            whole.parse::<i64>().map_err(|e| MoneyConversionError(format!("Invalid amount '{s}': {e}")))?
        };
        let cents = match frac.len() {
            0 => 0,
            n => {
                // i64::parse would accept a sign here, so "1.-5" must be rejected up front
                if !frac.chars().all(|c| c.is_ascii_digit()) {
                    return Err(MoneyConversionError(format!("Invalid fractional part in '{s}'")));
                }
                let f = frac.parse::<i64>().map_err(|e| MoneyConversionError(format!("Invalid amount '{s}': {e}")))?;
                if n == 1 { f * 10 } else { f }
            },
        };
        Ok(Self(sign * (whole * 100 + cents)))
    }
}

impl Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let cents = self.0.abs();
        write!(f, "{sign}${}.{:02}", cents / 100, cents % 100)
    }
}

impl Money {
    pub fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    pub fn value(&self) -> i64 {
        self.0
    }

    /// The amount as a float number of whole currency units. Only for tolerance arithmetic and display purposes.
    pub fn to_f64(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// The amount as a plain decimal string without a currency symbol, e.g. `"123.45"`. Used on the wire.
    pub fn to_decimal_string(&self) -> String {
        let sign = if self.0 < 0 { "-" } else { "" };
        let cents = self.0.abs();
        format!("{sign}{}.{:02}", cents / 100, cents % 100)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parse_decimal_strings() {
        assert_eq!("123.45".parse::<Money>().unwrap(), Money::from_cents(12345));
        assert_eq!("100".parse::<Money>().unwrap(), Money::from_cents(10000));
        assert_eq!("0.5".parse::<Money>().unwrap(), Money::from_cents(50));
        assert_eq!("-2.07".parse::<Money>().unwrap(), Money::from_cents(-207));
        assert_eq!(".99".parse::<Money>().unwrap(), Money::from_cents(99));
        assert!("1.999".parse::<Money>().is_err());
        assert!("12x.00".parse::<Money>().is_err());
    }

    #[test]
    fn signed_fractional_parts_are_rejected() {
        assert!("1.-5".parse::<Money>().is_err());
        assert!("1.+5".parse::<Money>().is_err());
        assert!("-1.-5".parse::<Money>().is_err());
    }

    #[test]
    fn conversion_errors_compare_by_message() {
        let a = "1.999".parse::<Money>().unwrap_err();
        let b = "1.999".parse::<Money>().unwrap_err();
        assert_eq!(a, b);
        assert_ne!(a, "12x.00".parse::<Money>().unwrap_err());
    }

    #[test]
    fn display_as_dollars() {
        assert_eq!(Money::from_cents(12345).to_string(), "$123.45");
        assert_eq!(Money::from_cents(7).to_string(), "$0.07");
        assert_eq!(Money::from_cents(-207).to_string(), "-$2.07");
    }

    #[test]
    fn decimal_strings_have_no_symbol() {
        assert_eq!(Money::from_cents(12345).to_decimal_string(), "123.45");
        assert_eq!(Money::from_cents(-207).to_decimal_string(), "-2.07");
    }

    #[test]
    fn arithmetic() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(250);
        assert_eq!(a + b, Money::from_cents(1250));
        assert_eq!(a - b, Money::from_cents(750));
        assert_eq!(-b, Money::from_cents(-250));
        assert_eq!(b * 4, Money::from_cents(1000));
        assert_eq!(vec![a, b].into_iter().sum::<Money>(), Money::from_cents(1250));
    }
}

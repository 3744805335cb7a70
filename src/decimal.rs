use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use crate::errors::{BillingError, Result};

/// decimal places every amount is rounded to on construction
pub const DEFAULT_DECIMAL_PRECISION: u32 = 2;

/// settlement currency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Currency {
    #[default]
    #[serde(rename = "IDR")]
    Idr,
}

impl Currency {
    pub fn code(&self) -> &'static str {
        match self {
            Currency::Idr => "IDR",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Currency {
    type Err = BillingError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "IDR" => Ok(Currency::Idr),
            other => Err(BillingError::Validation {
                message: format!("unsupported currency: {other}"),
            }),
        }
    }
}

/// Fixed-point currency amount.
///
/// `value` is the major-unit amount scaled by `10^decimal_precision`. The three fields travel
/// together at rest so a stored amount can be rebuilt without precision loss. Equality and
/// hashing ignore the precision: `100.00` and `100.000` are the same amount.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(try_from = "AmountRecord")]
pub struct Amount {
    value: i64,
    decimal_precision: u32,
    currency: Currency,
}

/// unchecked wire form of [`Amount`]
#[derive(Deserialize)]
struct AmountRecord {
    value: i64,
    decimal_precision: u32,
    currency: Currency,
}

impl TryFrom<AmountRecord> for Amount {
    type Error = BillingError;

    fn try_from(record: AmountRecord) -> Result<Self> {
        Amount::from_parts(record.value, record.decimal_precision, record.currency)
    }
}

impl Amount {
    /// round a float to two places (half away from zero) in the default currency
    pub fn new(value: f64) -> Result<Self> {
        Self::new_in(value, Currency::default())
    }

    pub fn new_in(value: f64, currency: Currency) -> Result<Self> {
        let decimal = Decimal::from_f64(value).ok_or_else(|| BillingError::Validation {
            message: format!("amount {value} is not representable"),
        })?;
        Self::from_decimal(decimal, currency)
    }

    /// round an exact decimal to the default precision
    pub fn from_decimal(decimal: Decimal, currency: Currency) -> Result<Self> {
        let mut rounded = decimal.round_dp_with_strategy(
            DEFAULT_DECIMAL_PRECISION,
            RoundingStrategy::MidpointAwayFromZero,
        );
        rounded.rescale(DEFAULT_DECIMAL_PRECISION);

        let value = i64::try_from(rounded.mantissa()).map_err(|_| BillingError::Calculation {
            message: format!("amount {decimal} overflows fixed-point storage"),
        })?;

        Ok(Self {
            value,
            decimal_precision: DEFAULT_DECIMAL_PRECISION,
            currency,
        })
    }

    /// rebuild an amount from its persisted parts
    pub fn from_parts(value: i64, decimal_precision: u32, currency: Currency) -> Result<Self> {
        if decimal_precision > 18 {
            return Err(BillingError::Validation {
                message: format!("decimal precision {decimal_precision} is out of range"),
            });
        }
        Ok(Self {
            value,
            decimal_precision,
            currency,
        })
    }

    pub fn zero(currency: Currency) -> Self {
        Self {
            value: 0,
            decimal_precision: DEFAULT_DECIMAL_PRECISION,
            currency,
        }
    }

    pub fn value(&self) -> i64 {
        self.value
    }

    pub fn decimal_precision(&self) -> u32 {
        self.decimal_precision
    }

    pub fn currency(&self) -> Currency {
        self.currency
    }

    /// exact decimal view of the amount
    pub fn as_decimal(&self) -> Decimal {
        Decimal::new(self.value, self.decimal_precision)
    }

    pub fn to_f64(&self) -> f64 {
        self.value as f64 / 10_f64.powi(self.decimal_precision as i32)
    }

    pub fn is_zero(&self) -> bool {
        self.value == 0
    }

    pub fn is_positive(&self) -> bool {
        self.value > 0
    }

    /// Compare two amounts on their raw magnitudes after rescaling to a common precision.
    ///
    /// Amounts in different currencies cannot be compared.
    pub fn equal_to(&self, other: &Amount) -> Result<bool> {
        self.ensure_same_currency(other)?;
        let (lhs, rhs) = self.rescaled_pair(other)?;
        Ok(lhs == rhs)
    }

    /// sum in a common currency, keeping the finer of the two precisions
    pub fn checked_add(&self, other: &Amount) -> Result<Amount> {
        self.ensure_same_currency(other)?;
        let (lhs, rhs) = self.rescaled_pair(other)?;
        let sum = lhs.checked_add(rhs).ok_or_else(|| self.overflow())?;
        let value = i64::try_from(sum).map_err(|_| self.overflow())?;

        Ok(Amount {
            value,
            decimal_precision: self.decimal_precision.max(other.decimal_precision),
            currency: self.currency,
        })
    }

    fn ensure_same_currency(&self, other: &Amount) -> Result<()> {
        if self.currency != other.currency {
            return Err(BillingError::CurrencyMismatch {
                left: self.currency,
                right: other.currency,
            });
        }
        Ok(())
    }

    fn rescaled_pair(&self, other: &Amount) -> Result<(i128, i128)> {
        let precision = self.decimal_precision.max(other.decimal_precision);
        let lhs = rescale_value(self.value, precision - self.decimal_precision)
            .ok_or_else(|| self.overflow())?;
        let rhs = rescale_value(other.value, precision - other.decimal_precision)
            .ok_or_else(|| self.overflow())?;
        Ok((lhs, rhs))
    }

    fn overflow(&self) -> BillingError {
        BillingError::Calculation {
            message: "amount arithmetic overflowed".to_string(),
        }
    }
}

fn rescale_value(value: i64, extra_places: u32) -> Option<i128> {
    10_i128
        .checked_pow(extra_places)
        .and_then(|factor| i128::from(value).checked_mul(factor))
}

impl PartialEq for Amount {
    fn eq(&self, other: &Self) -> bool {
        self.currency == other.currency && self.as_decimal() == other.as_decimal()
    }
}

impl Eq for Amount {}

impl Hash for Amount {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.currency.hash(state);
        let canonical = self.as_decimal().normalize();
        canonical.mantissa().hash(state);
        canonical.scale().hash(state);
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_decimal().normalize())
    }
}

/// rate type for interest rates expressed as a fraction (0.1 = 10%)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub struct Rate(Decimal);

impl Rate {
    pub const ZERO: Rate = Rate(Decimal::ZERO);

    pub fn from_decimal(d: Decimal) -> Self {
        Rate(d)
    }

    pub fn from_f64(value: f64) -> Result<Self> {
        Decimal::from_f64(value)
            .map(Rate)
            .ok_or_else(|| BillingError::Validation {
                message: format!("interest rate {value} is not representable"),
            })
    }

    /// create from percentage (e.g., 10 for 10%)
    pub fn from_percentage(p: u32) -> Self {
        Rate(Decimal::from(p) / Decimal::from(100))
    }

    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    pub fn as_percentage(&self) -> Decimal {
        self.0 * Decimal::from(100)
    }

    pub fn to_f64(&self) -> f64 {
        self.0.to_f64().unwrap_or(f64::NAN)
    }

    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.as_percentage().normalize())
    }
}

impl From<Decimal> for Rate {
    fn from(d: Decimal) -> Self {
        Rate::from_decimal(d)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_rounds_to_two_places() {
        let a = Amount::new(100.456).unwrap();
        assert_eq!(a.value(), 10046);
        assert_eq!(a.decimal_precision(), 2);
        assert_eq!(a.currency(), Currency::Idr);

        // exact binary midpoint rounds away from zero
        assert_eq!(Amount::new(0.125).unwrap().value(), 13);
        assert_eq!(Amount::new(-0.125).unwrap().value(), -13);
    }

    #[test]
    fn test_float_round_trip() {
        for x in [0.0, 0.01, 99.99, 100.0, 110_000.0, 5_000_000.0, 123_456.78] {
            let a = Amount::new(x).unwrap();
            assert_eq!(a.to_f64(), x);
            assert_eq!(Amount::new(a.to_f64()).unwrap(), a);
        }
        assert_eq!(Amount::new(12.345_6).unwrap().to_f64(), 12.35);
    }

    #[test]
    fn test_rejects_non_finite() {
        assert!(Amount::new(f64::NAN).is_err());
        assert!(Amount::new(f64::INFINITY).is_err());
    }

    #[test]
    fn test_equality_uses_raw_magnitude() {
        let a = Amount::new(100.0).unwrap();
        let b = Amount::from_parts(100_000, 3, Currency::Idr).unwrap();
        assert!(a.equal_to(&b).unwrap());

        let c = Amount::new(100.01).unwrap();
        assert!(!a.equal_to(&c).unwrap());
        assert!(!a.equal_to(&Amount::new(99.99).unwrap()).unwrap());
    }

    #[test]
    fn test_eq_agrees_with_equal_to_across_precisions() {
        use std::collections::HashSet;

        let a = Amount::new(100.0).unwrap();
        let b = Amount::from_parts(100_000, 3, Currency::Idr).unwrap();
        let c = Amount::from_parts(1_000_001, 4, Currency::Idr).unwrap();

        assert_eq!(a, b);
        assert_eq!(a == b, a.equal_to(&b).unwrap());
        assert_ne!(a, c);
        assert_eq!(a == c, a.equal_to(&c).unwrap());

        // a sum keeps the finer precision but is still the same amount
        let sum = Amount::new(60.0)
            .unwrap()
            .checked_add(&Amount::from_parts(40_000, 3, Currency::Idr).unwrap())
            .unwrap();
        assert_eq!(sum.decimal_precision(), 3);
        assert_eq!(sum, a);

        let set: HashSet<Amount> = [a, b, sum].into_iter().collect();
        assert_eq!(set.len(), 1);

        let restored: Amount =
            serde_json::from_str(r#"{"value": 100000, "decimal_precision": 3, "currency": "IDR"}"#)
                .unwrap();
        assert_eq!(restored, a);
    }

    #[test]
    fn test_display_matches_decoded_value() {
        assert_eq!(Amount::new(110_000.0).unwrap().to_string(), "110000");
        assert_eq!(Amount::new(99.99).unwrap().to_string(), "99.99");
        assert_eq!(Amount::new(100.5).unwrap().to_string(), "100.5");
        assert_eq!(Amount::zero(Currency::Idr).to_string(), "0");
    }

    #[test]
    fn test_checked_add() {
        let a = Amount::new(0.1).unwrap();
        let b = Amount::new(0.2).unwrap();
        let sum = a.checked_add(&b).unwrap();
        assert_eq!(sum.value(), 30);
        assert!(sum.equal_to(&Amount::new(0.3).unwrap()).unwrap());

        let max = Amount::from_parts(i64::MAX, 2, Currency::Idr).unwrap();
        assert!(max.checked_add(&a).is_err());
    }

    #[test]
    fn test_persisted_layout() {
        let a = Amount::new(110_000.0).unwrap();
        let json = serde_json::to_value(a).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"value": 11_000_000, "decimal_precision": 2, "currency": "IDR"})
        );
        let back: Amount = serde_json::from_value(json).unwrap();
        assert_eq!(back, a);

        let bad = serde_json::json!({"value": 1, "decimal_precision": 40, "currency": "IDR"});
        assert!(serde_json::from_value::<Amount>(bad).is_err());
    }

    #[test]
    fn test_from_decimal() {
        let a = Amount::from_decimal(dec!(5500000) / dec!(3), Currency::Idr).unwrap();
        assert_eq!(a.value(), 183_333_333);
        assert_eq!(a.as_decimal(), dec!(1833333.33));
    }

    #[test]
    fn test_rate() {
        let r = Rate::from_f64(0.1).unwrap();
        assert_eq!(r.as_decimal(), dec!(0.1));
        assert_eq!(r.to_string(), "10%");
        assert_eq!(Rate::from_percentage(10), r);
        assert!(r.is_positive());
        assert!(!Rate::ZERO.is_positive());
    }
}

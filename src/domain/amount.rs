//! Amount type
//!
//! Domain primitive for ledger amounts with business rule validation.
//! All amounts are validated at construction time, ensuring invalid values
//! cannot exist in the system.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Maximum allowed amount for a single entry (1_000_000_000_000)
const MAX_AMOUNT: Decimal = Decimal::from_parts(3_567_587_328, 232, 0, false, 0);

/// Maximum decimal places (8)
const MAX_SCALE: u32 = 8;

/// Amount represents the magnitude of a ledger entry.
///
/// Whether it adds to or subtracts from a balance is decided by the
/// entry type, never by the sign of the amount.
///
/// # Invariants
/// - Value is never negative (>= 0)
/// - Maximum 8 decimal places
/// - Maximum value is 1 trillion
///
/// # Example
/// ```
/// use rust_decimal::Decimal;
/// use finance_tracker::domain::Amount;
///
/// let amount: Amount = "10.50".parse().unwrap();
/// assert_eq!(amount.value(), Decimal::new(1050, 2));
/// assert_eq!(amount.to_string(), "10.50");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Amount(Decimal);

/// Errors that can occur when creating an Amount
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AmountError {
    #[error("Amount must not be negative (got {0})")]
    Negative(Decimal),

    #[error("Amount has too many decimal places (max {MAX_SCALE}, got {0})")]
    TooManyDecimals(u32),

    #[error("Amount exceeds maximum allowed value ({MAX_AMOUNT})")]
    Overflow,

    #[error("Invalid amount format: {0}")]
    ParseError(String),
}

impl Amount {
    /// Create a new Amount with validation.
    ///
    /// # Errors
    /// - `AmountError::Negative` if value < 0
    /// - `AmountError::TooManyDecimals` if more than 8 decimal places
    /// - `AmountError::Overflow` if value > 1 trillion
    pub fn new(value: Decimal) -> Result<Self, AmountError> {
        if value < Decimal::ZERO {
            return Err(AmountError::Negative(value));
        }

        if value.scale() > MAX_SCALE {
            return Err(AmountError::TooManyDecimals(value.scale()));
        }

        if value > MAX_AMOUNT {
            return Err(AmountError::Overflow);
        }

        // -0 normalises to 0
        Ok(Self(value.abs()))
    }

    /// Create an Amount from an integer (no decimal places).
    pub fn from_integer(value: i64) -> Result<Self, AmountError> {
        Self::new(Decimal::from(value))
    }

    /// Get the underlying Decimal value.
    pub fn value(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

impl fmt::Display for Amount {
    /// Keeps the scale the amount was recorded with (`10.50`, not `10.5`).
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Amount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let decimal =
            Decimal::from_str(s.trim()).map_err(|e| AmountError::ParseError(e.to_string()))?;
        Amount::new(decimal)
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = AmountError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Amount::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

/// Read a decimal out of loosely typed JSON input.
///
/// Numbers and numeric strings are accepted; anything else (including an
/// empty string) yields `None`.
pub fn decimal_from_json(value: &serde_json::Value) -> Option<Decimal> {
    let text = match value {
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::String(s) => s.trim().to_string(),
        _ => return None,
    };
    if text.is_empty() {
        return None;
    }
    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .ok()
}

/// Parse a ledger amount from JSON input.
pub fn amount_from_json(value: &serde_json::Value) -> Result<Amount, AmountError> {
    let decimal = decimal_from_json(value)
        .ok_or_else(|| AmountError::ParseError(format!("not a number: {value}")))?;
    Amount::new(decimal)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_amount_positive() {
        let amount = Amount::new(Decimal::new(100, 0));
        assert!(amount.is_ok());
        assert_eq!(amount.unwrap().value(), Decimal::new(100, 0));
    }

    #[test]
    fn test_amount_zero_allowed() {
        let amount = Amount::new(Decimal::ZERO).unwrap();
        assert!(amount.is_zero());
    }

    #[test]
    fn test_amount_negative_rejected() {
        let amount = Amount::new(Decimal::new(-100, 0));
        assert!(matches!(amount, Err(AmountError::Negative(_))));
    }

    #[test]
    fn test_amount_too_many_decimals() {
        // 0.123456789 has 9 decimal places
        let amount = Amount::new(Decimal::new(123456789, 9));
        assert!(matches!(amount, Err(AmountError::TooManyDecimals(9))));
    }

    #[test]
    fn test_amount_overflow() {
        let value = Decimal::from_str("1000000000001").unwrap();
        assert!(matches!(Amount::new(value), Err(AmountError::Overflow)));
    }

    #[test]
    fn test_amount_max_value_ok() {
        let value = Decimal::from_str("1000000000000").unwrap();
        assert!(Amount::new(value).is_ok());
    }

    #[test]
    fn test_amount_from_str_keeps_scale() {
        let amount: Amount = "10.50".parse().unwrap();
        assert_eq!(amount.value(), Decimal::new(1050, 2));
        assert_eq!(amount.to_string(), "10.50");
    }

    #[test]
    fn test_amount_from_str_garbage() {
        let amount: Result<Amount, _> = "ten".parse();
        assert!(matches!(amount, Err(AmountError::ParseError(_))));
    }

    #[test]
    fn test_amount_deserializes_number_or_string() {
        let from_number: Amount = serde_json::from_str("50").unwrap();
        let from_string: Amount = serde_json::from_str("\"50.25\"").unwrap();
        assert_eq!(from_number.value(), Decimal::new(50, 0));
        assert_eq!(from_string.value(), Decimal::new(5025, 2));

        let negative: Result<Amount, _> = serde_json::from_str("-1");
        assert!(negative.is_err());
    }

    #[test]
    fn test_decimal_from_json() {
        use serde_json::json;

        assert_eq!(decimal_from_json(&json!(50)), Some(Decimal::new(50, 0)));
        assert_eq!(decimal_from_json(&json!(" 12.5 ")), Some(Decimal::new(125, 1)));
        assert_eq!(decimal_from_json(&json!("")), None);
        assert_eq!(decimal_from_json(&json!("abc")), None);
        assert_eq!(decimal_from_json(&json!(true)), None);
        assert_eq!(decimal_from_json(&json!(null)), None);
    }

    #[test]
    fn test_amount_from_json_rejects_negative() {
        use serde_json::json;

        assert!(amount_from_json(&json!("10.50")).is_ok());
        assert!(matches!(
            amount_from_json(&json!(-3)),
            Err(AmountError::Negative(_))
        ));
        assert!(matches!(
            amount_from_json(&json!("lots")),
            Err(AmountError::ParseError(_))
        ));
    }

    #[test]
    fn test_amount_serializes_as_string() {
        let amount: Amount = "10.50".parse().unwrap();
        assert_eq!(serde_json::to_string(&amount).unwrap(), "\"10.50\"");
    }
}

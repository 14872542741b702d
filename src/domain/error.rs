//! Domain Error Types
//!
//! Pure domain errors that don't depend on infrastructure.

use thiserror::Error;

use super::AmountError;

/// Domain-specific errors
///
/// These errors represent rejected input and domain invariant failures.
/// They are independent of the web/infrastructure layer.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    /// A required field was absent or blank
    #[error("Missing field: {0}")]
    MissingField(&'static str),

    /// Invalid amount (negative, too precise, or exceeds limit)
    #[error("Invalid amount: {0}")]
    InvalidAmount(#[from] AmountError),

    /// Date that is not a valid `YYYY-MM-DD` calendar date
    #[error("Invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),

    /// Unknown entry type
    #[error("Invalid entry type '{0}', expected 'expense' or 'income'")]
    InvalidEntryType(String),

    /// Date window whose start lies after its end
    #[error("Invalid date range: {start} is after {end}")]
    InvalidRange {
        start: chrono::NaiveDate,
        end: chrono::NaiveDate,
    },

    /// Any other rejected value
    #[error("Invalid {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },
}

impl DomainError {
    pub fn invalid_field(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            field,
            reason: reason.into(),
        }
    }
}

/// Reject blank input, returning the trimmed value otherwise.
pub fn require(field: &'static str, value: Option<&str>) -> Result<String, DomainError> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(DomainError::MissingField(field)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn test_missing_field_message() {
        let err = DomainError::MissingField("email");
        assert_eq!(err.to_string(), "Missing field: email");
    }

    #[test]
    fn test_amount_error_converts() {
        let err: DomainError = AmountError::Negative(Decimal::new(-5, 0)).into();
        assert!(matches!(err, DomainError::InvalidAmount(_)));
        assert!(err.to_string().contains("-5"));
    }

    #[test]
    fn test_require_trims_and_rejects_blank() {
        assert_eq!(require("name", Some("  Ada ")).unwrap(), "Ada");
        assert_eq!(
            require("name", Some("   ")),
            Err(DomainError::MissingField("name"))
        );
        assert_eq!(require("name", None), Err(DomainError::MissingField("name")));
    }
}

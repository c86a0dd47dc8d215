//! Structural validation shared by the record types.
//!
//! Validation is performed before a record is persisted or forwarded to a
//! downstream consumer. It checks ranges and required fields only — it does
//! not interpret the physics.

use thiserror::Error;

/// Errors produced by record validation.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is absent or empty.
    #[error("missing or empty field: {0}")]
    MissingField(&'static str),

    /// A numeric field is outside its allowed range.
    #[error("field {field} out of range: {detail}")]
    OutOfRange {
        /// The offending field.
        field: &'static str,
        /// Human-readable description of the violation.
        detail: String,
    },

    /// An email address failed the plausibility check.
    #[error("implausible email address: {0}")]
    InvalidEmail(String),
}

/// Checks that `value` lies within `[min, max]` and is finite.
pub(crate) fn check_range(
    field: &'static str,
    value: f64,
    min: f64,
    max: f64,
) -> Result<(), ValidationError> {
    if !value.is_finite() || value < min || value > max {
        return Err(ValidationError::OutOfRange {
            field,
            detail: format!("{value} not in [{min}, {max}]"),
        });
    }
    Ok(())
}

/// Checks that an optional value, when present, is finite and strictly positive.
pub(crate) fn check_positive(
    field: &'static str,
    value: Option<f64>,
) -> Result<(), ValidationError> {
    if let Some(v) = value {
        if !v.is_finite() || v <= 0.0 {
            return Err(ValidationError::OutOfRange {
                field,
                detail: format!("{v} must be a positive finite number"),
            });
        }
    }
    Ok(())
}

/// Checks that a string field is non-empty after trimming.
pub(crate) fn check_non_empty(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::MissingField(field));
    }
    Ok(())
}

/// Minimal plausibility check for an email address.
///
/// Full RFC 5322 parsing is deliberately out of scope; a local part, an
/// `@`, and a dotted domain are enough to catch the realistic mistakes.
pub(crate) fn check_email(value: &str) -> Result<(), ValidationError> {
    let plausible = match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.')
        }
        None => false,
    };
    if !plausible {
        return Err(ValidationError::InvalidEmail(value.to_string()));
    }
    Ok(())
}

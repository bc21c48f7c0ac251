//! Input validation rules shared by services.
//!
//! # Invariants
//! - Validation never touches storage.
//! - Text limits are measured in Unicode scalar values, not bytes.

use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};

static NICKNAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9_]+$").expect("valid nickname regex"));
static PHONE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^1[3-9]\d{9}$").expect("valid phone regex"));

/// Rejected user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Nickname contains characters outside `[a-zA-Z0-9_]` or is empty.
    InvalidNickname(String),
    /// Phone is not an 11-digit mainland mobile number.
    InvalidPhone(String),
    /// Required text is missing or blank after trim.
    BlankField(&'static str),
    /// Text exceeds the allowed character count.
    TooLong {
        field: &'static str,
        max_chars: usize,
    },
    /// Integer is outside the inclusive allowed range.
    OutOfRange {
        field: &'static str,
        value: i64,
        min: i64,
        max: i64,
    },
    /// Offline help requests must carry an address.
    MissingAddress,
    /// New password and its confirmation differ.
    PasswordMismatch,
    /// Date text is not `YYYY-MM-DD`.
    InvalidDate(String),
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidNickname(value) => write!(
                f,
                "nickname `{value}` may only contain letters, digits and underscores"
            ),
            Self::InvalidPhone(value) => {
                write!(f, "phone `{value}` must be a valid 11-digit mobile number")
            }
            Self::BlankField(field) => write!(f, "{field} must not be blank"),
            Self::TooLong { field, max_chars } => {
                write!(f, "{field} must not exceed {max_chars} characters")
            }
            Self::OutOfRange {
                field,
                value,
                min,
                max,
            } => write!(f, "{field} must be between {min} and {max}, got {value}"),
            Self::MissingAddress => write!(f, "offline requests must include an address"),
            Self::PasswordMismatch => write!(f, "the two new passwords do not match"),
            Self::InvalidDate(value) => write!(f, "date `{value}` must use YYYY-MM-DD"),
        }
    }
}

impl Error for ValidationError {}

pub type ValidationResult<T> = Result<T, ValidationError>;

pub fn validate_nickname(value: &str) -> ValidationResult<()> {
    if NICKNAME_RE.is_match(value) {
        Ok(())
    } else {
        Err(ValidationError::InvalidNickname(value.to_string()))
    }
}

pub fn validate_phone(value: &str) -> ValidationResult<()> {
    if PHONE_RE.is_match(value) {
        Ok(())
    } else {
        Err(ValidationError::InvalidPhone(value.to_string()))
    }
}

/// Returns the trimmed value, rejecting `None` and blank strings.
pub fn require_text<'a>(field: &'static str, value: Option<&'a str>) -> ValidationResult<&'a str> {
    match value.map(str::trim) {
        Some(trimmed) if !trimmed.is_empty() => Ok(trimmed),
        _ => Err(ValidationError::BlankField(field)),
    }
}

pub fn require_max_chars(
    field: &'static str,
    value: &str,
    max_chars: usize,
) -> ValidationResult<()> {
    if value.chars().count() > max_chars {
        return Err(ValidationError::TooLong { field, max_chars });
    }
    Ok(())
}

pub fn require_range(field: &'static str, value: i64, min: i64, max: i64) -> ValidationResult<()> {
    if value < min || value > max {
        return Err(ValidationError::OutOfRange {
            field,
            value,
            min,
            max,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nickname_accepts_word_characters_only() {
        assert!(validate_nickname("helper_01").is_ok());
        assert!(validate_nickname("").is_err());
        assert!(validate_nickname("with space").is_err());
        assert!(validate_nickname("名字").is_err());
    }

    #[test]
    fn phone_requires_mainland_mobile_shape() {
        assert!(validate_phone("13812345678").is_ok());
        assert!(validate_phone("12812345678").is_err());
        assert!(validate_phone("1381234567").is_err());
        assert!(validate_phone("138123456789").is_err());
    }

    #[test]
    fn require_text_trims_and_rejects_blank() {
        assert_eq!(require_text("content", Some("  hi  ")).unwrap(), "hi");
        assert_eq!(
            require_text("content", Some("   ")).unwrap_err(),
            ValidationError::BlankField("content")
        );
        assert!(require_text("content", None).is_err());
    }

    #[test]
    fn max_chars_counts_characters_not_bytes() {
        let text = "反".repeat(200);
        assert!(require_max_chars("content", &text, 200).is_ok());
        let longer = "反".repeat(201);
        assert!(require_max_chars("content", &longer, 200).is_err());
    }
}

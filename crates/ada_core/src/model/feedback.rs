//! User feedback submissions.

use crate::model::user::UserId;
use crate::model::validation::{
    require_max_chars, require_range, require_text, validate_phone, ValidationError,
    ValidationResult,
};
use serde::{Deserialize, Serialize};

pub const FEEDBACK_MAX_CHARS: usize = 200;
pub const FEEDBACK_KIND_MAX: i64 = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Feedback {
    pub id: i64,
    pub user_id: UserId,
    pub name: String,
    pub content: String,
    pub kind: i64,
    pub phone: String,
    pub created_at: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewFeedback {
    pub content: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<i64>,
    pub phone: Option<String>,
    pub name: Option<String>,
}

/// Feedback input after validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidFeedback {
    pub name: String,
    pub content: String,
    pub kind: i64,
    pub phone: String,
}

impl NewFeedback {
    /// Checks content, phone, type and name in that order.
    pub fn validate(&self) -> ValidationResult<ValidFeedback> {
        let content = require_text("content", self.content.as_deref())?;
        require_max_chars("content", content, FEEDBACK_MAX_CHARS)?;

        let phone = self.phone.as_deref().map(str::trim).unwrap_or_default();
        validate_phone(phone)?;

        let kind = self.kind.ok_or(ValidationError::BlankField("type"))?;
        require_range("type", kind, 0, FEEDBACK_KIND_MAX)?;

        let name = require_text("name", self.name.as_deref())?;

        Ok(ValidFeedback {
            name: name.to_string(),
            content: content.to_string(),
            kind,
            phone: phone.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> NewFeedback {
        NewFeedback {
            content: Some("The map page is slow".to_string()),
            kind: Some(2),
            phone: Some("13900001111".to_string()),
            name: Some("Lin".to_string()),
        }
    }

    #[test]
    fn accepts_well_formed_feedback() {
        let checked = valid().validate().unwrap();
        assert_eq!(checked.kind, 2);
        assert_eq!(checked.phone, "13900001111");
    }

    #[test]
    fn rejects_each_invalid_field() {
        let mut input = valid();
        input.content = Some("x".repeat(201));
        assert!(matches!(
            input.validate(),
            Err(ValidationError::TooLong { field: "content", .. })
        ));

        let mut input = valid();
        input.phone = Some("110".to_string());
        assert!(matches!(input.validate(), Err(ValidationError::InvalidPhone(_))));

        let mut input = valid();
        input.kind = Some(4);
        assert!(matches!(
            input.validate(),
            Err(ValidationError::OutOfRange { field: "type", .. })
        ));

        let mut input = valid();
        input.name = None;
        assert_eq!(input.validate(), Err(ValidationError::BlankField("name")));
    }
}

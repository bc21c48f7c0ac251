//! Feedback use-case service.

use crate::clock::{local_date_start_ms, parse_date};
use crate::model::feedback::{Feedback, NewFeedback};
use crate::model::user::UserId;
use crate::model::validation::ValidationError;
use crate::repo::feedback_repo::{FeedbackQuery, FeedbackRepository};
use crate::repo::RepoError;
use crate::service::ErrorKind;
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug)]
pub enum FeedbackError {
    Validation(ValidationError),
    /// Viewer asked for someone else's feedback.
    NotOwner,
    Repo(RepoError),
}

impl FeedbackError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::NotOwner => ErrorKind::Forbidden,
            Self::Repo(_) => ErrorKind::Internal,
        }
    }
}

impl Display for FeedbackError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotOwner => write!(f, "you can only view your own feedback"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for FeedbackError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::NotOwner => None,
        }
    }
}

impl From<ValidationError> for FeedbackError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<RepoError> for FeedbackError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

pub type FeedbackResult<T> = Result<T, FeedbackError>;

/// Optional filters for a feedback listing. Dates are `YYYY-MM-DD`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedbackFilter {
    pub kind: Option<i64>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

pub struct FeedbackService<R: FeedbackRepository> {
    repo: R,
}

impl<R: FeedbackRepository> FeedbackService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn submit(
        &self,
        user_id: UserId,
        input: &NewFeedback,
        now_ms: i64,
    ) -> FeedbackResult<Feedback> {
        let valid = input.validate()?;
        let feedback = self.repo.create_feedback(user_id, &valid, now_ms)?;
        info!(
            "event=feedback_submit module=feedback status=ok feedback_id={} user_id={} kind={}",
            feedback.id, user_id, feedback.kind
        );
        Ok(feedback)
    }

    /// Lists `user_id`'s feedback, newest first.
    ///
    /// The date range covers both end days in full and only applies when
    /// both ends are present.
    pub fn list_for_user(
        &self,
        viewer: UserId,
        user_id: UserId,
        filter: &FeedbackFilter,
    ) -> FeedbackResult<Vec<Feedback>> {
        if viewer != user_id {
            return Err(FeedbackError::NotOwner);
        }

        let (start_ms, end_ms) = match (
            non_blank(filter.start_date.as_deref()),
            non_blank(filter.end_date.as_deref()),
        ) {
            (Some(start), Some(end)) => {
                let start_ms = day_start(start, false)?;
                let end_ms = day_start(end, true)?;
                (Some(start_ms), Some(end_ms))
            }
            _ => (None, None),
        };

        Ok(self.repo.list_feedback(&FeedbackQuery {
            user_id,
            kind: filter.kind,
            start_ms,
            end_ms,
        })?)
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

/// Local midnight of `value`, or of the following day when `next_day`.
fn day_start(value: &str, next_day: bool) -> Result<i64, ValidationError> {
    let invalid = || ValidationError::InvalidDate(value.to_string());
    let mut date = parse_date(value).ok_or_else(invalid)?;
    if next_day {
        date = date.succ_opt().ok_or_else(invalid)?;
    }
    local_date_start_ms(date).ok_or_else(invalid)
}

//! Help-request model and lifecycle.
//!
//! # Responsibility
//! - Define the help-request record and its typed status/mode flags.
//! - Own every legal status transition.
//!
//! # Invariants
//! - `Pending -> Accepted -> AwaitingConfirmation -> Completed` is the only
//!   forward path; `Accepted -> Pending` is the only way back.
//! - `volunteer_id` is set exactly when status is `Accepted` or
//!   `AwaitingConfirmation`; a `Completed` request loses it only when the
//!   volunteer account is deleted.
//! - The reward is credited once, on requester confirmation.

use crate::model::user::UserId;
use crate::model::validation::{require_range, ValidationError, ValidationResult};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RequestId = i64;

/// Points credited to the volunteer when a request is confirmed.
pub const REQUEST_REWARD_POINTS: i64 = 5;
pub const MIN_RATING: i64 = 1;
pub const MAX_RATING: i64 = 5;

/// Resolution state of a help request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "i64", try_from = "i64")]
pub enum RequestStatus {
    /// Published and waiting for a volunteer.
    Pending,
    /// Claimed by a volunteer.
    Accepted,
    /// Volunteer reported completion; requester has not confirmed yet.
    AwaitingConfirmation,
    /// Requester confirmed completion and rated the help.
    Completed,
}

impl RequestStatus {
    pub fn code(self) -> i64 {
        match self {
            Self::Pending => 0,
            Self::Accepted => 1,
            Self::AwaitingConfirmation => 2,
            Self::Completed => 3,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Self::Pending),
            1 => Some(Self::Accepted),
            2 => Some(Self::AwaitingConfirmation),
            3 => Some(Self::Completed),
            _ => None,
        }
    }
}

impl From<RequestStatus> for i64 {
    fn from(value: RequestStatus) -> Self {
        value.code()
    }
}

impl TryFrom<i64> for RequestStatus {
    type Error = String;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::from_code(value).ok_or_else(|| format!("unknown request status `{value}`"))
    }
}

impl Display for RequestStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Accepted => write!(f, "accepted"),
            Self::AwaitingConfirmation => write!(f, "awaiting_confirmation"),
            Self::Completed => write!(f, "completed"),
        }
    }
}

/// Whether help happens in person or remotely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "i64", try_from = "i64")]
pub enum ServiceMode {
    Offline,
    Online,
}

impl ServiceMode {
    pub fn code(self) -> i64 {
        match self {
            Self::Offline => 0,
            Self::Online => 1,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Self::Offline),
            1 => Some(Self::Online),
            _ => None,
        }
    }
}

impl From<ServiceMode> for i64 {
    fn from(value: ServiceMode) -> Self {
        value.code()
    }
}

impl TryFrom<i64> for ServiceMode {
    type Error = String;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::from_code(value).ok_or_else(|| format!("unknown service mode `{value}`"))
    }
}

/// Persisted help request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HelpRequest {
    pub id: RequestId,
    pub requester_id: UserId,
    pub volunteer_id: Option<UserId>,
    /// Epoch milliseconds.
    pub sent_at: i64,
    /// Reward credited to the volunteer on confirmation.
    pub score: i64,
    pub kind: i64,
    pub status: RequestStatus,
    pub content: String,
    pub urgency: i64,
    pub rating: Option<i64>,
    /// Epoch milliseconds of the latest completion step.
    pub solved_at: Option<i64>,
    pub address: Option<String>,
    pub mode: ServiceMode,
}

/// Publish input as received from clients.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewHelpRequest {
    #[serde(default)]
    pub kind: i64,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub urgency: i64,
    pub address: Option<String>,
    /// Raw mode code; must be 0 (offline) or 1 (online).
    pub is_online: Option<i64>,
}

impl NewHelpRequest {
    /// Validates mode/address rules and returns the typed mode.
    pub fn validate(&self) -> ValidationResult<ServiceMode> {
        let code = self.is_online.ok_or(ValidationError::BlankField("isOnline"))?;
        let mode = ServiceMode::from_code(code).ok_or(ValidationError::OutOfRange {
            field: "isOnline",
            value: code,
            min: 0,
            max: 1,
        })?;

        let has_address = self
            .address
            .as_deref()
            .is_some_and(|value| !value.trim().is_empty());
        if mode == ServiceMode::Offline && !has_address {
            return Err(ValidationError::MissingAddress);
        }
        Ok(mode)
    }
}

/// Rejected lifecycle transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleError {
    /// Action is not legal from the current status.
    InvalidTransition {
        action: &'static str,
        from: RequestStatus,
    },
    /// Caller is not the volunteer who accepted the request.
    NotAssignedVolunteer,
    /// Caller is not the requester who published the request.
    NotRequester,
}

impl Display for LifecycleError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidTransition { action, from } => {
                write!(f, "cannot {action} a request that is {from}")
            }
            Self::NotAssignedVolunteer => {
                write!(f, "only the volunteer who accepted this request may do that")
            }
            Self::NotRequester => write!(f, "only the requester of this request may do that"),
        }
    }
}

impl Error for LifecycleError {}

impl HelpRequest {
    /// Claims a pending request for `volunteer`.
    pub fn accept(&mut self, volunteer: UserId) -> Result<(), LifecycleError> {
        self.expect_status("accept", RequestStatus::Pending)?;
        self.volunteer_id = Some(volunteer);
        self.status = RequestStatus::Accepted;
        Ok(())
    }

    /// Volunteer reports the help as done; waits for requester confirmation.
    pub fn mark_done(&mut self, volunteer: UserId, now_ms: i64) -> Result<(), LifecycleError> {
        self.expect_volunteer(volunteer)?;
        self.expect_status("complete", RequestStatus::Accepted)?;
        self.status = RequestStatus::AwaitingConfirmation;
        self.solved_at = Some(now_ms);
        Ok(())
    }

    /// Requester confirms completion.
    ///
    /// Returns the volunteer to credit with `score` points.
    pub fn confirm(
        &mut self,
        requester: UserId,
        rating: i64,
        now_ms: i64,
    ) -> Result<UserId, LifecycleError> {
        if self.requester_id != requester {
            return Err(LifecycleError::NotRequester);
        }
        self.expect_status("confirm", RequestStatus::AwaitingConfirmation)?;
        let volunteer = self.volunteer_id.ok_or(LifecycleError::InvalidTransition {
            action: "confirm",
            from: self.status,
        })?;
        self.status = RequestStatus::Completed;
        self.rating = Some(rating);
        self.solved_at = Some(now_ms);
        Ok(volunteer)
    }

    /// Volunteer gives an accepted request back to the pending pool.
    pub fn release(&mut self, volunteer: UserId) -> Result<(), LifecycleError> {
        self.expect_volunteer(volunteer)?;
        self.expect_status("cancel", RequestStatus::Accepted)?;
        self.volunteer_id = None;
        self.status = RequestStatus::Pending;
        self.solved_at = None;
        Ok(())
    }

    fn expect_status(
        &self,
        action: &'static str,
        expected: RequestStatus,
    ) -> Result<(), LifecycleError> {
        if self.status != expected {
            return Err(LifecycleError::InvalidTransition {
                action,
                from: self.status,
            });
        }
        Ok(())
    }

    fn expect_volunteer(&self, volunteer: UserId) -> Result<(), LifecycleError> {
        if self.volunteer_id != Some(volunteer) {
            return Err(LifecycleError::NotAssignedVolunteer);
        }
        Ok(())
    }
}

pub fn validate_rating(rating: i64) -> ValidationResult<()> {
    require_range("rating", rating, MIN_RATING, MAX_RATING)
}

/// Request list row enriched with participant names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestView {
    pub request: HelpRequest,
    pub requester_name: String,
    pub volunteer_name: Option<String>,
}

//! Help-request use-case service.
//!
//! # Responsibility
//! - Check caller role and ownership for each lifecycle step.
//! - Persist transitions owned by [`HelpRequest`].
//! - Credit volunteers on requester confirmation.
//!
//! # Invariants
//! - Each transition re-reads the request inside an IMMEDIATE transaction,
//!   so two concurrent accepts cannot both succeed.
//! - The volunteer balance moves in the same transaction as the status
//!   change to `Completed`.

use crate::model::request::{
    validate_rating, HelpRequest, LifecycleError, NewHelpRequest, RequestId, RequestStatus,
    RequestView, ServiceMode, REQUEST_REWARD_POINTS,
};
use crate::model::user::{User, UserId};
use crate::model::validation::ValidationError;
use crate::repo::request_repo::{RequestListQuery, RequestRepository, SqliteRequestRepository};
use crate::repo::user_repo::{SqliteUserRepository, UserRepository};
use crate::repo::RepoError;
use crate::service::{begin_immediate, ErrorKind};
use log::info;
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Lowest `queryType` value that disables the status filter.
pub const QUERY_ALL_STATUSES: i64 = 3;

#[derive(Debug)]
pub enum RequestError {
    Validation(ValidationError),
    /// Caller has the wrong account type for this action.
    WrongRole(&'static str),
    Lifecycle(LifecycleError),
    RequestNotFound(RequestId),
    UserNotFound(UserId),
    Repo(RepoError),
}

impl RequestError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::WrongRole(_) => ErrorKind::Forbidden,
            Self::Lifecycle(LifecycleError::InvalidTransition { .. }) => ErrorKind::Conflict,
            Self::Lifecycle(_) => ErrorKind::Forbidden,
            Self::RequestNotFound(_) | Self::UserNotFound(_) => ErrorKind::NotFound,
            Self::Repo(_) => ErrorKind::Internal,
        }
    }
}

impl Display for RequestError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::WrongRole(role) => write!(f, "only {role} accounts may do that"),
            Self::Lifecycle(err) => write!(f, "{err}"),
            Self::RequestNotFound(id) => write!(f, "help request not found: {id}"),
            Self::UserNotFound(id) => write!(f, "user not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for RequestError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Lifecycle(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for RequestError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<LifecycleError> for RequestError {
    fn from(value: LifecycleError) -> Self {
        Self::Lifecycle(value)
    }
}

impl From<RepoError> for RequestError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound {
                entity: "help request",
                id,
            } => Self::RequestNotFound(id),
            RepoError::NotFound { entity: "user", id } => Self::UserNotFound(id),
            other => Self::Repo(other),
        }
    }
}

impl From<rusqlite::Error> for RequestError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Repo(value.into())
    }
}

pub type RequestResult<T> = Result<T, RequestError>;

/// Raw list filters as received from clients.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RequestListFilter {
    /// Only requests this user published or accepted.
    pub participant: Option<UserId>,
    /// Status code. `None` or anything from [`QUERY_ALL_STATUSES`] up lists
    /// every status; other unknown codes match nothing.
    pub query_type: Option<i64>,
    /// Mode code; values other than 0/1 are ignored.
    pub is_online: Option<i64>,
}

impl RequestListFilter {
    fn to_query(self) -> RequestListQuery {
        let statuses = match self.query_type {
            None => None,
            Some(code) if code >= QUERY_ALL_STATUSES => None,
            Some(code) => Some(RequestStatus::from_code(code).into_iter().collect()),
        };
        RequestListQuery {
            participant: self.participant,
            volunteer: None,
            statuses,
            mode: self.is_online.and_then(ServiceMode::from_code),
        }
    }
}

pub struct RequestService<'conn> {
    conn: &'conn Connection,
}

impl<'conn> RequestService<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// Publishes a new pending request on behalf of a requester.
    pub fn publish(
        &self,
        requester: &User,
        input: &NewHelpRequest,
        now_ms: i64,
    ) -> RequestResult<HelpRequest> {
        if !requester.is_requester() {
            return Err(RequestError::WrongRole("requester"));
        }
        let mode = input.validate()?;

        let mut request = HelpRequest {
            id: 0,
            requester_id: requester.id,
            volunteer_id: None,
            sent_at: now_ms,
            score: REQUEST_REWARD_POINTS,
            kind: input.kind,
            status: RequestStatus::Pending,
            content: input.content.clone(),
            urgency: input.urgency,
            rating: None,
            solved_at: None,
            address: input
                .address
                .as_deref()
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(str::to_string),
            mode,
        };
        request.id = SqliteRequestRepository::new(self.conn).create_request(&request)?;

        info!(
            "event=request_publish module=request status=ok request_id={} requester_id={} mode={}",
            request.id,
            requester.id,
            mode.code()
        );
        Ok(request)
    }

    /// Claims a pending request for a volunteer.
    pub fn accept(&self, volunteer: &User, request_id: RequestId) -> RequestResult<HelpRequest> {
        if !volunteer.is_volunteer() {
            return Err(RequestError::WrongRole("volunteer"));
        }
        self.transition(request_id, "accept", |request| request.accept(volunteer.id))
    }

    /// Volunteer marks an accepted request as done.
    pub fn volunteer_complete(
        &self,
        volunteer: &User,
        request_id: RequestId,
        now_ms: i64,
    ) -> RequestResult<HelpRequest> {
        if !volunteer.is_volunteer() {
            return Err(RequestError::WrongRole("volunteer"));
        }
        self.transition(request_id, "complete", |request| {
            request.mark_done(volunteer.id, now_ms)
        })
    }

    /// Volunteer hands an accepted request back to the pending pool.
    pub fn cancel(&self, volunteer: &User, request_id: RequestId) -> RequestResult<HelpRequest> {
        self.transition(request_id, "cancel", |request| request.release(volunteer.id))
    }

    /// Requester confirms completion, rates the help and pays the volunteer.
    pub fn confirm(
        &self,
        requester: &User,
        request_id: RequestId,
        rating: i64,
        now_ms: i64,
    ) -> RequestResult<HelpRequest> {
        if !requester.is_requester() {
            return Err(RequestError::WrongRole("requester"));
        }
        validate_rating(rating)?;

        let tx = begin_immediate(self.conn)?;
        let requests = SqliteRequestRepository::new(&tx);
        let mut request = requests
            .get_request(request_id)?
            .ok_or(RequestError::RequestNotFound(request_id))?;
        let volunteer = request.confirm(requester.id, rating, now_ms)?;
        requests.update_request(&request)?;

        let balance = SqliteUserRepository::new(&tx)
            .adjust_score(volunteer, request.score)?
            .ok_or(RequestError::UserNotFound(volunteer))?;
        tx.commit()?;

        info!(
            "event=request_confirm module=request status=ok request_id={} volunteer_id={} credited={} balance={}",
            request.id, volunteer, request.score, balance
        );
        Ok(request)
    }

    fn transition<F>(
        &self,
        request_id: RequestId,
        action: &'static str,
        apply: F,
    ) -> RequestResult<HelpRequest>
    where
        F: FnOnce(&mut HelpRequest) -> Result<(), LifecycleError>,
    {
        let tx = begin_immediate(self.conn)?;
        let requests = SqliteRequestRepository::new(&tx);
        let mut request = requests
            .get_request(request_id)?
            .ok_or(RequestError::RequestNotFound(request_id))?;
        apply(&mut request)?;
        requests.update_request(&request)?;
        tx.commit()?;

        info!(
            "event=request_{} module=request status=ok request_id={} new_status={}",
            action, request.id, request.status
        );
        Ok(request)
    }

    /// Lists requests with participant names, newest first.
    pub fn list(&self, filter: RequestListFilter) -> RequestResult<Vec<RequestView>> {
        Ok(SqliteRequestRepository::new(self.conn).list_requests(&filter.to_query())?)
    }

    /// Every request the volunteer has accepted, in any later status.
    pub fn volunteer_records(&self, volunteer: &User) -> RequestResult<Vec<RequestView>> {
        if !volunteer.is_volunteer() {
            return Err(RequestError::WrongRole("volunteer"));
        }
        let query = RequestListQuery {
            volunteer: Some(volunteer.id),
            ..RequestListQuery::default()
        };
        Ok(SqliteRequestRepository::new(self.conn).list_requests(&query)?)
    }

    /// Requests the volunteer still has in hand.
    pub fn volunteer_accepted(&self, volunteer: &User) -> RequestResult<Vec<RequestView>> {
        if !volunteer.is_volunteer() {
            return Err(RequestError::WrongRole("volunteer"));
        }
        let query = RequestListQuery {
            volunteer: Some(volunteer.id),
            statuses: Some(vec![
                RequestStatus::Accepted,
                RequestStatus::AwaitingConfirmation,
            ]),
            ..RequestListQuery::default()
        };
        Ok(SqliteRequestRepository::new(self.conn).list_requests(&query)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_statuses_sentinel_and_unknown_mode_disable_filters() {
        let query = RequestListFilter {
            participant: Some(4),
            query_type: Some(QUERY_ALL_STATUSES),
            is_online: Some(7),
        }
        .to_query();
        assert_eq!(query.statuses, None);
        assert_eq!(query.mode, None);
        assert_eq!(query.participant, Some(4));

        let above = RequestListFilter {
            query_type: Some(9),
            ..RequestListFilter::default()
        }
        .to_query();
        assert_eq!(above.statuses, None);
    }

    #[test]
    fn unknown_low_status_code_matches_nothing() {
        let query = RequestListFilter {
            query_type: Some(-1),
            ..RequestListFilter::default()
        }
        .to_query();
        assert_eq!(query.statuses, Some(Vec::new()));
    }

    #[test]
    fn status_and_mode_codes_become_filters() {
        let query = RequestListFilter {
            participant: None,
            query_type: Some(1),
            is_online: Some(0),
        }
        .to_query();
        assert_eq!(query.statuses, Some(vec![RequestStatus::Accepted]));
        assert_eq!(query.mode, Some(ServiceMode::Offline));
    }
}

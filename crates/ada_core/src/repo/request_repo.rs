//! Help-request repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist help requests and their lifecycle fields.
//! - Serve filtered request lists joined with participant names.
//!
//! # Invariants
//! - Lists are ordered by `sent_at DESC, id DESC`.
//! - Status and mode codes are validated on read.

use crate::model::request::{HelpRequest, RequestId, RequestStatus, RequestView, ServiceMode};
use crate::model::user::UserId;
use crate::repo::{expect_changed, RepoError, RepoResult};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};

const REQUEST_COLUMNS: &str = "r.id AS id,
    r.requester_id AS requester_id,
    r.volunteer_id AS volunteer_id,
    r.sent_at AS sent_at,
    r.score AS score,
    r.kind AS kind,
    r.status AS status,
    r.content AS content,
    r.urgency AS urgency,
    r.rating AS rating,
    r.solved_at AS solved_at,
    r.address AS address,
    r.is_online AS is_online";

/// Filter for request lists.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestListQuery {
    /// Matches requests where the user is requester or volunteer.
    pub participant: Option<UserId>,
    /// Matches requests where the user is the volunteer.
    pub volunteer: Option<UserId>,
    /// `None` means any status; an empty list matches nothing.
    pub statuses: Option<Vec<RequestStatus>>,
    pub mode: Option<ServiceMode>,
}

pub trait RequestRepository {
    /// Inserts `request` (its `id` is ignored) and returns the new id.
    fn create_request(&self, request: &HelpRequest) -> RepoResult<RequestId>;
    fn get_request(&self, id: RequestId) -> RepoResult<Option<HelpRequest>>;
    /// Persists lifecycle fields: volunteer, status, rating, solved time.
    fn update_request(&self, request: &HelpRequest) -> RepoResult<()>;
    fn list_requests(&self, query: &RequestListQuery) -> RepoResult<Vec<RequestView>>;
    /// Puts every open request held by `volunteer` back to `Pending`.
    /// Returns how many were released.
    fn release_volunteer(&self, volunteer: UserId) -> RepoResult<usize>;
}

pub struct SqliteRequestRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteRequestRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl RequestRepository for SqliteRequestRepository<'_> {
    fn create_request(&self, request: &HelpRequest) -> RepoResult<RequestId> {
        self.conn.execute(
            "INSERT INTO help_requests (
                requester_id,
                volunteer_id,
                sent_at,
                score,
                kind,
                status,
                content,
                urgency,
                rating,
                solved_at,
                address,
                is_online
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12);",
            params![
                request.requester_id,
                request.volunteer_id,
                request.sent_at,
                request.score,
                request.kind,
                request.status.code(),
                request.content.as_str(),
                request.urgency,
                request.rating,
                request.solved_at,
                request.address.as_deref(),
                request.mode.code(),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get_request(&self, id: RequestId) -> RepoResult<Option<HelpRequest>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {REQUEST_COLUMNS} FROM help_requests r WHERE r.id = ?1;"
        ))?;
        let mut rows = stmt.query([id])?;
        match rows.next()? {
            Some(row) => Ok(Some(parse_request_row(row)?)),
            None => Ok(None),
        }
    }

    fn update_request(&self, request: &HelpRequest) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE help_requests
             SET
                volunteer_id = ?2,
                status = ?3,
                rating = ?4,
                solved_at = ?5
             WHERE id = ?1;",
            params![
                request.id,
                request.volunteer_id,
                request.status.code(),
                request.rating,
                request.solved_at,
            ],
        )?;
        expect_changed(changed, "help request", request.id)
    }

    fn list_requests(&self, query: &RequestListQuery) -> RepoResult<Vec<RequestView>> {
        let mut sql = format!(
            "SELECT
                {REQUEST_COLUMNS},
                COALESCE(requester.name, '') AS requester_name,
                volunteer.name AS volunteer_name
             FROM help_requests r
             LEFT JOIN users requester ON requester.id = r.requester_id
             LEFT JOIN users volunteer ON volunteer.id = r.volunteer_id
             WHERE 1 = 1"
        );
        let mut bind_values = Vec::<Value>::new();

        if let Some(user) = query.participant {
            sql.push_str(" AND (r.requester_id = ? OR r.volunteer_id = ?)");
            bind_values.push(Value::Integer(user));
            bind_values.push(Value::Integer(user));
        }
        if let Some(user) = query.volunteer {
            sql.push_str(" AND r.volunteer_id = ?");
            bind_values.push(Value::Integer(user));
        }
        match query.statuses.as_deref() {
            None => {}
            Some([]) => sql.push_str(" AND 0 = 1"),
            Some(statuses) => {
                let placeholders = vec!["?"; statuses.len()].join(", ");
                sql.push_str(&format!(" AND r.status IN ({placeholders})"));
                bind_values.extend(statuses.iter().map(|status| Value::Integer(status.code())));
            }
        }
        if let Some(mode) = query.mode {
            sql.push_str(" AND r.is_online = ?");
            bind_values.push(Value::Integer(mode.code()));
        }
        sql.push_str(" ORDER BY r.sent_at DESC, r.id DESC;");

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values.iter()))?;
        let mut views = Vec::new();
        while let Some(row) = rows.next()? {
            views.push(RequestView {
                request: parse_request_row(row)?,
                requester_name: row.get("requester_name")?,
                volunteer_name: row.get("volunteer_name")?,
            });
        }
        Ok(views)
    }

    fn release_volunteer(&self, volunteer: UserId) -> RepoResult<usize> {
        Ok(self.conn.execute(
            "UPDATE help_requests
             SET
                volunteer_id = NULL,
                status = ?2,
                solved_at = NULL
             WHERE volunteer_id = ?1 AND status IN (?3, ?4);",
            params![
                volunteer,
                RequestStatus::Pending.code(),
                RequestStatus::Accepted.code(),
                RequestStatus::AwaitingConfirmation.code(),
            ],
        )?)
    }
}

fn parse_request_row(row: &Row<'_>) -> RepoResult<HelpRequest> {
    let status_code: i64 = row.get("status")?;
    let status = RequestStatus::from_code(status_code).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid status `{status_code}` in help_requests.status"
        ))
    })?;
    let mode_code: i64 = row.get("is_online")?;
    let mode = ServiceMode::from_code(mode_code).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid mode `{mode_code}` in help_requests.is_online"
        ))
    })?;

    Ok(HelpRequest {
        id: row.get("id")?,
        requester_id: row.get("requester_id")?,
        volunteer_id: row.get("volunteer_id")?,
        sent_at: row.get("sent_at")?,
        score: row.get("score")?,
        kind: row.get("kind")?,
        status,
        content: row.get("content")?,
        urgency: row.get("urgency")?,
        rating: row.get("rating")?,
        solved_at: row.get("solved_at")?,
        address: row.get("address")?,
        mode,
    })
}

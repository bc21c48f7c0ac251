//! Feedback persistence.

use crate::model::feedback::{Feedback, ValidFeedback};
use crate::model::user::UserId;
use crate::repo::RepoResult;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};

/// Filter for one user's feedback. Bounds are epoch ms, `start` inclusive
/// and `end` exclusive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedbackQuery {
    pub user_id: UserId,
    pub kind: Option<i64>,
    pub start_ms: Option<i64>,
    pub end_ms: Option<i64>,
}

pub trait FeedbackRepository {
    fn create_feedback(
        &self,
        user_id: UserId,
        input: &ValidFeedback,
        now_ms: i64,
    ) -> RepoResult<Feedback>;
    /// Matching feedback, newest first.
    fn list_feedback(&self, query: &FeedbackQuery) -> RepoResult<Vec<Feedback>>;
}

pub struct SqliteFeedbackRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteFeedbackRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl FeedbackRepository for SqliteFeedbackRepository<'_> {
    fn create_feedback(
        &self,
        user_id: UserId,
        input: &ValidFeedback,
        now_ms: i64,
    ) -> RepoResult<Feedback> {
        self.conn.execute(
            "INSERT INTO feedback (user_id, name, content, kind, phone, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                user_id,
                input.name.as_str(),
                input.content.as_str(),
                input.kind,
                input.phone.as_str(),
                now_ms,
            ],
        )?;
        Ok(Feedback {
            id: self.conn.last_insert_rowid(),
            user_id,
            name: input.name.clone(),
            content: input.content.clone(),
            kind: input.kind,
            phone: input.phone.clone(),
            created_at: now_ms,
        })
    }

    fn list_feedback(&self, query: &FeedbackQuery) -> RepoResult<Vec<Feedback>> {
        let mut sql = String::from(
            "SELECT id, user_id, name, content, kind, phone, created_at
             FROM feedback
             WHERE user_id = ?",
        );
        let mut bind_values = vec![Value::Integer(query.user_id)];

        if let Some(kind) = query.kind {
            sql.push_str(" AND kind = ?");
            bind_values.push(Value::Integer(kind));
        }
        if let Some(start) = query.start_ms {
            sql.push_str(" AND created_at >= ?");
            bind_values.push(Value::Integer(start));
        }
        if let Some(end) = query.end_ms {
            sql.push_str(" AND created_at < ?");
            bind_values.push(Value::Integer(end));
        }
        sql.push_str(" ORDER BY created_at DESC, id DESC;");

        let mut stmt = self.conn.prepare(&sql)?;
        let records = stmt
            .query_map(params_from_iter(bind_values.iter()), parse_feedback_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }
}

fn parse_feedback_row(row: &Row<'_>) -> rusqlite::Result<Feedback> {
    Ok(Feedback {
        id: row.get("id")?,
        user_id: row.get("user_id")?,
        name: row.get("name")?,
        content: row.get("content")?,
        kind: row.get("kind")?,
        phone: row.get("phone")?,
        created_at: row.get("created_at")?,
    })
}

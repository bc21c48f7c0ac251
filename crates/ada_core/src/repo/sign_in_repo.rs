//! Daily sign-in record persistence.

use crate::model::page::{Page, PageRequest};
use crate::model::sign_in::SignInRecord;
use crate::model::user::UserId;
use crate::repo::RepoResult;
use rusqlite::{params, Connection, OptionalExtension, Row};

pub trait SignInRepository {
    fn insert_sign_in(&self, user_id: UserId, signed_at: i64, points: i64)
        -> RepoResult<SignInRecord>;
    /// Latest record of `user_id` at or after `since_ms`.
    fn latest_since(&self, user_id: UserId, since_ms: i64) -> RepoResult<Option<SignInRecord>>;
    /// Records of `user_id`, newest first.
    fn list_sign_ins(&self, user_id: UserId, page: PageRequest) -> RepoResult<Page<SignInRecord>>;
    /// Up to `limit` sign-in timestamps of `user_id`, newest first.
    fn recent_timestamps(&self, user_id: UserId, limit: u32) -> RepoResult<Vec<i64>>;
}

pub struct SqliteSignInRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteSignInRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl SignInRepository for SqliteSignInRepository<'_> {
    fn insert_sign_in(
        &self,
        user_id: UserId,
        signed_at: i64,
        points: i64,
    ) -> RepoResult<SignInRecord> {
        self.conn.execute(
            "INSERT INTO sign_ins (user_id, signed_at, points) VALUES (?1, ?2, ?3);",
            params![user_id, signed_at, points],
        )?;
        Ok(SignInRecord {
            id: self.conn.last_insert_rowid(),
            user_id,
            signed_at,
            points,
        })
    }

    fn latest_since(&self, user_id: UserId, since_ms: i64) -> RepoResult<Option<SignInRecord>> {
        let record = self
            .conn
            .query_row(
                "SELECT id, user_id, signed_at, points
                 FROM sign_ins
                 WHERE user_id = ?1 AND signed_at >= ?2
                 ORDER BY signed_at DESC, id DESC
                 LIMIT 1;",
                params![user_id, since_ms],
                parse_sign_in_row,
            )
            .optional()?;
        Ok(record)
    }

    fn list_sign_ins(&self, user_id: UserId, page: PageRequest) -> RepoResult<Page<SignInRecord>> {
        let total: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM sign_ins WHERE user_id = ?1;",
            [user_id],
            |row| row.get(0),
        )?;
        let mut stmt = self.conn.prepare(
            "SELECT id, user_id, signed_at, points
             FROM sign_ins
             WHERE user_id = ?1
             ORDER BY signed_at DESC, id DESC
             LIMIT ?2 OFFSET ?3;",
        )?;
        let records = stmt
            .query_map(
                params![user_id, page.limit(), page.offset()],
                parse_sign_in_row,
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Page::new(records, total, page))
    }

    fn recent_timestamps(&self, user_id: UserId, limit: u32) -> RepoResult<Vec<i64>> {
        let mut stmt = self.conn.prepare(
            "SELECT signed_at FROM sign_ins
             WHERE user_id = ?1
             ORDER BY signed_at DESC, id DESC
             LIMIT ?2;",
        )?;
        let timestamps = stmt
            .query_map(params![user_id, i64::from(limit)], |row| row.get(0))?
            .collect::<Result<Vec<i64>, _>>()?;
        Ok(timestamps)
    }
}

fn parse_sign_in_row(row: &Row<'_>) -> rusqlite::Result<SignInRecord> {
    Ok(SignInRecord {
        id: row.get("id")?,
        user_id: row.get("user_id")?,
        signed_at: row.get("signed_at")?,
        points: row.get("points")?,
    })
}

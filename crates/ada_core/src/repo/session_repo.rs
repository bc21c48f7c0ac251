//! Login sessions and one-time login codes.
//!
//! # Invariants
//! - A session resolves only while `now < expires_at`.
//! - A login code is consumed by the first successful match.

use crate::model::user::UserId;
use crate::repo::RepoResult;
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

pub trait SessionRepository {
    /// Creates a session and returns its opaque token.
    fn create_session(&self, user_id: UserId, now_ms: i64, ttl_ms: i64) -> RepoResult<String>;
    /// Returns the session owner if the token exists and has not expired.
    fn resolve_session(&self, token: &str, now_ms: i64) -> RepoResult<Option<UserId>>;
    fn revoke_session(&self, token: &str) -> RepoResult<bool>;
    /// Revokes every session of `user_id`; returns how many were removed.
    fn revoke_user_sessions(&self, user_id: UserId) -> RepoResult<usize>;
    fn purge_expired(&self, now_ms: i64) -> RepoResult<usize>;
    /// Stores `code` for `phone`, replacing any previous code.
    fn store_login_code(&self, phone: &str, code: &str, expires_at: i64) -> RepoResult<()>;
    /// Consumes the code when it matches and is still valid.
    fn take_login_code(&self, phone: &str, code: &str, now_ms: i64) -> RepoResult<bool>;
}

pub struct SqliteSessionRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteSessionRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl SessionRepository for SqliteSessionRepository<'_> {
    fn create_session(&self, user_id: UserId, now_ms: i64, ttl_ms: i64) -> RepoResult<String> {
        let token = Uuid::new_v4().simple().to_string();
        self.conn.execute(
            "INSERT INTO sessions (token, user_id, created_at, expires_at)
             VALUES (?1, ?2, ?3, ?4);",
            params![token.as_str(), user_id, now_ms, now_ms.saturating_add(ttl_ms)],
        )?;
        Ok(token)
    }

    fn resolve_session(&self, token: &str, now_ms: i64) -> RepoResult<Option<UserId>> {
        let user_id = self
            .conn
            .query_row(
                "SELECT user_id FROM sessions WHERE token = ?1 AND expires_at > ?2;",
                params![token, now_ms],
                |row| row.get(0),
            )
            .optional()?;
        Ok(user_id)
    }

    fn revoke_session(&self, token: &str) -> RepoResult<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM sessions WHERE token = ?1;", [token])?;
        Ok(changed > 0)
    }

    fn revoke_user_sessions(&self, user_id: UserId) -> RepoResult<usize> {
        Ok(self
            .conn
            .execute("DELETE FROM sessions WHERE user_id = ?1;", [user_id])?)
    }

    fn purge_expired(&self, now_ms: i64) -> RepoResult<usize> {
        let sessions = self
            .conn
            .execute("DELETE FROM sessions WHERE expires_at <= ?1;", [now_ms])?;
        let codes = self
            .conn
            .execute("DELETE FROM login_codes WHERE expires_at <= ?1;", [now_ms])?;
        Ok(sessions + codes)
    }

    fn store_login_code(&self, phone: &str, code: &str, expires_at: i64) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO login_codes (phone, code, expires_at)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(phone) DO UPDATE SET
                code = excluded.code,
                expires_at = excluded.expires_at;",
            params![phone, code, expires_at],
        )?;
        Ok(())
    }

    fn take_login_code(&self, phone: &str, code: &str, now_ms: i64) -> RepoResult<bool> {
        let changed = self.conn.execute(
            "DELETE FROM login_codes WHERE phone = ?1 AND code = ?2 AND expires_at > ?3;",
            params![phone, code, now_ms],
        )?;
        Ok(changed > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_db_in_memory;

    fn seed_user(conn: &Connection) -> UserId {
        conn.execute(
            "INSERT INTO users (name, password_hash, phone, user_type)
             VALUES ('amy', 'x', '13800000000', 0);",
            [],
        )
        .unwrap();
        conn.last_insert_rowid()
    }

    #[test]
    fn session_expires_after_ttl() {
        let conn = open_db_in_memory().unwrap();
        let user = seed_user(&conn);
        let repo = SqliteSessionRepository::new(&conn);

        let token = repo.create_session(user, 1_000, 500).unwrap();
        assert_eq!(repo.resolve_session(&token, 1_499).unwrap(), Some(user));
        assert_eq!(repo.resolve_session(&token, 1_500).unwrap(), None);
    }

    #[test]
    fn login_code_is_single_use() {
        let conn = open_db_in_memory().unwrap();
        let repo = SqliteSessionRepository::new(&conn);

        repo.store_login_code("13800000000", "123456", 10_000).unwrap();
        assert!(!repo.take_login_code("13800000000", "000000", 1).unwrap());
        assert!(repo.take_login_code("13800000000", "123456", 1).unwrap());
        assert!(!repo.take_login_code("13800000000", "123456", 2).unwrap());
    }
}

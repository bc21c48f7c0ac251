//! Account repository contracts and SQLite implementation.
//!
//! # Invariants
//! - `name` and `phone` are unique at the storage level.
//! - `score` never goes negative; `adjust_score` refuses such deltas.

use crate::model::user::{NewUser, ProfilePatch, User, UserId, UserType};
use crate::repo::{expect_changed, RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension, Row};

const USER_SELECT_SQL: &str = "SELECT
    id,
    name,
    password_hash,
    phone,
    user_type,
    score,
    address,
    info,
    label,
    real_name,
    identity_number
FROM users";

/// Repository interface for account CRUD and balance changes.
pub trait UserRepository {
    fn create_user(&self, user: &NewUser) -> RepoResult<UserId>;
    fn get_user(&self, id: UserId) -> RepoResult<Option<User>>;
    fn find_by_phone(&self, phone: &str) -> RepoResult<Option<User>>;
    fn find_by_name(&self, name: &str) -> RepoResult<Option<User>>;
    fn list_users(&self) -> RepoResult<Vec<User>>;
    fn update_password_hash(&self, id: UserId, password_hash: &str) -> RepoResult<()>;
    /// Applies only the `Some` fields of `patch`.
    fn update_profile(&self, id: UserId, patch: &ProfilePatch) -> RepoResult<()>;
    /// Adds `delta` to the balance.
    ///
    /// Returns the new balance, or `None` when the result would be negative
    /// (the balance is left untouched in that case).
    fn adjust_score(&self, id: UserId, delta: i64) -> RepoResult<Option<i64>>;
    fn delete_user(&self, id: UserId) -> RepoResult<()>;
}

/// SQLite-backed account repository.
pub struct SqliteUserRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteUserRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn query_one(&self, filter: &str, value: &dyn rusqlite::ToSql) -> RepoResult<Option<User>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{USER_SELECT_SQL} WHERE {filter} = ?1;"))?;
        let mut rows = stmt.query(params![value])?;
        match rows.next()? {
            Some(row) => Ok(Some(parse_user_row(row)?)),
            None => Ok(None),
        }
    }
}

impl UserRepository for SqliteUserRepository<'_> {
    fn create_user(&self, user: &NewUser) -> RepoResult<UserId> {
        self.conn.execute(
            "INSERT INTO users (name, password_hash, phone, user_type, score)
             VALUES (?1, ?2, ?3, ?4, 0);",
            params![
                user.name.as_str(),
                user.password_hash.as_str(),
                user.phone.as_str(),
                user.user_type.code(),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get_user(&self, id: UserId) -> RepoResult<Option<User>> {
        self.query_one("id", &id)
    }

    fn find_by_phone(&self, phone: &str) -> RepoResult<Option<User>> {
        self.query_one("phone", &phone)
    }

    fn find_by_name(&self, name: &str) -> RepoResult<Option<User>> {
        self.query_one("name", &name)
    }

    fn list_users(&self) -> RepoResult<Vec<User>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{USER_SELECT_SQL} ORDER BY id ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut users = Vec::new();
        while let Some(row) = rows.next()? {
            users.push(parse_user_row(row)?);
        }
        Ok(users)
    }

    fn update_password_hash(&self, id: UserId, password_hash: &str) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE users SET password_hash = ?2 WHERE id = ?1;",
            params![id, password_hash],
        )?;
        expect_changed(changed, "user", id)
    }

    fn update_profile(&self, id: UserId, patch: &ProfilePatch) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE users
             SET
                real_name = COALESCE(?2, real_name),
                identity_number = COALESCE(?3, identity_number),
                address = COALESCE(?4, address),
                info = COALESCE(?5, info),
                label = COALESCE(?6, label)
             WHERE id = ?1;",
            params![
                id,
                patch.real_name.as_deref(),
                patch.identity_number.as_deref(),
                patch.address.as_deref(),
                patch.info.as_deref(),
                patch.label.as_deref(),
            ],
        )?;
        expect_changed(changed, "user", id)
    }

    fn adjust_score(&self, id: UserId, delta: i64) -> RepoResult<Option<i64>> {
        let current: Option<i64> = self
            .conn
            .query_row("SELECT score FROM users WHERE id = ?1;", [id], |row| {
                row.get(0)
            })
            .optional()?;
        let current = current.ok_or(RepoError::NotFound { entity: "user", id })?;

        let next = current + delta;
        if next < 0 {
            return Ok(None);
        }

        self.conn.execute(
            "UPDATE users SET score = ?2 WHERE id = ?1;",
            params![id, next],
        )?;
        Ok(Some(next))
    }

    fn delete_user(&self, id: UserId) -> RepoResult<()> {
        let changed = self.conn.execute("DELETE FROM users WHERE id = ?1;", [id])?;
        expect_changed(changed, "user", id)
    }
}

fn parse_user_row(row: &Row<'_>) -> RepoResult<User> {
    let type_code: i64 = row.get("user_type")?;
    let user_type = UserType::from_code(type_code).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid user type `{type_code}` in users.user_type"))
    })?;

    Ok(User {
        id: row.get("id")?,
        name: row.get("name")?,
        password_hash: row.get("password_hash")?,
        phone: row.get("phone")?,
        user_type,
        score: row.get("score")?,
        address: row.get("address")?,
        info: row.get("info")?,
        label: row.get("label")?,
        real_name: row.get("real_name")?,
        identity_number: row.get("identity_number")?,
    })
}

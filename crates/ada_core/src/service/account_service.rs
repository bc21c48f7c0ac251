//! Account use-case service.
//!
//! # Responsibility
//! - Register users, issue and revoke sessions, manage profiles.
//! - Issue and redeem one-time login codes.
//!
//! # Invariants
//! - Nickname and phone are unique across accounts.
//! - Passwords are only ever persisted as salted hashes.
//! - Returned `User` values never serialize the password hash.

use crate::model::user::{
    hash_password, verify_password, NewUser, ProfilePatch, User, UserId, UserType,
};
use crate::model::validation::{require_text, validate_nickname, validate_phone, ValidationError};
use crate::repo::request_repo::{RequestRepository, SqliteRequestRepository};
use crate::repo::session_repo::{SessionRepository, SqliteSessionRepository};
use crate::repo::user_repo::{SqliteUserRepository, UserRepository};
use crate::repo::RepoError;
use crate::service::{begin_immediate, ErrorKind};
use log::{debug, info, warn};
use rand::Rng;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Default session lifetime: 30 days.
pub const DEFAULT_SESSION_TTL_MS: i64 = 30 * 24 * 60 * 60 * 1000;
/// Login codes stay valid for 5 minutes.
pub const LOGIN_CODE_TTL_MS: i64 = 5 * 60 * 1000;

/// Service error for account use-cases.
#[derive(Debug)]
pub enum AccountError {
    Validation(ValidationError),
    NameTaken(String),
    PhoneTaken(String),
    /// Login by nickname found no account.
    UnknownName(String),
    /// Login by phone found no account.
    UnknownPhone(String),
    WrongPassword,
    /// Code is wrong, expired, or already used.
    InvalidLoginCode,
    /// Token is missing, expired, or revoked.
    NotLoggedIn,
    UserNotFound(UserId),
    Repo(RepoError),
}

impl AccountError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::NameTaken(_) | Self::PhoneTaken(_) => ErrorKind::Conflict,
            Self::UnknownName(_)
            | Self::UnknownPhone(_)
            | Self::WrongPassword
            | Self::InvalidLoginCode
            | Self::NotLoggedIn => ErrorKind::Unauthorized,
            Self::UserNotFound(_) => ErrorKind::NotFound,
            Self::Repo(_) => ErrorKind::Internal,
        }
    }
}

impl Display for AccountError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::NameTaken(name) => write!(f, "nickname `{name}` is already taken"),
            Self::PhoneTaken(_) => write!(f, "phone already registered"),
            Self::UnknownName(_) => write!(f, "user name does not exist"),
            Self::UnknownPhone(_) => write!(f, "phone does not exist"),
            Self::WrongPassword => write!(f, "wrong password"),
            Self::InvalidLoginCode => write!(f, "login code is invalid or expired"),
            Self::NotLoggedIn => write!(f, "not logged in"),
            Self::UserNotFound(id) => write!(f, "user not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for AccountError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for AccountError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<RepoError> for AccountError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound { entity: "user", id } => Self::UserNotFound(id),
            other => Self::Repo(other),
        }
    }
}

impl From<rusqlite::Error> for AccountError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Repo(value.into())
    }
}

pub type AccountResult<T> = Result<T, AccountError>;

/// Registration input as received from clients.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub name: Option<String>,
    pub password: Option<String>,
    pub phone: Option<String>,
    #[serde(rename = "type")]
    pub user_type: Option<i64>,
}

/// Password login input. `login_type` 0 logs in by nickname, anything else
/// by phone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    #[serde(default)]
    pub login_type: i64,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordChange {
    pub old_password: Option<String>,
    pub new_password: Option<String>,
    pub re_new_password: Option<String>,
}

/// Successful login: the account plus its bearer token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoginSession {
    pub user: User,
    pub token: String,
}

/// Account service bound to one connection.
pub struct AccountService<'conn> {
    conn: &'conn Connection,
    session_ttl_ms: i64,
}

impl<'conn> AccountService<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self {
            conn,
            session_ttl_ms: DEFAULT_SESSION_TTL_MS,
        }
    }

    pub fn with_session_ttl_ms(mut self, ttl_ms: i64) -> Self {
        self.session_ttl_ms = ttl_ms;
        self
    }

    fn users(&self) -> SqliteUserRepository<'conn> {
        SqliteUserRepository::new(self.conn)
    }

    fn sessions(&self) -> SqliteSessionRepository<'conn> {
        SqliteSessionRepository::new(self.conn)
    }

    /// Creates an account with a zero balance.
    pub fn register(&self, input: &Registration) -> AccountResult<User> {
        let name = require_text("name", input.name.as_deref())?;
        validate_nickname(name)?;
        let password = input.password.as_deref().unwrap_or_default();
        require_text("password", Some(password))?;
        let phone = require_text("phone", input.phone.as_deref())?;
        validate_phone(phone)?;
        let type_code = input.user_type.ok_or(ValidationError::BlankField("type"))?;
        let user_type = UserType::from_code(type_code).ok_or(ValidationError::OutOfRange {
            field: "type",
            value: type_code,
            min: 0,
            max: 1,
        })?;

        let tx = begin_immediate(self.conn)?;
        let users = SqliteUserRepository::new(&tx);
        if users.find_by_phone(phone)?.is_some() {
            return Err(AccountError::PhoneTaken(phone.to_string()));
        }
        if users.find_by_name(name)?.is_some() {
            return Err(AccountError::NameTaken(name.to_string()));
        }
        let id = users.create_user(&NewUser {
            name: name.to_string(),
            password_hash: hash_password(password),
            phone: phone.to_string(),
            user_type,
        })?;
        let user = users.get_user(id)?.ok_or(AccountError::UserNotFound(id))?;
        tx.commit()?;

        info!(
            "event=user_register module=account status=ok user_id={} user_type={}",
            user.id, user.user_type
        );
        Ok(user)
    }

    /// Verifies a password and opens a session.
    pub fn login(&self, credentials: &Credentials, now_ms: i64) -> AccountResult<LoginSession> {
        let users = self.users();
        let user = if credentials.login_type == 0 {
            let name = require_text("name", credentials.name.as_deref())?;
            validate_nickname(name)?;
            users
                .find_by_name(name)?
                .ok_or_else(|| AccountError::UnknownName(name.to_string()))?
        } else {
            let phone = require_text("phone", credentials.phone.as_deref())?;
            users
                .find_by_phone(phone)?
                .ok_or_else(|| AccountError::UnknownPhone(phone.to_string()))?
        };

        let password = credentials.password.as_deref().unwrap_or_default();
        if !verify_password(&user.password_hash, password) {
            warn!(
                "event=user_login module=account status=error user_id={} reason=wrong_password",
                user.id
            );
            return Err(AccountError::WrongPassword);
        }

        self.open_session(user, now_ms, "password")
    }

    /// Issues a 6-digit login code for `phone`, replacing any earlier one.
    ///
    /// Returns the code; delivery is left to the caller.
    pub fn send_login_code(&self, phone: &str, now_ms: i64) -> AccountResult<String> {
        let phone = phone.trim();
        validate_phone(phone)?;

        let code = format!("{:06}", rand::rng().random_range(0..1_000_000u32));
        let sessions = self.sessions();
        sessions.purge_expired(now_ms)?;
        sessions.store_login_code(phone, &code, now_ms + LOGIN_CODE_TTL_MS)?;

        // No SMS gateway: operators read the code from the log.
        info!(
            "event=login_code_issued module=account status=ok phone={} code={} ttl_ms={}",
            phone, code, LOGIN_CODE_TTL_MS
        );
        Ok(code)
    }

    /// Redeems a login code for an existing account.
    pub fn code_login(&self, phone: &str, code: &str, now_ms: i64) -> AccountResult<LoginSession> {
        let phone = phone.trim();
        validate_phone(phone)?;

        if !self.sessions().take_login_code(phone, code.trim(), now_ms)? {
            return Err(AccountError::InvalidLoginCode);
        }
        let user = self
            .users()
            .find_by_phone(phone)?
            .ok_or_else(|| AccountError::UnknownPhone(phone.to_string()))?;

        self.open_session(user, now_ms, "code")
    }

    fn open_session(&self, user: User, now_ms: i64, method: &str) -> AccountResult<LoginSession> {
        let sessions = self.sessions();
        let purged = sessions.purge_expired(now_ms)?;
        let token = sessions.create_session(user.id, now_ms, self.session_ttl_ms)?;
        if purged > 0 {
            debug!("event=session_purge module=account status=ok purged={purged}");
        }
        info!(
            "event=user_login module=account status=ok user_id={} method={}",
            user.id, method
        );
        Ok(LoginSession { user, token })
    }

    /// Resolves a session token to its account.
    pub fn authenticate(&self, token: &str, now_ms: i64) -> AccountResult<User> {
        let user_id = self
            .sessions()
            .resolve_session(token, now_ms)?
            .ok_or(AccountError::NotLoggedIn)?;
        self.users()
            .get_user(user_id)?
            .ok_or(AccountError::NotLoggedIn)
    }

    pub fn is_login(&self, token: &str, now_ms: i64) -> AccountResult<bool> {
        Ok(self.sessions().resolve_session(token, now_ms)?.is_some())
    }

    /// Revokes one session. Returns whether it existed.
    pub fn logout(&self, token: &str) -> AccountResult<bool> {
        Ok(self.sessions().revoke_session(token)?)
    }

    /// Revokes every session of `user_id`.
    pub fn kickout(&self, user_id: UserId) -> AccountResult<usize> {
        let revoked = self.sessions().revoke_user_sessions(user_id)?;
        info!(
            "event=user_kickout module=account status=ok user_id={} revoked={}",
            user_id, revoked
        );
        Ok(revoked)
    }

    pub fn update_password(&self, user_id: UserId, change: &PasswordChange) -> AccountResult<()> {
        let users = self.users();
        let user = users
            .get_user(user_id)?
            .ok_or(AccountError::UserNotFound(user_id))?;

        let old_password = change.old_password.as_deref().unwrap_or_default();
        if !verify_password(&user.password_hash, old_password) {
            return Err(AccountError::WrongPassword);
        }
        let new_password = change.new_password.as_deref().unwrap_or_default();
        require_text("newPassword", Some(new_password))?;
        if change.re_new_password.as_deref() != Some(new_password) {
            return Err(ValidationError::PasswordMismatch.into());
        }

        users.update_password_hash(user_id, &hash_password(new_password))?;
        info!(
            "event=user_password_update module=account status=ok user_id={}",
            user_id
        );
        Ok(())
    }

    /// Applies a partial profile update and returns the updated account.
    pub fn update_profile(&self, user_id: UserId, patch: &ProfilePatch) -> AccountResult<User> {
        let users = self.users();
        if !patch.is_empty() {
            users.update_profile(user_id, patch)?;
        }
        users
            .get_user(user_id)?
            .ok_or(AccountError::UserNotFound(user_id))
    }

    /// Deletes the account; sessions and owned rows cascade.
    ///
    /// Requests the user still holds as volunteer go back to `Pending` so
    /// another volunteer can pick them up.
    pub fn delete_user(&self, user_id: UserId) -> AccountResult<()> {
        let tx = begin_immediate(self.conn)?;
        let released = SqliteRequestRepository::new(&tx).release_volunteer(user_id)?;
        SqliteUserRepository::new(&tx).delete_user(user_id)?;
        tx.commit()?;

        info!(
            "event=user_delete module=account status=ok user_id={} released_requests={}",
            user_id, released
        );
        Ok(())
    }

    pub fn current_user(&self, user_id: UserId) -> AccountResult<User> {
        self.users()
            .get_user(user_id)?
            .ok_or(AccountError::UserNotFound(user_id))
    }

    /// One user when `id` is given, otherwise every user.
    pub fn query_users(&self, id: Option<UserId>) -> AccountResult<Vec<User>> {
        match id {
            Some(id) => Ok(vec![self.current_user(id)?]),
            None => Ok(self.users().list_users()?),
        }
    }
}

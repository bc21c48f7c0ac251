//! Daily sign-in service.
//!
//! # Invariants
//! - At most one sign-in per user per local calendar day.
//! - The sign-in row and the point credit commit together.

use crate::clock::{local_date, local_day_start_ms};
use crate::model::page::{Page, PageRequest};
use crate::model::sign_in::{SignInRecord, SignInStatus, SIGN_IN_POINTS};
use crate::model::user::UserId;
use crate::repo::sign_in_repo::{SignInRepository, SqliteSignInRepository};
use crate::repo::user_repo::{SqliteUserRepository, UserRepository};
use crate::repo::RepoError;
use crate::service::{begin_immediate, ErrorKind};
use chrono::NaiveDate;
use log::info;
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Upper bound on history scanned when computing a streak.
const STREAK_SCAN_LIMIT: u32 = 400;

#[derive(Debug)]
pub enum SignInError {
    AlreadySignedIn,
    UserNotFound(UserId),
    Repo(RepoError),
}

impl SignInError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::AlreadySignedIn => ErrorKind::Conflict,
            Self::UserNotFound(_) => ErrorKind::NotFound,
            Self::Repo(_) => ErrorKind::Internal,
        }
    }
}

impl Display for SignInError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AlreadySignedIn => write!(f, "already signed in today"),
            Self::UserNotFound(id) => write!(f, "user not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for SignInError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for SignInError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound { entity: "user", id } => Self::UserNotFound(id),
            other => Self::Repo(other),
        }
    }
}

impl From<rusqlite::Error> for SignInError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Repo(value.into())
    }
}

pub type SignInResult<T> = Result<T, SignInError>;

pub struct SignInService<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SignInService<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// Records today's sign-in and credits [`SIGN_IN_POINTS`].
    pub fn sign_in_at(&self, user_id: UserId, now_ms: i64) -> SignInResult<SignInRecord> {
        let tx = begin_immediate(self.conn)?;
        let sign_ins = SqliteSignInRepository::new(&tx);
        if sign_ins
            .latest_since(user_id, local_day_start_ms(now_ms))?
            .is_some()
        {
            return Err(SignInError::AlreadySignedIn);
        }
        let record = sign_ins.insert_sign_in(user_id, now_ms, SIGN_IN_POINTS)?;
        let balance = SqliteUserRepository::new(&tx)
            .adjust_score(user_id, SIGN_IN_POINTS)?
            .ok_or(SignInError::UserNotFound(user_id))?;
        tx.commit()?;

        info!(
            "event=sign_in module=sign_in status=ok user_id={} balance={}",
            user_id, balance
        );
        Ok(record)
    }

    pub fn records(&self, user_id: UserId, page: PageRequest) -> SignInResult<Page<SignInRecord>> {
        Ok(SqliteSignInRepository::new(self.conn).list_sign_ins(user_id, page)?)
    }

    pub fn status(&self, user_id: UserId, now_ms: i64) -> SignInResult<SignInStatus> {
        let score = SqliteUserRepository::new(self.conn)
            .get_user(user_id)?
            .ok_or(SignInError::UserNotFound(user_id))?
            .score;
        let dates: Vec<NaiveDate> = SqliteSignInRepository::new(self.conn)
            .recent_timestamps(user_id, STREAK_SCAN_LIMIT)?
            .into_iter()
            .map(local_date)
            .collect();
        let (signed_today, streak) = streak_from_dates(&dates, local_date(now_ms));
        Ok(SignInStatus {
            signed_today,
            streak,
            score,
        })
    }
}

/// Counts consecutive days ending today, or yesterday when today is
/// missing. `dates` must be sorted newest first.
fn streak_from_dates(dates: &[NaiveDate], today: NaiveDate) -> (bool, u32) {
    let signed_today = dates.first() == Some(&today);
    let mut expected = if signed_today {
        Some(today)
    } else {
        today.pred_opt()
    };

    let mut streak = 0;
    for date in dates {
        let Some(want) = expected else { break };
        if *date == want {
            streak += 1;
            expected = want.pred_opt();
        } else if *date < want {
            break;
        }
    }
    (signed_today, streak)
}

#[cfg(test)]
mod tests {
    use super::streak_from_dates;
    use chrono::NaiveDate;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    #[test]
    fn streak_counts_through_today() {
        let dates = [day(10), day(9), day(8), day(6)];
        assert_eq!(streak_from_dates(&dates, day(10)), (true, 3));
    }

    #[test]
    fn streak_survives_until_today_is_missed() {
        let dates = [day(9), day(8)];
        assert_eq!(streak_from_dates(&dates, day(10)), (false, 2));
        assert_eq!(streak_from_dates(&dates, day(11)), (false, 0));
    }

    #[test]
    fn streak_ignores_same_day_duplicates() {
        let dates = [day(10), day(10), day(9)];
        assert_eq!(streak_from_dates(&dates, day(10)), (true, 2));
    }

    #[test]
    fn empty_history_has_no_streak() {
        assert_eq!(streak_from_dates(&[], day(1)), (false, 0));
    }
}

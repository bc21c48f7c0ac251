//! Daily sign-in records.

use crate::model::user::UserId;
use serde::Serialize;

/// Points credited for one daily sign-in.
pub const SIGN_IN_POINTS: i64 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignInRecord {
    pub id: i64,
    pub user_id: UserId,
    pub signed_at: i64,
    pub points: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignInStatus {
    pub signed_today: bool,
    /// Consecutive local days with a sign-in, ending today or yesterday.
    pub streak: u32,
    pub score: i64,
}

//! JSON envelope shared by every endpoint.

use axum::Json;
use serde::Serialize;

pub const CODE_OK: u8 = 1;
pub const CODE_ERROR: u8 = 0;

/// `{ "code": 1|0, "msg": ..., "data": ... }`
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub code: u8,
    pub msg: String,
    pub data: Option<T>,
}

impl<T: Serialize> Envelope<T> {
    pub fn ok(data: T, msg: impl Into<String>) -> Json<Self> {
        Json(Self {
            code: CODE_OK,
            msg: msg.into(),
            data: Some(data),
        })
    }
}

impl Envelope<()> {
    /// Success without payload; serializes `data` as `null`.
    pub fn done(msg: impl Into<String>) -> Json<Self> {
        Json(Self {
            code: CODE_OK,
            msg: msg.into(),
            data: None,
        })
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            code: CODE_ERROR,
            msg: msg.into(),
            data: None,
        }
    }
}

pub type ApiResult<T> = Result<Json<Envelope<T>>, crate::error::ApiError>;

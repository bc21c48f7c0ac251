use crate::response::Envelope;
use ada_core::service::account_service::AccountError;
use ada_core::service::chat_service::ChatError;
use ada_core::service::feedback_service::FeedbackError;
use ada_core::service::forum_service::ForumError;
use ada_core::service::request_service::RequestError;
use ada_core::service::sign_in_service::SignInError;
use ada_core::service::store_service::StoreError;
use ada_core::ErrorKind;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use log::error;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{message}")]
    Service { kind: ErrorKind, message: String },

    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    #[error("not logged in")]
    Unauthenticated,

    #[error("{0}")]
    Forbidden(&'static str),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Service { kind, .. } => status_for(*kind),
            ApiError::MalformedPayload(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthenticated => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Validation => StatusCode::BAD_REQUEST,
        ErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
        ErrorKind::Forbidden => StatusCode::FORBIDDEN,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Conflict => StatusCode::CONFLICT,
        ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("event=request_failed module=http status=error detail={self}");
            // Storage details stay in the log.
            return (status, Json(Envelope::error("internal server error"))).into_response();
        }
        (status, Json(Envelope::error(self.to_string()))).into_response()
    }
}

macro_rules! service_error {
    ($($source:ty),+ $(,)?) => {
        $(
            impl From<$source> for ApiError {
                fn from(err: $source) -> Self {
                    ApiError::Service {
                        kind: err.kind(),
                        message: err.to_string(),
                    }
                }
            }
        )+
    };
}

service_error!(
    AccountError,
    RequestError,
    ForumError,
    ChatError,
    SignInError,
    StoreError,
    FeedbackError,
);

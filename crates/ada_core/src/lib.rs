//! Storage, domain rules and use cases of the assistance platform.
//!
//! Transport crates call into [`service`] and never write SQL themselves.

pub mod clock;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use db::{open_db, open_db_in_memory, DbError};
pub use logging::{default_log_level, init_logging, logging_status, LogLevel, LoggingError};
pub use model::user::{User, UserId, UserType};
pub use repo::{RepoError, RepoResult};
pub use service::ErrorKind;

/// Liveness answer for health checks.
pub fn ping() -> &'static str {
    "pong"
}

pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_answers() {
        assert_eq!(ping(), "pong");
        assert!(core_version().split('.').count() >= 3);
    }
}

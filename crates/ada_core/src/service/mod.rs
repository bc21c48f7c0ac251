//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Enforce ownership and role rules before any write.
//! - Keep the HTTP layer decoupled from storage details.
//!
//! # Invariants
//! - Point-moving use-cases run inside one IMMEDIATE transaction.
//! - Every service error maps to exactly one [`ErrorKind`].

use rusqlite::{Connection, Transaction, TransactionBehavior};

pub mod account_service;
pub mod chat_service;
pub mod feedback_service;
pub mod forum_service;
pub mod request_service;
pub mod sign_in_service;
pub mod store_service;

/// Coarse classification of service failures for transport layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Input failed validation.
    Validation,
    /// Missing or unknown credentials.
    Unauthorized,
    /// Caller is authenticated but not allowed to act on the target.
    Forbidden,
    NotFound,
    /// Request conflicts with current state (duplicate, wrong status, balance).
    Conflict,
    Internal,
}

/// Opens a write transaction that takes the database lock up front.
///
/// Uses `new_unchecked` so services can work from a shared `&Connection`.
pub(crate) fn begin_immediate(conn: &Connection) -> rusqlite::Result<Transaction<'_>> {
    Transaction::new_unchecked(conn, TransactionBehavior::Immediate)
}

//! Domain model for accounts, help requests, forum, chat and rewards.
//!
//! # Responsibility
//! - Define canonical records shared by repositories and services.
//! - Own input validation and the help-request lifecycle transitions.
//!
//! # Invariants
//! - Every record is identified by a database-assigned integer id.
//! - Integer status flags cross the storage/HTTP boundary only through the
//!   typed enums declared here.

pub mod chat;
pub mod feedback;
pub mod forum;
pub mod page;
pub mod request;
pub mod sign_in;
pub mod store;
pub mod user;
pub mod validation;

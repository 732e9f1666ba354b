//! Conversation session domain.
//!
//! - [`identifiers`]: validated `UserId` / `SessionId` and the structured
//!   [`SessionKey`](identifiers::SessionKey) the store addresses rows by
//! - [`entities::Turn`]: one persisted (query, response) exchange
//! - [`entities::SessionSummary`]: lightweight per-session statistics

pub mod entities;
pub mod identifiers;

//! Use cases
//!
//! Application-level operations that orchestrate domain logic.

pub mod coordinator;
pub mod manage_sessions;

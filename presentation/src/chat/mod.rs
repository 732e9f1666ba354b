//! Interactive chat module
//!
//! Provides a readline-based chat interface to the agent team.

mod repl;

pub use repl::{ChatCommand, ChatRepl};

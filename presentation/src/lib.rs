//! Presentation layer for data-crew
//!
//! This crate contains CLI definitions, output formatters,
//! progress reporters, and the interactive chat interface.

pub mod chat;
pub mod cli;
pub mod output;
pub mod progress;

// Re-export commonly used types
pub use chat::{ChatCommand, ChatRepl};
pub use cli::commands::{Cli, Command, DEFAULT_USER};
pub use output::{ConsoleFormatter, OutputFormatter};
pub use progress::{CycleProgressReporter, SimpleProgress};

//! Output formatting

mod console;
mod formatter;

pub use console::ConsoleFormatter;
pub use formatter::OutputFormatter;

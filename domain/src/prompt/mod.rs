//! Prompt domain
//!
//! Templates for the specialist agents, the memo revision request and the
//! lead summary.

mod template;

pub use template::PromptTemplate;

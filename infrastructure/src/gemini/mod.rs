//! Gemini adapter
//!
//! Implements the [`LlmGateway`](crew_application::LlmGateway) port over the
//! Generative Language REST API (`models/{model}:generateContent`).

pub mod gateway;
pub mod protocol;
pub mod session;

pub use gateway::GeminiLlmGateway;
pub use session::GeminiSession;

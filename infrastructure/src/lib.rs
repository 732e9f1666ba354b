//! Infrastructure layer for data-crew
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer, including configuration file loading.

pub mod config;
pub mod gemini;
pub mod logging;
pub mod search;
pub mod storage;

// Re-export commonly used types
pub use config::{ConfigLoader, ConfigValidationError, FileConfig};
pub use gemini::{GeminiLlmGateway, GeminiSession};
pub use logging::JsonlConversationLogger;
pub use search::{DuckDuckGoSearch, VertexAuth, VertexKnowledgeSearch};
pub use storage::RedbSessionStore;

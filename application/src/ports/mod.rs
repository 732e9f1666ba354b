//! Port definitions (interfaces for external adapters)
//!
//! Ports define the contracts that infrastructure adapters must implement.

pub mod capability_agent;
pub mod conversation_logger;
pub mod llm_gateway;
pub mod progress;
pub mod search;
pub mod session_store;

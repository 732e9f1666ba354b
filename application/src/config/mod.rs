//! Application-level configuration.
//!
//! - [`CoordinatorConfig`]: cycle control (agent timeout, history window, lead model)

pub mod coordinator_config;

pub use coordinator_config::CoordinatorConfig;

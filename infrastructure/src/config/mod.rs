//! Configuration file loading for data-crew
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. `GOOGLE_API_KEY`, `GOOGLE_PROJECT_ID`, `DATA_STORE_ID`
//! 2. `DATA_CREW_*` environment variables (`__` separates sections)
//! 3. `--config <path>` specified file
//! 4. Project root: `./data-crew.toml` or `./.data-crew.toml`
//! 5. Global: `$XDG_CONFIG_HOME/data-crew/config.toml`
//! 6. Default values

mod file_config;
mod loader;

pub use file_config::{
    ConfigValidationError, DEFAULT_LOCATION, FileConfig, FileDispatchConfig, FileGoogleConfig,
    FileLoggingConfig, FileModelsConfig, FileStorageConfig, FileSynthesisConfig, data_dir,
};
pub use loader::ConfigLoader;

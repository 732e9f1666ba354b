//! Configuration file loader with multi-source merging

use super::file_config::FileConfig;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use std::path::{Path, PathBuf};

const PROJECT_FILES: [&str; 2] = ["data-crew.toml", ".data-crew.toml"];

/// Variables read without the `DATA_CREW_` prefix, with their config keys
const RAW_ENV: [(&str, &str); 3] = [
    ("GOOGLE_API_KEY", "google.api_key"),
    ("GOOGLE_PROJECT_ID", "google.project_id"),
    ("DATA_STORE_ID", "google.data_store_id"),
];

/// Configuration loader that handles file discovery and merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from all sources with proper priority
    ///
    /// Priority (highest to lowest):
    /// 1. `GOOGLE_API_KEY` / `GOOGLE_PROJECT_ID` / `DATA_STORE_ID`
    /// 2. `DATA_CREW_*` environment variables
    /// 3. Explicit config path (if provided)
    /// 4. Project root: `./data-crew.toml` or `./.data-crew.toml`
    /// 5. Global: `$XDG_CONFIG_HOME/data-crew/config.toml`
    /// 6. Default values
    pub fn load(config_path: Option<&PathBuf>) -> Result<FileConfig, Box<figment::Error>> {
        let mut figment = Self::files(config_path);
        figment = Self::with_env(figment);
        figment.extract().map_err(Box::new)
    }

    /// Load defaults plus environment only (for --no-config)
    pub fn load_defaults() -> Result<FileConfig, Box<figment::Error>> {
        let figment = Self::with_env(Figment::new().merge(Serialized::defaults(FileConfig::default())));
        figment.extract().map_err(Box::new)
    }

    fn files(config_path: Option<&PathBuf>) -> Figment {
        let mut figment = Figment::new().merge(Serialized::defaults(FileConfig::default()));

        if let Some(global_path) = Self::global_config_path()
            && global_path.exists()
        {
            figment = figment.merge(Toml::file(&global_path));
        }

        if let Some(path) = Self::project_config_path() {
            figment = figment.merge(Toml::file(&path));
        }

        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        figment
    }

    fn with_env(figment: Figment) -> Figment {
        figment
            .merge(Env::prefixed("DATA_CREW_").split("__"))
            .merge(Env::raw().filter_map(|key| {
                RAW_ENV
                    .iter()
                    .find(|(var, _)| key.as_str().eq_ignore_ascii_case(var))
                    .map(|(_, mapped)| (*mapped).into())
            }))
    }

    /// Get the global config file path
    ///
    /// Returns `$XDG_CONFIG_HOME/data-crew/config.toml` when set,
    /// otherwise the platform config directory.
    pub fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("data-crew").join("config.toml"))
    }

    /// Get the project-level config file path (if it exists)
    pub fn project_config_path() -> Option<PathBuf> {
        Self::project_config_in(Path::new("."))
    }

    fn project_config_in(dir: &Path) -> Option<PathBuf> {
        PROJECT_FILES
            .iter()
            .map(|name| dir.join(name))
            .find(|path| path.exists())
    }

    /// Describe the config sources being used (for --show-config)
    pub fn describe_sources(explicit: Option<&PathBuf>) -> Vec<String> {
        let mut lines = vec!["Configuration sources (in priority order):".to_string()];
        let mark = |found: bool| if found { "[FOUND]" } else { "[     ]" };

        for (var, _) in RAW_ENV {
            lines.push(format!("  {} Env:     {}", mark(std::env::var_os(var).is_some()), var));
        }
        lines.push("  [     ] Env:     DATA_CREW_*".to_string());

        if let Some(path) = explicit {
            lines.push(format!("  {} Explicit: {}", mark(path.exists()), path.display()));
        }

        match Self::project_config_path() {
            Some(path) => lines.push(format!("  [FOUND] Project: {}", path.display())),
            None => lines.push("  [     ] Project: ./data-crew.toml or ./.data-crew.toml".to_string()),
        }

        if let Some(path) = Self::global_config_path() {
            lines.push(format!("  {} Global:  {}", mark(path.exists()), path.display()));
        }

        lines.push("  [     ] Default: built-in defaults".to_string());
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("crew.toml");
        std::fs::write(
            &path,
            "[dispatch]\nagent_timeout_seconds = 45\n\n[models]\nflash = \"gemini-2.5-flash-lite\"\n",
        )
        .unwrap();

        let config: FileConfig = ConfigLoader::files(Some(&path)).extract().unwrap();
        assert_eq!(config.dispatch.agent_timeout_seconds, 45);
        assert_eq!(config.dispatch.history_window, 6);
        assert_eq!(config.models.flash.as_deref(), Some("gemini-2.5-flash-lite"));
    }

    #[test]
    fn test_project_config_lookup() {
        let dir = tempfile::tempdir().unwrap();
        assert!(ConfigLoader::project_config_in(dir.path()).is_none());

        std::fs::write(dir.path().join(".data-crew.toml"), "").unwrap();
        let found = ConfigLoader::project_config_in(dir.path()).unwrap();
        assert!(found.ends_with(".data-crew.toml"));
    }

    #[test]
    fn test_global_config_path_returns_some() {
        let path = ConfigLoader::global_config_path();
        assert!(path.is_some());
        assert!(path.unwrap().to_string_lossy().contains("data-crew"));
    }
}

//! Configuration loader with tier-based merging.

use super::merge::deep_merge_all;
use super::types::{Config, USER_DIR_NAME};
use anyhow::Result;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Where each tier lives on disk.
#[derive(Debug, Clone, Default)]
pub struct ConfigPaths {
    /// Explicit config file; replaces the project and user tiers.
    pub explicit: Option<PathBuf>,
    pub project_dir: Option<PathBuf>,
    pub user_dir: Option<PathBuf>,
}

impl ConfigPaths {
    /// Discover configuration paths from environment and defaults.
    pub fn discover() -> Self {
        let explicit = std::env::var("TASKFLOW_CONFIG_PATH").ok().map(PathBuf::from);

        let project_dir = std::env::var("TASKFLOW_PROJECT_DIR")
            .ok()
            .map(PathBuf::from)
            .or_else(|| Some(PathBuf::from("taskflow")));

        let user_dir = std::env::var("TASKFLOW_USER_DIR")
            .ok()
            .map(PathBuf::from)
            .or_else(|| dirs::home_dir().map(|h| h.join(USER_DIR_NAME)));

        Self {
            explicit,
            project_dir,
            user_dir,
        }
    }

    /// Create paths with explicit directories and no explicit file.
    pub fn with_dirs(project_dir: Option<PathBuf>, user_dir: Option<PathBuf>) -> Self {
        Self {
            explicit: None,
            project_dir,
            user_dir,
        }
    }

    /// Use `path` instead of the project and user tiers.
    pub fn with_explicit(mut self, path: impl Into<PathBuf>) -> Self {
        self.explicit = Some(path.into());
        self
    }
}

/// Loads and merges every tier into a [`Config`].
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    pub paths: ConfigPaths,
    config: Config,
    /// Highest-priority file that contributed, if any
    config_path: Option<PathBuf>,
}

impl ConfigLoader {
    /// Load configuration from all tiers with proper merging.
    pub fn load() -> Result<Self> {
        Self::load_with_paths(ConfigPaths::discover())
    }

    /// Load configuration with explicit paths.
    pub fn load_with_paths(paths: ConfigPaths) -> Result<Self> {
        let mut configs: Vec<Value> = Vec::new();
        let mut config_path = None;

        // Tier 1: Defaults
        configs.push(serde_json::to_value(Config::default())?);

        if let Some(ref explicit) = paths.explicit {
            // An explicit file must exist; a typo should not silently fall back
            let config = Config::load(explicit)?;
            configs.push(serde_json::to_value(config)?);
            config_path = Some(explicit.clone());
        } else {
            // Tier 2: Project config
            if let Some(file) = paths.project_dir.as_deref().map(|d| d.join("config.yaml"))
                && let Some(value) = read_tier(&file)
            {
                configs.push(value);
                config_path = Some(file);
            }

            // Tier 3: User config
            if let Some(file) = paths.user_dir.as_deref().map(|d| d.join("config.yaml"))
                && let Some(value) = read_tier(&file)
            {
                configs.push(value);
                config_path = Some(file);
            }
        }

        let merged = deep_merge_all(configs);
        let mut config: Config = serde_json::from_value(merged)?;

        // Tier 4: Environment variable overrides
        Self::apply_env_overrides(&mut config);

        Ok(Self {
            paths,
            config,
            config_path,
        })
    }

    fn apply_env_overrides(config: &mut Config) {
        if let Ok(session_path) = std::env::var("TASKFLOW_SESSION_PATH") {
            config.session.path = PathBuf::from(session_path);
        }

        if let Ok(fixtures_path) = std::env::var("TASKFLOW_FIXTURES_PATH") {
            config.fixtures.path = Some(PathBuf::from(fixtures_path));
        }

        if let Ok(port) = std::env::var("TASKFLOW_PORT") {
            match port.parse() {
                Ok(port) => config.server.port = port,
                Err(_) => warn!("Ignoring invalid TASKFLOW_PORT value '{}'", port),
            }
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn into_config(self) -> Config {
        self.config
    }

    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }
}

/// Parse one tier file. Missing files are skipped; unreadable or invalid
/// ones are skipped with a warning.
fn read_tier(file: &Path) -> Option<Value> {
    if !file.exists() {
        return None;
    }
    let content = match std::fs::read_to_string(file) {
        Ok(content) => content,
        Err(e) => {
            warn!("Skipping config file {}: {}", file.display(), e);
            return None;
        }
    };
    match serde_yaml::from_str::<Value>(&content) {
        Ok(value) => {
            debug!("Loaded config tier {}", file.display());
            Some(value)
        }
        Err(e) => {
            warn!("Skipping invalid config file {}: {}", file.display(), e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::WeekStart;
    use tempfile::TempDir;

    #[test]
    fn test_load_defaults_only() {
        let temp = TempDir::new().unwrap();
        let paths = ConfigPaths::with_dirs(
            Some(temp.path().join("project")),
            Some(temp.path().join("user")),
        );

        let loader = ConfigLoader::load_with_paths(paths).unwrap();
        assert_eq!(loader.config().auth.login_delay_ms, 1000);
        assert!(loader.config_path().is_none());
    }

    #[test]
    fn test_user_config_overrides_project() {
        let temp = TempDir::new().unwrap();
        let project_dir = temp.path().join("taskflow");
        let user_dir = temp.path().join("user");
        std::fs::create_dir_all(&project_dir).unwrap();
        std::fs::create_dir_all(&user_dir).unwrap();

        std::fs::write(
            project_dir.join("config.yaml"),
            "auth:\n  login_delay_ms: 50\nanalytics:\n  week_start: monday\n",
        )
        .unwrap();
        std::fs::write(user_dir.join("config.yaml"), "auth:\n  login_delay_ms: 0\n").unwrap();

        let paths = ConfigPaths::with_dirs(Some(project_dir), Some(user_dir.clone()));
        let loader = ConfigLoader::load_with_paths(paths).unwrap();

        assert_eq!(loader.config().auth.login_delay_ms, 0);
        assert_eq!(loader.config().analytics.week_start, WeekStart::Monday);
        assert_eq!(loader.config_path(), Some(user_dir.join("config.yaml").as_path()));
    }

    #[test]
    fn test_explicit_file_replaces_dir_tiers() {
        let temp = TempDir::new().unwrap();
        let project_dir = temp.path().join("taskflow");
        std::fs::create_dir_all(&project_dir).unwrap();
        std::fs::write(project_dir.join("config.yaml"), "auth:\n  login_delay_ms: 50\n").unwrap();

        let explicit = temp.path().join("custom.yaml");
        std::fs::write(&explicit, "server:\n  host: 0.0.0.0\n").unwrap();

        let paths = ConfigPaths::with_dirs(Some(project_dir), None).with_explicit(&explicit);
        let loader = ConfigLoader::load_with_paths(paths).unwrap();

        assert_eq!(loader.config().server.host, "0.0.0.0");
        assert_eq!(loader.config().auth.login_delay_ms, 1000);
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let temp = TempDir::new().unwrap();
        let paths = ConfigPaths::default().with_explicit(temp.path().join("absent.yaml"));
        assert!(ConfigLoader::load_with_paths(paths).is_err());
    }

    #[test]
    fn test_invalid_tier_is_skipped() {
        let temp = TempDir::new().unwrap();
        let project_dir = temp.path().join("taskflow");
        std::fs::create_dir_all(&project_dir).unwrap();
        std::fs::write(project_dir.join("config.yaml"), "server: [unclosed").unwrap();

        let paths = ConfigPaths::with_dirs(Some(project_dir), None);
        let loader = ConfigLoader::load_with_paths(paths).unwrap();
        assert_eq!(loader.config().server.port, 31995);
    }
}

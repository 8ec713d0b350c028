use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::logging::LogConfig;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Profile to use for calorie estimates; overrides the one marked
    /// active in the database when set
    pub active_profile_id: Option<String>,

    /// Application metadata
    pub metadata: ConfigMetadata,

    /// General application settings
    pub settings: AppSettings,

    /// Logging setup
    #[serde(default)]
    pub logging: LogConfig,

    /// Step-count source settings
    #[serde(default)]
    pub steps: StepSettings,
}

/// Configuration metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigMetadata {
    /// Configuration format version
    pub version: String,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last modification timestamp
    pub updated_at: DateTime<Utc>,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSettings {
    /// Data directory path
    pub data_dir: PathBuf,

    /// SQLite database file; relative paths resolve against `data_dir`
    pub database_path: PathBuf,

    /// Decimal places shown for distances and speeds
    pub display_precision: usize,
}

/// Step-count source settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StepSettings {
    /// Count used for today's summary when none is given on the command line
    pub manual_steps: Option<u32>,
}

impl Default for AppConfig {
    fn default() -> Self {
        let now = Utc::now();

        AppConfig {
            active_profile_id: None,
            metadata: ConfigMetadata {
                version: "1.0".to_string(),
                created_at: now,
                updated_at: now,
            },
            settings: AppSettings::default(),
            logging: LogConfig::default(),
            steps: StepSettings::default(),
        }
    }
}

impl Default for AppSettings {
    fn default() -> Self {
        AppSettings {
            data_dir: default_data_dir(),
            database_path: PathBuf::from("treadlog.db"),
            display_precision: 2,
        }
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("treadlog")
}

/// Configuration management implementation
impl AppConfig {
    /// Load configuration from TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: AppConfig = toml::from_str(&content)
            .with_context(|| "Failed to parse TOML configuration")?;

        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn save_to_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        self.metadata.updated_at = Utc::now();

        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;
        }

        let toml_content = toml::to_string_pretty(self)
            .with_context(|| "Failed to serialize configuration to TOML")?;

        fs::write(&path, toml_content)
            .with_context(|| format!("Failed to write config file: {}", path.as_ref().display()))?;

        Ok(())
    }

    /// Get default configuration file path
    pub fn default_config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".treadlog")
            .join("config.toml")
    }

    /// Load configuration from `path` (or the default location), falling
    /// back to defaults when the file is missing or unreadable
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let config_path = path
            .map(Path::to_path_buf)
            .unwrap_or_else(Self::default_config_path);

        match Self::load_from_file(&config_path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(
                    path = %config_path.display(),
                    error = %e,
                    "Config not loaded, using defaults"
                );
                Self::default()
            }
        }
    }

    /// Full path of the database file
    pub fn database_file(&self) -> PathBuf {
        if self.settings.database_path.is_absolute() {
            self.settings.database_path.clone()
        } else {
            self.settings.data_dir.join(&self.settings.database_path)
        }
    }

    /// Pin a profile as the one to use for estimates
    pub fn set_active_profile(&mut self, profile_id: impl Into<String>) {
        self.active_profile_id = Some(profile_id.into());
        self.metadata.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::LogLevel;
    use tempfile::tempdir;

    #[test]
    fn test_config_serialization() {
        let config = AppConfig::default();
        let toml_str = toml::to_string(&config).unwrap();
        let deserialized: AppConfig = toml::from_str(&toml_str).unwrap();

        assert_eq!(config.metadata.version, deserialized.metadata.version);
        assert_eq!(config.settings.database_path, deserialized.settings.database_path);
        assert_eq!(config.logging.level, deserialized.logging.level);
    }

    #[test]
    fn test_config_file_io() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("nested").join("config.toml");

        let mut original = AppConfig::default();
        original.set_active_profile("profile-1");
        original.logging.level = LogLevel::Debug;
        original.steps.manual_steps = Some(6_500);

        original.save_to_file(&config_path).unwrap();
        let loaded = AppConfig::load_from_file(&config_path).unwrap();

        assert_eq!(loaded.active_profile_id.as_deref(), Some("profile-1"));
        assert_eq!(loaded.logging.level, LogLevel::Debug);
        assert_eq!(loaded.steps.manual_steps, Some(6_500));
    }

    #[test]
    fn test_missing_sections_use_defaults() {
        let toml_str = r#"
            [metadata]
            version = "1.0"
            created_at = "2025-03-15T08:00:00Z"
            updated_at = "2025-03-15T08:00:00Z"

            [settings]
            data_dir = "/tmp/treadlog"
            database_path = "tracker.db"
            display_precision = 1
        "#;

        let config: AppConfig = toml::from_str(toml_str).unwrap();
        assert!(config.active_profile_id.is_none());
        assert!(config.steps.manual_steps.is_none());
        assert_eq!(config.database_file(), PathBuf::from("/tmp/treadlog/tracker.db"));
    }

    #[test]
    fn test_load_or_default_falls_back() {
        let temp_dir = tempdir().unwrap();
        let config = AppConfig::load_or_default(Some(&temp_dir.path().join("missing.toml")));
        assert_eq!(config.metadata.version, "1.0");
    }
}

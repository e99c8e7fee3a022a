//! Configuration management (`rollback.toml`)
//!
//! Snapshot and session settings, stored in TOML format in the
//! platform-specific config directory.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::remap::UnmappedPolicy;
use crate::rollback::{DEFAULT_SNAPSHOT_CAPACITY, MAX_STATE_SIZE, SessionConfig};

/// File name of the configuration inside [`config_dir`]
pub const CONFIG_FILE_NAME: &str = "rollback.toml";

/// Rollback configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Config {
    /// Snapshot ring settings
    #[serde(default)]
    pub snapshots: SnapshotConfig,
    /// GGRS session settings
    #[serde(default)]
    pub session: SessionConfig,
}

/// Snapshot ring configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotConfig {
    /// Number of ring slots (default: 10)
    #[serde(default = "default_capacity")]
    pub capacity: usize,
    /// Maximum combined store and engine snapshot size in bytes (default: 16 MiB)
    #[serde(default = "default_max_state_size")]
    pub max_state_size: usize,
    /// Treatment of entities the engine leaves out of a remap table
    /// (default: despawned)
    #[serde(default)]
    pub unmapped_entities: UnmappedPolicy,
}

fn default_capacity() -> usize {
    DEFAULT_SNAPSHOT_CAPACITY
}
fn default_max_state_size() -> usize {
    MAX_STATE_SIZE
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
            max_state_size: default_max_state_size(),
            unmapped_entities: UnmappedPolicy::default(),
        }
    }
}

/// Error reading or validating a configuration file
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to access config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

impl Config {
    /// Parse and validate a TOML document
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that the settings can work together
    ///
    /// The ring must hold every frame GGRS may roll back to plus the frame
    /// being saved.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let capacity = self.snapshots.capacity;
        if capacity == 0 {
            return Err(ConfigError::Invalid(
                "snapshots.capacity must be at least 1".to_string(),
            ));
        }
        if capacity < self.session.check_distance + 1 {
            return Err(ConfigError::Invalid(format!(
                "snapshots.capacity ({}) must exceed session.check_distance ({})",
                capacity, self.session.check_distance
            )));
        }
        if capacity < self.session.max_prediction_frames + 1 {
            return Err(ConfigError::Invalid(format!(
                "snapshots.capacity ({}) must exceed session.max_prediction_frames ({})",
                capacity, self.session.max_prediction_frames
            )));
        }
        if self.snapshots.max_state_size == 0 {
            return Err(ConfigError::Invalid(
                "snapshots.max_state_size must be non-zero".to_string(),
            ));
        }
        if self.session.num_players == 0 {
            return Err(ConfigError::Invalid(
                "session.num_players must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Returns the platform-specific configuration directory.
///
/// On Linux: `~/.config/script-rollback`
///
/// Returns `None` if the home directory cannot be determined.
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("io", "", "script-rollback")
        .map(|dirs| dirs.config_dir().to_path_buf())
}

/// Path of the configuration file, if a config directory exists
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join(CONFIG_FILE_NAME))
}

/// Loads the configuration from disk.
///
/// Returns default values if the file doesn't exist, cannot be parsed or
/// fails validation.
pub fn load() -> Config {
    let Some(path) = config_path() else {
        return Config::default();
    };
    if !path.exists() {
        return Config::default();
    }
    match load_from(&path) {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!("Ignoring config at {}: {}", path.display(), e);
            Config::default()
        }
    }
}

/// Loads and validates the configuration at `path`.
pub fn load_from(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    Config::parse(&content)
}

/// Writes the configuration to `path`, creating parent directories.
pub fn save_to(config: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rollback::{DEFAULT_CHECK_DISTANCE, MAX_ROLLBACK_FRAMES};

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.snapshots.capacity, MAX_ROLLBACK_FRAMES + 2);
        assert_eq!(config.snapshots.max_state_size, 16 * 1024 * 1024);
        assert_eq!(config.snapshots.unmapped_entities, UnmappedPolicy::Despawned);
        assert_eq!(config.session.check_distance, DEFAULT_CHECK_DISTANCE);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_deserialize_empty() {
        let config = Config::parse("").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_config_deserialize_partial() {
        let toml_str = r#"
[snapshots]
capacity = 16
unmapped_entities = "keep"
"#;
        let config = Config::parse(toml_str).unwrap();
        assert_eq!(config.snapshots.capacity, 16);
        assert_eq!(config.snapshots.unmapped_entities, UnmappedPolicy::Keep);
        assert_eq!(config.snapshots.max_state_size, MAX_STATE_SIZE); // default
        assert_eq!(config.session, SessionConfig::default());
    }

    #[test]
    fn test_config_rejects_zero_capacity() {
        let err = Config::parse("[snapshots]\ncapacity = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_config_rejects_capacity_below_check_distance() {
        let toml_str = r#"
[snapshots]
capacity = 3

[session]
check_distance = 3
max_prediction_frames = 2
"#;
        let err = Config::parse(toml_str).unwrap_err();
        assert!(err.to_string().contains("check_distance"));
    }

    #[test]
    fn test_config_rejects_capacity_below_prediction_window() {
        let err = Config::parse("[snapshots]\ncapacity = 4\n").unwrap_err();
        assert!(err.to_string().contains("max_prediction_frames"));
    }

    #[test]
    fn test_config_parse_error() {
        let err = Config::parse("[snapshots\ncapacity = ").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_config_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE_NAME);

        let mut config = Config::default();
        config.snapshots.capacity = 24;
        config.session.input_delay = 2;
        save_to(&config, &path).unwrap();

        assert_eq!(load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_load_from_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_from(&dir.path().join(CONFIG_FILE_NAME)).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}

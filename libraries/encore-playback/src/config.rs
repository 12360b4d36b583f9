//! Player configuration
//!
//! Loaded from an optional TOML file, then overridden by `ENCORE_PLAYER_*`
//! environment variables:
//!
//! ```toml
//! restart_threshold_ms = 3000
//! shuffle_retry_limit = 10
//! storage_key = "encore.player.v1"
//! persist = true
//! ```
//!
//! `ENCORE_PLAYER_PERSIST=false` disables the snapshot writer, for example.

use std::path::Path;

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::error::{PlaybackError, Result};

/// Default storage key for the persisted player snapshot
pub const DEFAULT_STORAGE_KEY: &str = "encore.player.v1";

const ENV_PREFIX: &str = "ENCORE_PLAYER";

/// Tunables for [`crate::PlaybackManager`] and [`crate::PlayerService`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Above this position `prev` restarts the current song instead of
    /// moving back
    pub restart_threshold_ms: u64,

    /// Random draws before shuffle falls back to the following index
    pub shuffle_retry_limit: u32,

    /// Key the snapshot is stored under
    pub storage_key: String,

    /// Write snapshots to the store after state changes
    pub persist: bool,

    /// Capacity of the service command channel
    pub command_buffer: usize,

    /// Capacity of the service event broadcast
    pub event_buffer: usize,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            restart_threshold_ms: 3000,
            shuffle_retry_limit: 10,
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            persist: true,
            command_buffer: 64,
            event_buffer: 128,
        }
    }
}

impl PlayerConfig {
    /// Load configuration from `path` (if it exists) and the environment
    ///
    /// # Errors
    ///
    /// Returns an error if the file is malformed, a value has the wrong type,
    /// or the result fails [`PlayerConfig::validate`]
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Self::load_with(path.as_ref(), Environment::with_prefix(ENV_PREFIX))
    }

    /// Load configuration from `path` and an explicit variable map
    ///
    /// Keys use the same names as the environment (`ENCORE_PLAYER_PERSIST`).
    ///
    /// # Errors
    ///
    /// Same as [`PlayerConfig::load`]
    pub fn load_with_vars(path: impl AsRef<Path>, vars: config::Map<String, String>) -> Result<Self> {
        Self::load_with(
            path.as_ref(),
            Environment::with_prefix(ENV_PREFIX).source(Some(vars)),
        )
    }

    fn load_with(path: &Path, env: Environment) -> Result<Self> {
        let mut builder = Config::builder();

        if path.exists() {
            tracing::debug!("Loading player config from {}", path.display());
            builder = builder.add_source(File::from(path.to_path_buf()));
        }

        let config: Self = builder
            .add_source(env.try_parsing(true))
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Check value ranges
    ///
    /// # Errors
    ///
    /// Returns [`PlaybackError::Config`] for an empty storage key or a zero
    /// channel capacity
    pub fn validate(&self) -> Result<()> {
        if self.storage_key.trim().is_empty() {
            return Err(PlaybackError::Config("storage_key must not be empty".into()));
        }
        if self.command_buffer == 0 {
            return Err(PlaybackError::Config("command_buffer must be > 0".into()));
        }
        if self.event_buffer == 0 {
            return Err(PlaybackError::Config("event_buffer must be > 0".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn vars(pairs: &[(&str, &str)]) -> config::Map<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn defaults_without_file_or_env() {
        let config = PlayerConfig::load_with_vars("/nonexistent/encore.toml", vars(&[])).unwrap();
        assert_eq!(config, PlayerConfig::default());
        assert_eq!(config.restart_threshold_ms, 3000);
        assert_eq!(config.storage_key, "encore.player.v1");
    }

    #[test]
    fn file_values_override_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("encore.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "restart_threshold_ms = 5000").unwrap();
        writeln!(file, "storage_key = \"custom.key\"").unwrap();

        let config = PlayerConfig::load_with_vars(&path, vars(&[])).unwrap();
        assert_eq!(config.restart_threshold_ms, 5000);
        assert_eq!(config.storage_key, "custom.key");
        assert_eq!(config.shuffle_retry_limit, 10);
    }

    #[test]
    fn env_overrides_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("encore.toml");
        std::fs::write(&path, "persist = true\nshuffle_retry_limit = 4\n").unwrap();

        let config = PlayerConfig::load_with_vars(
            &path,
            vars(&[
                ("ENCORE_PLAYER_PERSIST", "false"),
                ("ENCORE_PLAYER_SHUFFLE_RETRY_LIMIT", "2"),
            ]),
        )
        .unwrap();
        assert!(!config.persist);
        assert_eq!(config.shuffle_retry_limit, 2);
    }

    #[test]
    fn malformed_value_is_config_error() {
        let err = PlayerConfig::load_with_vars(
            "/nonexistent/encore.toml",
            vars(&[("ENCORE_PLAYER_RESTART_THRESHOLD_MS", "soon")]),
        )
        .unwrap_err();
        assert!(matches!(err, PlaybackError::Config(_)));
    }

    #[test]
    fn validate_rejects_empty_key() {
        let config = PlayerConfig {
            storage_key: "  ".into(),
            ..PlayerConfig::default()
        };
        assert!(matches!(config.validate(), Err(PlaybackError::Config(_))));
    }

    #[test]
    fn validate_rejects_zero_buffers() {
        let config = PlayerConfig {
            command_buffer: 0,
            ..PlayerConfig::default()
        };
        assert!(config.validate().is_err());
    }
}

//! Error types for playback management
//!
//! Transport operations never fail to their caller: engine and store
//! failures are recorded on the playback status instead. These errors cover
//! the edges around the state machine: configuration, snapshot decoding and
//! the service channel.

use thiserror::Error;

/// Playback errors
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// Configuration could not be loaded or is invalid
    #[error("Configuration error: {0}")]
    Config(String),

    /// Snapshot blob could not be encoded or decoded
    #[error("Snapshot codec error: {0}")]
    Snapshot(#[from] serde_json::Error),

    /// Snapshot was written by an unknown format version
    #[error("Unsupported snapshot version: {0}")]
    UnsupportedSnapshotVersion(u32),

    /// Error bubbled up from the core crate
    #[error(transparent)]
    Core(#[from] encore_core::EncoreError),

    /// The player service has shut down
    #[error("Player service stopped")]
    ServiceStopped,
}

impl From<config::ConfigError> for PlaybackError {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

/// Result type for playback operations
pub type Result<T> = std::result::Result<T, PlaybackError>;

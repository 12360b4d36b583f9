/// Core error types for Encore
use thiserror::Error;

use crate::types::SongId;

/// Result type alias using `EncoreError`
pub type Result<T> = std::result::Result<T, EncoreError>;

/// Core error type for Encore
#[derive(Error, Debug)]
pub enum EncoreError {
    /// Audio engine failures (load, play, pause, seek, loop flag)
    #[error("Audio engine error: {0}")]
    Engine(String),

    /// Key-value storage failures
    #[error("Storage error: {0}")]
    Storage(String),

    /// Song has no usable playable URL
    #[error("No playable URL found for track {0}")]
    UnresolvableTrack(SongId),

    /// Engine handle is unknown or already unloaded
    #[error("Engine handle not loaded: {0}")]
    HandleNotLoaded(u64),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Serialization errors
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    /// I/O errors
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Other errors
    #[error("{0}")]
    Other(String),
}

impl EncoreError {
    /// Create an audio engine error
    pub fn engine(msg: impl Into<String>) -> Self {
        Self::Engine(msg.into())
    }

    /// Create a storage error
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unresolvable_track_message_names_the_song() {
        let err = EncoreError::UnresolvableTrack(SongId::new("abc"));
        assert_eq!(err.to_string(), "No playable URL found for track abc");
    }

    #[test]
    fn helpers_wrap_messages() {
        assert_eq!(
            EncoreError::engine("decoder crashed").to_string(),
            "Audio engine error: decoder crashed"
        );
        assert!(matches!(EncoreError::storage("disk full"), EncoreError::Storage(_)));
    }
}

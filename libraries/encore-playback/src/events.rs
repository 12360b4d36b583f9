//! Playback Events
//!
//! Event-based communication for UI synchronization. The manager queues
//! events as it works and hands them out through
//! [`crate::PlaybackManager::drain_events`]:
//! - Transport state changes (loading/playing/paused/stopped)
//! - Track changes once a load has been applied
//! - Queue edits and mode toggles
//! - Position updates mirrored from the engine
//! - Errors recorded on the status

use encore_core::{RepeatMode, SongId};
use serde::{Deserialize, Serialize};

/// Events emitted by the playback system
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PlaybackEvent {
    /// Transport state changed
    StateChanged {
        /// The new playback state
        state: PlaybackStateEvent,
    },

    /// A load was requested for the song at `index`
    LoadStarted {
        /// Queue index being loaded
        index: usize,
        /// ID of the song being loaded
        song_id: SongId,
    },

    /// The latest load completed and its handle is now the loaded one
    TrackChanged {
        /// Current queue index
        index: usize,
        /// ID of the new (current) song
        song_id: SongId,
    },

    /// Engine reported the end of the loaded song
    TrackFinished {
        /// ID of the finished song
        song_id: SongId,
    },

    /// Position update mirrored from the engine
    PositionUpdate {
        /// Current playback position
        position_ms: u64,
        /// Total song duration
        duration_ms: u64,
    },

    /// Queue changed (replaced, edited, reordered or pointer moved)
    QueueChanged {
        /// New queue length
        length: usize,
        /// Current index after the change
        current_index: usize,
    },

    /// Shuffle toggled
    ShuffleChanged {
        /// Whether shuffle is now on
        enabled: bool,
    },

    /// Repeat mode cycled
    RepeatChanged {
        /// New repeat mode
        mode: RepeatMode,
    },

    /// `next` ran past the last entry with repeat off
    QueueEnded,

    /// Error recorded on the playback status
    Error {
        /// Error message
        message: String,
    },
}

/// Playback state for events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaybackStateEvent {
    /// No song loaded
    Stopped,
    /// Currently loading a song
    Loading,
    /// Playing audio
    Playing,
    /// Paused mid-song
    Paused,
}

impl PlaybackStateEvent {
    /// Derive the transport state from the loading/loaded/playing flags
    pub fn derive(is_loading: bool, is_loaded: bool, is_playing: bool) -> Self {
        if is_loading {
            Self::Loading
        } else if !is_loaded {
            Self::Stopped
        } else if is_playing {
            Self::Playing
        } else {
            Self::Paused
        }
    }
}

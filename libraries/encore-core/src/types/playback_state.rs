/// Playback state types: repeat policy, transient status and the persisted snapshot
use serde::{Deserialize, Serialize};

use super::Song;

/// Repeat mode for playback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepeatMode {
    /// Stop when the queue ends
    #[default]
    Off,
    /// Loop the current track
    One,
    /// Loop the entire queue
    All,
}

impl RepeatMode {
    /// Convert to string representation
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::One => "one",
            Self::All => "all",
        }
    }

    /// Parse from string
    #[must_use]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "off" => Some(Self::Off),
            "one" => Some(Self::One),
            "all" => Some(Self::All),
            _ => None,
        }
    }

    /// Next mode in the off → one → all → off cycle
    #[must_use]
    pub fn cycle(self) -> Self {
        match self {
            Self::Off => Self::One,
            Self::One => Self::All,
            Self::All => Self::Off,
        }
    }

    /// Whether the engine's native loop flag should be set
    #[must_use]
    pub fn loops_track(self) -> bool {
        self == Self::One
    }
}

impl std::fmt::Display for RepeatMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Transient playback status mirrored from the audio engine
///
/// Never persisted. Starts zeroed on every launch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackStatus {
    /// Engine reports audio is playing
    pub is_playing: bool,

    /// Current position in milliseconds
    pub position_ms: u64,

    /// Duration of the loaded track in milliseconds (0 when unknown)
    pub duration_ms: u64,

    /// A load has been requested and has not resolved yet
    pub is_loading: bool,

    /// Last user-visible failure, if any
    pub last_error: Option<String>,
}

impl PlaybackStatus {
    /// Reset the engine-mirrored fields, keeping loading state and error
    pub fn reset_progress(&mut self) {
        self.is_playing = false;
        self.position_ms = 0;
        self.duration_ms = 0;
    }

    /// Whether every field is back to its launch value
    pub fn is_zeroed(&self) -> bool {
        *self == Self::default()
    }
}

/// The subset of player state that survives restarts
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedSnapshot {
    /// Queue in playback order
    #[serde(default)]
    pub queue: Vec<Song>,

    /// Index of the current track
    #[serde(default)]
    pub current_index: usize,

    /// Shuffle selection policy
    #[serde(default)]
    pub shuffle_on: bool,

    /// Repeat policy
    #[serde(default)]
    pub repeat_mode: RepeatMode,
}

impl PersistedSnapshot {
    /// Clamp the current index into the queue bounds
    ///
    /// An empty queue always yields index 0.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        self.current_index = self
            .current_index
            .min(self.queue.len().saturating_sub(1));
        self
    }
}

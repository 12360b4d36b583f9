/// Audio engine status types
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use super::EngineHandle;

/// Options passed to the engine when loading a track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadOptions {
    /// Start playback as soon as the resource is ready
    pub autoplay: bool,

    /// Engine-native looping of the single loaded track
    pub looping: bool,
}

/// One status notification from the audio engine
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineStatus {
    /// The resource is loaded; reports with `false` carry no position data
    pub is_loaded: bool,

    /// Audio is currently audible
    pub is_playing: bool,

    /// Position in milliseconds
    pub position_ms: u64,

    /// Duration in milliseconds (0 when unknown, e.g. live streams)
    pub duration_ms: u64,

    /// Playback reached the natural end of the track
    pub did_just_finish: bool,
}

impl EngineStatus {
    /// A regular progress update for a loaded resource
    pub fn progress(is_playing: bool, position_ms: u64, duration_ms: u64) -> Self {
        Self {
            is_loaded: true,
            is_playing,
            position_ms,
            duration_ms,
            did_just_finish: false,
        }
    }

    /// The completion notification for a track of the given duration
    pub fn finished(duration_ms: u64) -> Self {
        Self {
            is_loaded: true,
            is_playing: false,
            position_ms: duration_ms,
            duration_ms,
            did_just_finish: true,
        }
    }
}

/// A status notification tagged with the resource it refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusReport {
    /// Resource the status belongs to
    pub handle: EngineHandle,

    /// Reported status
    pub status: EngineStatus,
}

/// Callback registration handed to the engine on load
///
/// The engine pushes every status update for the loaded resource through the
/// sink. Delivery never blocks; reports sent after the receiving player has
/// shut down are dropped.
#[derive(Debug, Clone)]
pub struct StatusSink {
    tx: mpsc::UnboundedSender<StatusReport>,
}

impl StatusSink {
    /// Create a sink and the receiver the player drains
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<StatusReport>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Deliver a status update for `handle`
    ///
    /// Returns `false` once the receiving side is gone.
    pub fn report(&self, handle: EngineHandle, status: EngineStatus) -> bool {
        self.tx.send(StatusReport { handle, status }).is_ok()
    }
}

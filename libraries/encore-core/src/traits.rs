/// Capability traits consumed by the playback core
use async_trait::async_trait;

use crate::error::Result;
use crate::types::{EngineHandle, LoadOptions, StatusSink};

/// Audio engine adapter
///
/// Implementers wrap the platform player (AVPlayer, ExoPlayer, a desktop
/// decoder, ...). The playback core treats it as a black box: it loads one
/// resource at a time and drives it through these calls.
///
/// Every method may suspend. None of them may block the calling task
/// indefinitely on purpose, but the core applies no timeout.
#[async_trait]
pub trait AudioEngine: Send + Sync {
    /// Configure the platform audio session (background playback, silent
    /// mode, ducking)
    ///
    /// Called once before the first load. The default does nothing.
    ///
    /// # Errors
    /// Returns an error if the platform refuses the session configuration
    async fn prepare(&self) -> Result<()> {
        Ok(())
    }

    /// Load `url` and return a handle to the new resource
    ///
    /// `sink` is the status-callback registration: the engine must push
    /// position updates and the completion notification for the returned
    /// handle through it.
    ///
    /// # Errors
    /// Returns an error if the resource cannot be opened
    async fn load(&self, url: &str, options: LoadOptions, sink: StatusSink)
        -> Result<EngineHandle>;

    /// Start or resume playback
    async fn play(&self, handle: EngineHandle) -> Result<()>;

    /// Pause playback
    async fn pause(&self, handle: EngineHandle) -> Result<()>;

    /// Move the play head to `position_ms`
    async fn seek(&self, handle: EngineHandle, position_ms: u64) -> Result<()>;

    /// Toggle engine-native looping of the loaded resource
    async fn set_looping(&self, handle: EngineHandle, looping: bool) -> Result<()>;

    /// Release the resource
    async fn unload(&self, handle: EngineHandle) -> Result<()>;
}

/// Key-value persistence adapter
///
/// Values are opaque byte blobs; callers own the encoding.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`
    ///
    /// # Errors
    /// Returns an error if the backing store cannot be read
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Store `value` under `key`, replacing any previous value
    ///
    /// # Errors
    /// Returns an error if the backing store cannot be written
    async fn set(&self, key: &str, value: &[u8]) -> Result<()>;
}

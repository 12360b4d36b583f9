//! Encore - Playback Management
//!
//! Platform-agnostic playback state machine for Encore.
//!
//! This crate provides:
//! - An ordered queue with a current-song pointer that survives edits
//! - Shuffle (random different index) and repeat modes (Off, One, All)
//! - Transport control over an abstract [`encore_core::AudioEngine`]
//! - Supersession of in-flight loads: only the newest load is applied
//! - Mirroring of engine status reports, including end-of-song handling
//! - Snapshot persistence through an [`encore_core::KeyValueStore`]
//! - An actor service with a cloneable handle for UI surfaces
//!
//! # Architecture
//!
//! `encore-playback` knows nothing about the platform:
//! - No dependency on a specific audio player
//! - No dependency on a specific database
//! - No UI code
//!
//! Platform-specific code (audio output, storage) is provided via traits.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use encore_core::{AudioEngine, KeyValueStore, Song};
//! use encore_playback::{PlaybackManager, PlayerConfig, PlayerService};
//!
//! # async fn example(engine: Arc<dyn AudioEngine>, store: Arc<dyn KeyValueStore>) -> encore_playback::Result<()> {
//! let manager = PlaybackManager::hydrate(engine, store, PlayerConfig::default()).await;
//! let (player, _task) = PlayerService::spawn(manager);
//!
//! let song = Song::new("1", "Song").with_source("https://cdn.example.com/1.mp3");
//! player.set_queue_and_play(vec![song], None).await?;
//! player.toggle_play_pause().await?;
//! player.shutdown().await?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod events;
pub mod manager;
pub mod mirror;
pub mod persistence;
pub mod queue;
pub mod service;
pub mod shuffle;

pub use config::PlayerConfig;
pub use error::{PlaybackError, Result};
pub use events::{PlaybackEvent, PlaybackStateEvent};
pub use manager::{ManagerInput, PlaybackManager};
pub use queue::{Queue, Removal};
pub use service::{PlayerHandle, PlayerService, PlayerView};

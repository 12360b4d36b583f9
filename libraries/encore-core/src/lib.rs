//! Encore Core
//!
//! Platform-agnostic types, capability traits, and error handling for Encore.
//!
//! This crate provides the building blocks shared by the playback core and
//! the persistence adapters.
//!
//! # Architecture
//!
//! The core crate defines:
//! - **Domain Types**: `Song`, `RepeatMode`, `PlaybackStatus`, `PersistedSnapshot`
//! - **Capability Traits**: `AudioEngine`, `KeyValueStore`
//! - **Ingestion**: `catalog` turns loosely-shaped catalog JSON into `Song`
//! - **Error Handling**: Unified `EncoreError` and `Result` types
//!
//! # Example
//!
//! ```rust
//! use encore_core::catalog::normalize_song;
//! use serde_json::json;
//!
//! let song = normalize_song(&json!({
//!     "id": "42",
//!     "name": "Intro",
//!     "downloadUrl": [{ "url": "https://cdn.example.com/intro-96.mp4" }]
//! }))
//! .unwrap();
//!
//! assert_eq!(song.playable_url(), Some("https://cdn.example.com/intro-96.mp4"));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod catalog;
pub mod error;
pub mod time;
pub mod traits;
pub mod types;

// Re-export commonly used types
pub use error::{EncoreError, Result};
pub use traits::{AudioEngine, KeyValueStore};

pub use types::{
    EngineHandle, EngineStatus, LoadOptions, PersistedSnapshot, PlaybackStatus, RepeatMode, Song,
    SongId, StatusReport, StatusSink,
};

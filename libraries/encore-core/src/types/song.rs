//! Canonical song record

use serde::{Deserialize, Serialize};
use url::Url;

use super::SongId;

/// URL schemes the audio engine can open
const PLAYABLE_SCHEMES: &[&str] = &["http", "https", "file"];

/// A song as the playback core sees it
///
/// Songs are produced once at ingestion (see [`crate::catalog`]) and never
/// re-interpreted afterwards. The core only relies on the identity and on
/// [`Song::playable_url`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Song {
    /// Stable catalog identifier
    pub id: SongId,

    /// Display name
    pub name: String,

    /// Artist credit, already joined for display
    pub artists: String,

    /// Artwork reference (usually an image URL)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artwork: Option<String>,

    /// Candidate audio URLs in order of preference
    #[serde(default)]
    pub sources: Vec<String>,
}

impl Song {
    /// Create a song with no artwork and no sources
    pub fn new(id: impl Into<SongId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            artists: String::new(),
            artwork: None,
            sources: Vec::new(),
        }
    }

    /// Set the artist credit
    #[must_use]
    pub fn with_artists(mut self, artists: impl Into<String>) -> Self {
        self.artists = artists.into();
        self
    }

    /// Set the artwork reference
    #[must_use]
    pub fn with_artwork(mut self, artwork: impl Into<String>) -> Self {
        self.artwork = Some(artwork.into());
        self
    }

    /// Append a candidate source URL
    #[must_use]
    pub fn with_source(mut self, url: impl Into<String>) -> Self {
        self.sources.push(url.into());
        self
    }

    /// First candidate source the engine can open, if any
    pub fn playable_url(&self) -> Option<&str> {
        self.sources
            .iter()
            .map(|s| s.trim())
            .find(|s| is_playable(s))
    }

    /// Whether this song can be handed to the audio engine
    pub fn is_playable(&self) -> bool {
        self.playable_url().is_some()
    }
}

fn is_playable(candidate: &str) -> bool {
    if candidate.is_empty() {
        return false;
    }
    Url::parse(candidate)
        .map(|url| PLAYABLE_SCHEMES.contains(&url.scheme()))
        .unwrap_or(false)
}

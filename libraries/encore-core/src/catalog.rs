//! Catalog record normalization
//!
//! Search backends wrap the same catalog in different JSON shapes: the song
//! id may live under `id`, `songId` or `_id`, the audio under `audioUrl`,
//! `mediaUrl`, `url` or a `downloadUrl` that is a string, an object or a list
//! of quality variants. This module is the single place where those shapes
//! are interpreted. Everything downstream works with [`Song`].

use serde_json::Value;

use crate::types::{Song, SongId};

const ID_KEYS: &[&str] = &["id", "songId", "_id"];
const NAME_KEYS: &[&str] = &["name", "title"];
const DIRECT_SOURCE_KEYS: &[&str] = &["audioUrl", "mediaUrl", "url"];
const FALLBACK_SOURCE_KEYS: &[&str] = &["songUrl", "streamUrl"];
const LINK_KEYS: &[&str] = &["url", "link", "uri"];
const UNKNOWN: &str = "Unknown";

/// Normalize one catalog record into a [`Song`]
///
/// Returns `None` when the record carries no usable identifier. Records
/// without a playable source are still returned; check
/// [`Song::is_playable`] before queueing them.
pub fn normalize_song(record: &Value) -> Option<Song> {
    let id = ID_KEYS
        .iter()
        .find_map(|key| record.get(*key).and_then(scalar_string))?;

    let name = NAME_KEYS
        .iter()
        .find_map(|key| record.get(*key).and_then(non_empty_str))
        .unwrap_or(UNKNOWN);

    Some(Song {
        id: SongId::new(id),
        name: name.to_string(),
        artists: artists(record),
        artwork: artwork(record),
        sources: sources(record),
    })
}

/// Normalize a search response into playable songs
///
/// Accepts `{ "data": { "results": [...] } }`, `{ "results": [...] }` or a
/// bare array. Records that cannot be identified or played are dropped.
pub fn normalize_search_results(response: &Value) -> Vec<Song> {
    let records = response
        .pointer("/data/results")
        .or_else(|| response.get("results"))
        .unwrap_or(response);

    records
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(normalize_song)
                .filter(Song::is_playable)
                .collect()
        })
        .unwrap_or_default()
}

fn artists(record: &Value) -> String {
    if let Some(primary) = record.get("primaryArtists").and_then(non_empty_str) {
        return primary.to_string();
    }

    if let Some(primary) = record.pointer("/artists/primary").and_then(Value::as_array) {
        let names: Vec<&str> = primary
            .iter()
            .filter_map(|artist| artist.get("name").and_then(non_empty_str))
            .collect();
        if !names.is_empty() {
            return names.join(", ");
        }
    }

    record
        .get("artists")
        .and_then(non_empty_str)
        .unwrap_or(UNKNOWN)
        .to_string()
}

fn artwork(record: &Value) -> Option<String> {
    if let Some(url) = record.get("imageUrl").and_then(non_empty_str) {
        return Some(url.to_string());
    }

    match record.get("image")? {
        Value::Array(variants) => variants.last().and_then(link_of),
        other => link_of(other),
    }
}

fn sources(record: &Value) -> Vec<String> {
    let mut found: Vec<String> = Vec::new();

    for key in DIRECT_SOURCE_KEYS {
        if let Some(url) = record.get(*key).and_then(non_empty_str) {
            found.push(url.to_string());
        }
    }

    match record.get("downloadUrl") {
        Some(Value::Array(variants)) => {
            // Variants are ordered by ascending quality.
            found.extend(variants.iter().rev().filter_map(link_of));
        }
        Some(other) => found.extend(link_of(other)),
        None => {}
    }

    for key in FALLBACK_SOURCE_KEYS {
        if let Some(url) = record.get(*key).and_then(non_empty_str) {
            found.push(url.to_string());
        }
    }

    let mut unique = Vec::with_capacity(found.len());
    for url in found {
        if !unique.contains(&url) {
            unique.push(url);
        }
    }
    unique
}

/// A link given either as a plain string or as an object with a link field
fn link_of(value: &Value) -> Option<String> {
    match value {
        Value::String(_) => non_empty_str(value).map(str::to_string),
        Value::Object(map) => LINK_KEYS
            .iter()
            .find_map(|key| map.get(*key).and_then(non_empty_str))
            .map(str::to_string),
        _ => None,
    }
}

fn non_empty_str(value: &Value) -> Option<&str> {
    value.as_str().map(str::trim).filter(|s| !s.is_empty())
}

fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(_) => non_empty_str(value).map(str::to_string),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

//! Catalog files on disk

use std::path::Path;

use anyhow::Context;
use encore_core::catalog::normalize_search_results;
use encore_core::Song;

/// Read a saved search response and keep its playable songs
///
/// The file may hold any response shape the catalog normalizer accepts.
pub async fn read_catalog(path: &Path) -> anyhow::Result<Vec<Song>> {
    let raw = tokio::fs::read(path)
        .await
        .with_context(|| format!("reading catalog {}", path.display()))?;
    let response: serde_json::Value = serde_json::from_slice(&raw)
        .with_context(|| format!("parsing catalog {}", path.display()))?;

    let songs = normalize_search_results(&response);
    if songs.is_empty() {
        anyhow::bail!("catalog {} has no playable songs", path.display());
    }
    tracing::info!("Read {} playable songs from {}", songs.len(), path.display());
    Ok(songs)
}

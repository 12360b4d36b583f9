//! Snapshot persistence
//!
//! The durable part of the player (queue, current index, shuffle, repeat) is
//! stored as one JSON blob under a single key:
//!
//! ```json
//! {"version":1,"state":{"queue":[...],"currentIndex":0,"shuffleOn":false,"repeatMode":"off"}}
//! ```
//!
//! Writes go through [`SnapshotWriter`], a background task that applies them
//! in submission order and never reports failures back to the transport.

use std::sync::Arc;

use encore_core::{KeyValueStore, PersistedSnapshot};
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use crate::error::{PlaybackError, Result};

/// Current snapshot format version
pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Serialize)]
struct EnvelopeRef<'a> {
    version: u32,
    state: &'a PersistedSnapshot,
}

#[derive(Deserialize)]
struct Envelope {
    version: u32,
    #[serde(default)]
    state: PersistedSnapshot,
}

/// Encode a snapshot into its versioned JSON envelope
///
/// # Errors
///
/// Returns [`PlaybackError::Snapshot`] if serialization fails
pub fn encode_snapshot(snapshot: &PersistedSnapshot) -> Result<Vec<u8>> {
    let envelope = EnvelopeRef {
        version: SNAPSHOT_VERSION,
        state: snapshot,
    };
    Ok(serde_json::to_vec(&envelope)?)
}

/// Decode a versioned envelope, clamping the index into the queue
///
/// # Errors
///
/// Returns [`PlaybackError::Snapshot`] for malformed JSON and
/// [`PlaybackError::UnsupportedSnapshotVersion`] for unknown versions
pub fn decode_snapshot(bytes: &[u8]) -> Result<PersistedSnapshot> {
    let envelope: Envelope = serde_json::from_slice(bytes)?;
    if envelope.version != SNAPSHOT_VERSION {
        return Err(PlaybackError::UnsupportedSnapshotVersion(envelope.version));
    }
    Ok(envelope.state.normalized())
}

/// Read the snapshot stored under `key`
///
/// Missing, unreadable and undecodable snapshots all yield `None`; the player
/// then starts empty.
pub async fn load_snapshot(store: &dyn KeyValueStore, key: &str) -> Option<PersistedSnapshot> {
    let bytes = match store.get(key).await {
        Ok(Some(bytes)) => bytes,
        Ok(None) => {
            debug!("No persisted snapshot under {}", key);
            return None;
        }
        Err(e) => {
            warn!("Failed to read snapshot {}: {}", key, e);
            return None;
        }
    };

    match decode_snapshot(&bytes) {
        Ok(snapshot) => Some(snapshot),
        Err(e) => {
            warn!("Discarding unreadable snapshot {}: {}", key, e);
            None
        }
    }
}

enum WriterMessage {
    Save(PersistedSnapshot),
    Flush(oneshot::Sender<()>),
}

/// Background writer for player snapshots
///
/// Saves are fire-and-forget. Consecutive saves that queue up while a write
/// is in progress collapse into the newest one, so the store always ends on
/// the latest state.
#[derive(Debug, Clone)]
pub struct SnapshotWriter {
    tx: mpsc::UnboundedSender<WriterMessage>,
}

impl SnapshotWriter {
    /// Spawn the writer task on the current Tokio runtime
    pub fn spawn(store: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(run_writer(store, key.into(), rx));
        Self { tx }
    }

    /// Queue `snapshot` for writing
    pub fn save(&self, snapshot: PersistedSnapshot) {
        if self.tx.send(WriterMessage::Save(snapshot)).is_err() {
            warn!("Snapshot writer is gone; dropping save");
        }
    }

    /// Wait until every save queued before this call has been attempted
    pub async fn flush(&self) {
        let (ack_tx, ack_rx) = oneshot::channel();
        if self.tx.send(WriterMessage::Flush(ack_tx)).is_err() {
            return;
        }
        let _ = ack_rx.await;
    }
}

async fn run_writer(
    store: Arc<dyn KeyValueStore>,
    key: String,
    mut rx: mpsc::UnboundedReceiver<WriterMessage>,
) {
    while let Some(message) = rx.recv().await {
        match message {
            WriterMessage::Save(mut snapshot) => {
                let mut ack = None;
                while let Ok(queued) = rx.try_recv() {
                    match queued {
                        WriterMessage::Save(newer) => snapshot = newer,
                        WriterMessage::Flush(tx) => {
                            ack = Some(tx);
                            break;
                        }
                    }
                }

                write_snapshot(store.as_ref(), &key, &snapshot).await;

                if let Some(tx) = ack {
                    let _ = tx.send(());
                }
            }
            WriterMessage::Flush(tx) => {
                let _ = tx.send(());
            }
        }
    }
    debug!("Snapshot writer for {} stopped", key);
}

async fn write_snapshot(store: &dyn KeyValueStore, key: &str, snapshot: &PersistedSnapshot) {
    let bytes = match encode_snapshot(snapshot) {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!("Failed to encode snapshot: {}", e);
            return;
        }
    };

    if let Err(e) = store.set(key, &bytes).await {
        warn!("Failed to persist snapshot {}: {}", key, e);
    }
}

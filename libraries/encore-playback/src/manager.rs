//! Playback manager - core orchestration
//!
//! Owns the queue, the transport modes and the mirrored engine status, and
//! drives an [`AudioEngine`] through them.
//!
//! # Loads
//!
//! Loading a song never blocks the manager. Each load runs on its own task
//! and carries a generation number; only the outcome of the newest load is
//! applied. A superseded load that still produced a resource is unloaded as
//! soon as its outcome arrives, so at most one resource stays loaded. A load
//! that completes after the manager is dropped unloads its own resource.
//!
//! # Inputs
//!
//! Load outcomes and engine status reports arrive on internal channels.
//! Whoever owns the manager pulls them with [`PlaybackManager::next_input`]
//! and feeds them back through [`PlaybackManager::handle_input`]
//! ([`crate::PlayerService`] does this in its event loop), or drains
//! everything outstanding with [`PlaybackManager::settle`].
//!
//! Engines may report status for a new resource before its load result is
//! delivered. While a load is pending such reports are held back and
//! replayed once the load is accepted.

use std::sync::Arc;

use encore_core::{
    AudioEngine, EncoreError, EngineHandle, KeyValueStore, LoadOptions, PersistedSnapshot,
    PlaybackStatus, RepeatMode, Song, SongId, StatusReport, StatusSink,
};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::{
    config::PlayerConfig,
    events::{PlaybackEvent, PlaybackStateEvent},
    mirror::{MirrorAction, StatusMirror},
    persistence::{self, SnapshotWriter},
    queue::Queue,
    shuffle,
};

/// Result of a load task
#[derive(Debug)]
pub struct LoadOutcome {
    generation: u64,
    song_id: SongId,
    looping: bool,
    result: encore_core::Result<EngineHandle>,
}

/// Something the manager has to react to
#[derive(Debug)]
pub enum ManagerInput {
    /// A load task finished
    Load(LoadOutcome),
    /// The engine reported status for some resource
    Status(StatusReport),
}

/// Playback manager
pub struct PlaybackManager {
    config: PlayerConfig,

    // Durable state
    queue: Queue,
    shuffle_on: bool,
    repeat: RepeatMode,

    // Transient state
    status: PlaybackStatus,
    mirror: StatusMirror,

    engine: Arc<dyn AudioEngine>,
    engine_prepared: bool,
    loaded: Option<EngineHandle>,

    // Load supersession
    generation: u64,
    pending_loads: usize,
    load_tx: mpsc::UnboundedSender<LoadOutcome>,
    load_rx: mpsc::UnboundedReceiver<LoadOutcome>,

    status_sink: StatusSink,
    status_rx: mpsc::UnboundedReceiver<StatusReport>,
    // Reports that raced ahead of the pending load's result
    early_reports: Vec<StatusReport>,

    writer: Option<SnapshotWriter>,
    rng: Box<dyn RngCore + Send + Sync>,

    // Event queue for UI synchronization
    pending_events: Vec<PlaybackEvent>,
    last_state: PlaybackStateEvent,
}

impl std::fmt::Debug for PlaybackManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackManager")
            .field("queue_len", &self.queue.len())
            .field("current_index", &self.queue.current_index())
            .field("shuffle_on", &self.shuffle_on)
            .field("repeat", &self.repeat)
            .field("status", &self.status)
            .field("loaded", &self.loaded)
            .field("generation", &self.generation)
            .finish_non_exhaustive()
    }
}

impl PlaybackManager {
    /// Create a manager with an empty queue
    ///
    /// Must be called inside a Tokio runtime when `config.persist` is set,
    /// since the snapshot writer is spawned here.
    pub fn new(
        engine: Arc<dyn AudioEngine>,
        store: Arc<dyn KeyValueStore>,
        config: PlayerConfig,
    ) -> Self {
        let (load_tx, load_rx) = mpsc::unbounded_channel();
        let (status_sink, status_rx) = StatusSink::channel();

        let writer = config
            .persist
            .then(|| SnapshotWriter::spawn(store, config.storage_key.clone()));

        Self {
            config,
            queue: Queue::new(),
            shuffle_on: false,
            repeat: RepeatMode::Off,
            status: PlaybackStatus::default(),
            mirror: StatusMirror::new(),
            engine,
            engine_prepared: false,
            loaded: None,
            generation: 0,
            pending_loads: 0,
            load_tx,
            load_rx,
            status_sink,
            status_rx,
            early_reports: Vec::new(),
            writer,
            rng: Box::new(StdRng::from_entropy()),
            pending_events: Vec::new(),
            last_state: PlaybackStateEvent::Stopped,
        }
    }

    /// Create a manager and restore the persisted snapshot, if any
    ///
    /// Only the durable fields are restored; nothing is loaded into the
    /// engine until a transport operation asks for it.
    pub async fn hydrate(
        engine: Arc<dyn AudioEngine>,
        store: Arc<dyn KeyValueStore>,
        config: PlayerConfig,
    ) -> Self {
        let snapshot = if config.persist {
            persistence::load_snapshot(store.as_ref(), &config.storage_key).await
        } else {
            None
        };

        let mut manager = Self::new(engine, store, config);
        if let Some(snapshot) = snapshot {
            info!(
                "Restored queue of {} songs at index {}",
                snapshot.queue.len(),
                snapshot.current_index
            );
            manager.restore(snapshot);
        }
        manager
    }

    /// Replace the random source used by shuffle
    #[must_use]
    pub fn with_rng(mut self, rng: impl RngCore + Send + Sync + 'static) -> Self {
        self.rng = Box::new(rng);
        self
    }

    fn restore(&mut self, snapshot: PersistedSnapshot) {
        let snapshot = snapshot.normalized();
        self.queue = Queue::from_parts(snapshot.queue, snapshot.current_index);
        self.shuffle_on = snapshot.shuffle_on;
        self.repeat = snapshot.repeat_mode;
    }

    // ===== Queue Replacement =====

    /// Replace the queue with `songs` and start playing at `start`
    ///
    /// `start` defaults to 0 and is clamped into the new queue. An empty
    /// list is ignored.
    pub async fn set_queue_and_play(&mut self, songs: Vec<Song>, start: Option<usize>) {
        if !self.queue.replace(songs, start.unwrap_or(0)) {
            debug!("Ignoring empty queue replacement");
            return;
        }

        self.queue_changed();
        self.load_and_play(self.queue.current_index()).await;
    }

    /// Replace the queue with a single song and play it
    pub async fn play_single(&mut self, song: Song) {
        self.set_queue_and_play(vec![song], Some(0)).await;
    }

    /// Append songs to the end of the queue without touching playback
    pub fn enqueue(&mut self, songs: Vec<Song>) {
        if songs.is_empty() {
            return;
        }
        self.queue.append(songs);
        self.queue_changed();
    }

    // ===== Playback Control =====

    /// Toggle between playing and paused
    ///
    /// With nothing loaded this loads the current song. While a load is in
    /// flight it does nothing. The playing flag is not flipped here; it
    /// follows the engine's next status report.
    pub async fn toggle_play_pause(&mut self) {
        match self.loaded {
            None => self.start_current().await,
            Some(handle) if self.status.is_playing => self.pause_handle(handle).await,
            Some(handle) => self.resume_handle(handle).await,
        }
    }

    /// Start or resume playback
    pub async fn play(&mut self) {
        match self.loaded {
            None => self.start_current().await,
            Some(handle) => self.resume_handle(handle).await,
        }
    }

    /// Pause playback
    pub async fn pause(&mut self) {
        if let Some(handle) = self.loaded {
            self.pause_handle(handle).await;
        }
    }

    /// Stop playback
    ///
    /// Unloads the current resource and resets the status (but not the queue)
    pub async fn stop(&mut self) {
        self.release_engine().await;
    }

    /// Skip to next song
    ///
    /// Shuffle picks a random different index. Otherwise the queue is walked
    /// in order; past the end it wraps with repeat-all and stops with the
    /// queue-ended event otherwise.
    #[allow(clippy::should_implement_trait)]
    pub async fn next(&mut self) {
        if self.queue.is_empty() {
            return;
        }

        let len = self.queue.len();
        let current = self.queue.current_index();

        let target = if self.shuffle_on && len > 1 {
            Some(shuffle::pick_other_index(
                self.rng.as_mut(),
                len,
                current,
                self.config.shuffle_retry_limit,
            ))
        } else {
            self.queue.step_forward(self.repeat == RepeatMode::All)
        };

        let Some(index) = target else {
            debug!("Reached end of queue");
            self.emit(PlaybackEvent::QueueEnded);
            return;
        };

        self.queue.set_current(index);
        self.queue_changed();
        self.load_and_play(index).await;
    }

    /// Go to previous song
    ///
    /// Past the restart threshold this rewinds the current song instead.
    /// Otherwise it moves back one entry (staying at 0) and loads it.
    pub async fn prev(&mut self) {
        if self.queue.is_empty() {
            return;
        }

        if self.status.position_ms > self.config.restart_threshold_ms {
            self.seek_to(0).await;
            return;
        }

        let index = self.queue.step_back();
        self.queue.set_current(index);
        self.queue_changed();
        self.load_and_play(index).await;
    }

    /// Seek within the loaded song
    ///
    /// The target is clamped to `[0, duration]`. Does nothing when no song is
    /// loaded.
    pub async fn seek_to(&mut self, position_ms: i64) {
        let Some(handle) = self.loaded else {
            return;
        };

        let target = u64::try_from(position_ms)
            .unwrap_or(0)
            .min(self.status.duration_ms);

        match self.engine.seek(handle, target).await {
            Ok(()) => {
                self.status.position_ms = target;
                self.emit_position();
            }
            Err(e) => self.fail(format!("Seek failed: {e}")),
        }
    }

    /// Jump to `index` and play it
    pub async fn skip_to(&mut self, index: usize) {
        if !self.queue.set_current(index) {
            debug!("Ignoring skip to out-of-range index {}", index);
            return;
        }
        self.queue_changed();
        self.load_and_play(index).await;
    }

    // ===== Modes =====

    /// Flip shuffle
    pub fn toggle_shuffle(&mut self) {
        self.shuffle_on = !self.shuffle_on;
        self.emit(PlaybackEvent::ShuffleChanged {
            enabled: self.shuffle_on,
        });
        self.persist();
    }

    /// Advance repeat mode off → one → all → off
    ///
    /// The loaded resource's loop flag is updated to match.
    pub async fn cycle_repeat(&mut self) {
        self.repeat = self.repeat.cycle();
        self.emit(PlaybackEvent::RepeatChanged { mode: self.repeat });
        self.persist();

        if let Some(handle) = self.loaded {
            if let Err(e) = self
                .engine
                .set_looping(handle, self.repeat.loops_track())
                .await
            {
                self.fail(format!("Failed to update looping: {e}"));
            }
        }
    }

    // ===== Queue Editing =====

    /// Swap the entry at `index` with the one above it
    pub fn move_up(&mut self, index: usize) {
        if self.queue.move_up(index) {
            self.queue_changed();
        }
    }

    /// Swap the entry at `index` with the one below it
    pub fn move_down(&mut self, index: usize) {
        if self.queue.move_down(index) {
            self.queue_changed();
        }
    }

    /// Move the entry at `from` to `to`
    pub fn move_item(&mut self, from: usize, to: usize) {
        if self.queue.move_item(from, to) {
            self.queue_changed();
        }
    }

    /// Remove the entry at `index`
    ///
    /// Removing the current entry starts the song that takes its place, or
    /// unloads the engine if the queue is now empty.
    pub async fn remove_at(&mut self, index: usize) {
        let Some(removal) = self.queue.remove(index) else {
            return;
        };
        debug!("Removed {} from queue", removal.song.id);
        self.queue_changed();

        if !removal.was_current {
            return;
        }

        if self.queue.is_empty() {
            self.release_engine().await;
        } else {
            self.load_and_play(self.queue.current_index()).await;
        }
    }

    /// Remove every song and unload the engine
    pub async fn clear_queue(&mut self) {
        self.queue.clear();
        self.queue_changed();
        self.release_engine().await;
    }

    // ===== State Queries =====

    /// Songs in playback order
    pub fn queue(&self) -> &[Song] {
        self.queue.songs()
    }

    /// Index of the current song
    pub fn current_index(&self) -> usize {
        self.queue.current_index()
    }

    /// Song at the current index
    pub fn current_song(&self) -> Option<&Song> {
        self.queue.current()
    }

    /// Whether shuffle is on
    pub fn shuffle_on(&self) -> bool {
        self.shuffle_on
    }

    /// Current repeat mode
    pub fn repeat_mode(&self) -> RepeatMode {
        self.repeat
    }

    /// Mirrored playback status
    pub fn status(&self) -> &PlaybackStatus {
        &self.status
    }

    /// Handle of the loaded resource
    pub fn loaded_handle(&self) -> Option<EngineHandle> {
        self.loaded
    }

    /// Whether a resource is loaded in the engine
    pub fn is_loaded(&self) -> bool {
        self.loaded.is_some()
    }

    /// Whether `next` would load something
    pub fn has_next(&self) -> bool {
        let len = self.queue.len();
        if len == 0 {
            return false;
        }
        (self.shuffle_on && len > 1)
            || self.repeat == RepeatMode::All
            || self.queue.current_index() + 1 < len
    }

    /// Durable part of the state
    pub fn snapshot(&self) -> PersistedSnapshot {
        PersistedSnapshot {
            queue: self.queue.songs().to_vec(),
            current_index: self.queue.current_index(),
            shuffle_on: self.shuffle_on,
            repeat_mode: self.repeat,
        }
    }

    /// Configuration in use
    pub fn config(&self) -> &PlayerConfig {
        &self.config
    }

    /// Take queued events
    ///
    /// A `StateChanged` event is appended when the derived transport state
    /// differs from the last one handed out.
    pub fn drain_events(&mut self) -> Vec<PlaybackEvent> {
        let state = PlaybackStateEvent::derive(
            self.status.is_loading,
            self.loaded.is_some(),
            self.status.is_playing,
        );
        if state != self.last_state {
            self.last_state = state;
            self.pending_events
                .push(PlaybackEvent::StateChanged { state });
        }
        std::mem::take(&mut self.pending_events)
    }

    // ===== Inputs =====

    /// Wait for the next load outcome or status report
    ///
    /// Cancel safe: dropping the future loses nothing.
    pub async fn next_input(&mut self) -> ManagerInput {
        tokio::select! {
            biased;
            Some(outcome) = self.load_rx.recv() => ManagerInput::Load(outcome),
            Some(report) = self.status_rx.recv() => ManagerInput::Status(report),
        }
    }

    /// React to an input obtained from [`PlaybackManager::next_input`]
    pub async fn handle_input(&mut self, input: ManagerInput) {
        match input {
            ManagerInput::Load(outcome) => self.apply_load(outcome).await,
            ManagerInput::Status(report) => self.handle_status(report).await,
        }
    }

    /// Handle every input that is already queued, without waiting
    pub async fn drain_ready_inputs(&mut self) {
        loop {
            if let Ok(outcome) = self.load_rx.try_recv() {
                self.apply_load(outcome).await;
            } else if let Ok(report) = self.status_rx.try_recv() {
                self.handle_status(report).await;
            } else {
                break;
            }
        }
    }

    /// Wait for every in-flight load and handle all queued inputs
    pub async fn settle(&mut self) {
        loop {
            self.drain_ready_inputs().await;
            if self.pending_loads == 0 {
                break;
            }
            if let Some(outcome) = self.load_rx.recv().await {
                self.apply_load(outcome).await;
            }
        }
    }

    /// Wait until every snapshot saved so far has been written
    pub async fn flush_persistence(&self) {
        if let Some(writer) = &self.writer {
            writer.flush().await;
        }
    }

    // ===== Internal =====

    async fn start_current(&mut self) {
        if self.status.is_loading || self.queue.is_empty() {
            return;
        }
        self.load_and_play(self.queue.current_index()).await;
    }

    async fn pause_handle(&mut self, handle: EngineHandle) {
        if let Err(e) = self.engine.pause(handle).await {
            self.fail(format!("Pause failed: {e}"));
        }
    }

    async fn resume_handle(&mut self, handle: EngineHandle) {
        if let Err(e) = self.engine.play(handle).await {
            self.fail(format!("Play failed: {e}"));
        }
    }

    async fn prepare_engine(&mut self) {
        if self.engine_prepared {
            return;
        }
        match self.engine.prepare().await {
            Ok(()) => self.engine_prepared = true,
            Err(e) => self.fail(format!("Failed to set audio mode: {e}")),
        }
    }

    /// Start loading the song at `index`, superseding any earlier load
    async fn load_and_play(&mut self, index: usize) {
        let Some(song) = self.queue.get(index) else {
            return;
        };
        let song_id = song.id.clone();

        let Some(url) = song.playable_url().map(str::to_string) else {
            self.generation += 1;
            self.status.is_loading = false;
            let err = EncoreError::UnresolvableTrack(song_id);
            self.fail(err.to_string());
            return;
        };

        self.status.last_error = None;
        self.prepare_engine().await;

        self.generation += 1;
        let generation = self.generation;
        let previous = self.loaded.take();
        let looping = self.repeat.loops_track();

        self.mirror.reset();
        self.status.reset_progress();
        self.status.is_loading = true;
        self.pending_loads += 1;
        self.early_reports.clear();

        debug!("Loading {} (generation {})", song_id, generation);
        self.emit(PlaybackEvent::LoadStarted {
            index,
            song_id: song_id.clone(),
        });

        let engine = Arc::clone(&self.engine);
        let sink = self.status_sink.clone();
        let tx = self.load_tx.clone();
        let options = LoadOptions {
            autoplay: true,
            looping,
        };

        tokio::spawn(async move {
            if let Some(handle) = previous {
                if let Err(e) = engine.unload(handle).await {
                    debug!("Ignoring unload failure for {}: {}", handle, e);
                }
            }

            let result = engine.load(&url, options, sink).await;
            let sent = tx.send(LoadOutcome {
                generation,
                song_id,
                looping,
                result,
            });

            // The player is gone, so nobody else will release this resource
            if let Err(mpsc::error::SendError(LoadOutcome { result: Ok(handle), .. })) = sent {
                debug!("Unloading {} loaded after the player stopped", handle);
                if let Err(e) = engine.unload(handle).await {
                    debug!("Ignoring unload failure for {}: {}", handle, e);
                }
            }
        });
    }

    async fn apply_load(&mut self, outcome: LoadOutcome) {
        self.pending_loads = self.pending_loads.saturating_sub(1);

        if outcome.generation != self.generation {
            if let Ok(handle) = outcome.result {
                debug!(
                    "Discarding superseded load of {} ({})",
                    outcome.song_id, handle
                );
                self.unload_quietly(handle).await;
            }
            return;
        }

        self.status.is_loading = false;
        let early = std::mem::take(&mut self.early_reports);

        match outcome.result {
            Ok(handle) => {
                self.loaded = Some(handle);
                self.status.is_playing = true;

                let looping = self.repeat.loops_track();
                if looping != outcome.looping {
                    if let Err(e) = self.engine.set_looping(handle, looping).await {
                        self.fail(format!("Failed to update looping: {e}"));
                    }
                }

                self.emit(PlaybackEvent::TrackChanged {
                    index: self.queue.current_index(),
                    song_id: outcome.song_id,
                });

                for report in early.into_iter().filter(|r| r.handle == handle) {
                    self.handle_status(report).await;
                }
            }
            Err(e) => self.fail(format!("Failed to start playback: {e}")),
        }
    }

    async fn handle_status(&mut self, report: StatusReport) {
        if self.loaded != Some(report.handle) {
            if self.status.is_loading {
                // May belong to the load in flight; sorted out in apply_load
                self.early_reports.push(report);
            } else {
                debug!("Dropping status for stale resource {}", report.handle);
            }
            return;
        }

        let before = (self.status.position_ms, self.status.duration_ms);
        let action = self
            .mirror
            .apply(&mut self.status, &report.status, self.repeat);
        if before != (self.status.position_ms, self.status.duration_ms) {
            self.emit_position();
        }

        if action == MirrorAction::None {
            return;
        }

        if let Some(song_id) = self.queue.current().map(|song| song.id.clone()) {
            self.emit(PlaybackEvent::TrackFinished { song_id });
        }

        match action {
            MirrorAction::ReplayCurrent => self.replay(report.handle).await,
            MirrorAction::Advance => self.next().await,
            MirrorAction::None => {}
        }
    }

    async fn replay(&mut self, handle: EngineHandle) {
        if let Err(e) = self.engine.seek(handle, 0).await {
            self.fail(format!("Seek failed: {e}"));
            return;
        }
        self.status.position_ms = 0;
        if let Err(e) = self.engine.play(handle).await {
            self.fail(format!("Play failed: {e}"));
        }
    }

    /// Unload the engine and zero the status; also cancels pending loads
    async fn release_engine(&mut self) {
        self.generation += 1;
        self.early_reports.clear();
        self.mirror.reset();
        self.status = PlaybackStatus::default();

        if let Some(handle) = self.loaded.take() {
            self.unload_quietly(handle).await;
        }
    }

    async fn unload_quietly(&self, handle: EngineHandle) {
        if let Err(e) = self.engine.unload(handle).await {
            debug!("Ignoring unload failure for {}: {}", handle, e);
        }
    }

    fn fail(&mut self, message: String) {
        warn!("{}", message);
        self.status.last_error = Some(message.clone());
        self.emit(PlaybackEvent::Error { message });
    }

    fn queue_changed(&mut self) {
        self.emit(PlaybackEvent::QueueChanged {
            length: self.queue.len(),
            current_index: self.queue.current_index(),
        });
        self.persist();
    }

    fn persist(&self) {
        if let Some(writer) = &self.writer {
            writer.save(self.snapshot());
        }
    }

    fn emit_position(&mut self) {
        self.emit(PlaybackEvent::PositionUpdate {
            position_ms: self.status.position_ms,
            duration_ms: self.status.duration_ms,
        });
    }

    fn emit(&mut self, event: PlaybackEvent) {
        self.pending_events.push(event);
    }
}

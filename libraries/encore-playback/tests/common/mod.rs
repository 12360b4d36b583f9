//! Shared test infrastructure: a scriptable audio engine and song builders

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use encore_core::{
    AudioEngine, EncoreError, EngineHandle, EngineStatus, KeyValueStore, LoadOptions, Result,
    Song, StatusSink,
};
use encore_playback::{PlaybackManager, PlayerConfig};
use encore_storage::MemoryStore;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::sync::Notify;

/// Duration reported for every fake resource
pub const DURATION_MS: u64 = 180_000;

/// One recorded engine call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Prepare,
    Load { url: String, looping: bool },
    Play(EngineHandle),
    Pause(EngineHandle),
    Seek(EngineHandle, u64),
    SetLooping(EngineHandle, bool),
    Unload(EngineHandle),
}

/// Engine operations that can be made to fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailPoint {
    Prepare,
    Load,
    Play,
    Pause,
    Seek,
    SetLooping,
    Unload,
}

#[derive(Default)]
struct EngineState {
    calls: Vec<Call>,
    next_handle: u64,
    sinks: HashMap<EngineHandle, StatusSink>,
    positions: HashMap<EngineHandle, u64>,
    live: HashSet<EngineHandle>,
    failing: HashSet<FailPoint>,
    gates: HashMap<String, Arc<Notify>>,
    announcements: HashMap<String, (EngineStatus, Arc<Notify>)>,
}

/// In-process audio engine that records calls
///
/// `play` and `pause` answer with a status report, the way platform players
/// confirm a state change. Loads do not report; the manager learns about the
/// new resource from the load result.
#[derive(Default)]
pub struct FakeEngine {
    state: Mutex<EngineState>,
}

impl FakeEngine {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn fail(&self, point: FailPoint) {
        self.state.lock().unwrap().failing.insert(point);
    }

    pub fn recover(&self, point: FailPoint) {
        self.state.lock().unwrap().failing.remove(&point);
    }

    /// Make loads of `url` wait until the returned notify fires
    pub fn gate(&self, url: &str) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        self.state
            .lock()
            .unwrap()
            .gates
            .insert(url.to_string(), Arc::clone(&notify));
        notify
    }

    /// Make loads of `url` report `status` for the new resource and then
    /// wait for the returned notify before handing back the handle
    pub fn announce(&self, url: &str, status: EngineStatus) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        self.state
            .lock()
            .unwrap()
            .announcements
            .insert(url.to_string(), (status, Arc::clone(&notify)));
        notify
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.lock().unwrap().calls.clear();
    }

    /// URLs passed to `load`, in call order
    pub fn loads(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Load { url, .. } => Some(url),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, matches: impl Fn(&Call) -> bool) -> usize {
        self.calls().iter().filter(|call| matches(call)).count()
    }

    /// Resources loaded and not yet unloaded
    pub fn live_handles(&self) -> Vec<EngineHandle> {
        let mut live: Vec<_> = self.state.lock().unwrap().live.iter().copied().collect();
        live.sort_by_key(|handle| handle.get());
        live
    }

    /// Push an arbitrary status report for `handle`
    pub fn report(&self, handle: EngineHandle, status: EngineStatus) {
        let sink = self.state.lock().unwrap().sinks.get(&handle).cloned();
        if let Some(sink) = sink {
            sink.report(handle, status);
        }
    }

    /// Report playback progress for `handle`
    pub fn progress(&self, handle: EngineHandle, is_playing: bool, position_ms: u64) {
        self.state
            .lock()
            .unwrap()
            .positions
            .insert(handle, position_ms);
        self.report(
            handle,
            EngineStatus::progress(is_playing, position_ms, DURATION_MS),
        );
    }

    /// Report natural completion for `handle`
    pub fn finish(&self, handle: EngineHandle) {
        self.report(handle, EngineStatus::finished(DURATION_MS));
    }

    fn record(&self, call: Call, point: FailPoint) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(call);
        if state.failing.contains(&point) {
            return Err(EncoreError::engine(format!("injected {point:?} failure")));
        }
        Ok(())
    }

    fn confirm(&self, handle: EngineHandle, is_playing: bool) {
        let position = self
            .state
            .lock()
            .unwrap()
            .positions
            .get(&handle)
            .copied()
            .unwrap_or(0);
        self.report(
            handle,
            EngineStatus::progress(is_playing, position, DURATION_MS),
        );
    }
}

#[async_trait]
impl AudioEngine for FakeEngine {
    async fn prepare(&self) -> Result<()> {
        self.record(Call::Prepare, FailPoint::Prepare)
    }

    async fn load(&self, url: &str, options: LoadOptions, sink: StatusSink) -> Result<EngineHandle> {
        self.record(
            Call::Load {
                url: url.to_string(),
                looping: options.looping,
            },
            FailPoint::Load,
        )?;

        let (gate, announcement) = {
            let mut state = self.state.lock().unwrap();
            (state.gates.remove(url), state.announcements.remove(url))
        };
        if let Some(gate) = gate {
            gate.notified().await;
        }

        let handle = {
            let mut state = self.state.lock().unwrap();
            state.next_handle += 1;
            let handle = EngineHandle::new(state.next_handle);
            state.sinks.insert(handle, sink);
            state.positions.insert(handle, 0);
            state.live.insert(handle);
            handle
        };

        if let Some((status, release)) = announcement {
            self.report(handle, status);
            release.notified().await;
        }
        Ok(handle)
    }

    async fn play(&self, handle: EngineHandle) -> Result<()> {
        self.record(Call::Play(handle), FailPoint::Play)?;
        self.confirm(handle, true);
        Ok(())
    }

    async fn pause(&self, handle: EngineHandle) -> Result<()> {
        self.record(Call::Pause(handle), FailPoint::Pause)?;
        self.confirm(handle, false);
        Ok(())
    }

    async fn seek(&self, handle: EngineHandle, position_ms: u64) -> Result<()> {
        self.record(Call::Seek(handle, position_ms), FailPoint::Seek)?;
        self.state
            .lock()
            .unwrap()
            .positions
            .insert(handle, position_ms);
        Ok(())
    }

    async fn set_looping(&self, handle: EngineHandle, looping: bool) -> Result<()> {
        self.record(Call::SetLooping(handle, looping), FailPoint::SetLooping)
    }

    async fn unload(&self, handle: EngineHandle) -> Result<()> {
        self.record(Call::Unload(handle), FailPoint::Unload)?;
        // The sink stays registered: late reports for unloaded resources
        // are something the player has to tolerate.
        self.state.lock().unwrap().live.remove(&handle);
        Ok(())
    }
}

/// Store whose writes always fail
#[derive(Default)]
pub struct BrokenStore;

#[async_trait]
impl KeyValueStore for BrokenStore {
    async fn get(&self, _key: &str) -> Result<Option<Vec<u8>>> {
        Err(EncoreError::storage("disk unavailable"))
    }

    async fn set(&self, _key: &str, _value: &[u8]) -> Result<()> {
        Err(EncoreError::storage("disk full"))
    }
}

pub fn url(id: &str) -> String {
    format!("https://cdn.test/{id}.mp3")
}

pub fn song(id: &str) -> Song {
    Song::new(id, format!("Song {id}"))
        .with_artists("Test Artist")
        .with_source(url(id))
}

pub fn songs(ids: &[&str]) -> Vec<Song> {
    ids.iter().map(|id| song(id)).collect()
}

/// A song with no usable source
pub fn unplayable(id: &str) -> Song {
    Song::new(id, format!("Broken {id}")).with_source("not a url")
}

pub fn ids(manager: &PlaybackManager) -> Vec<String> {
    manager
        .queue()
        .iter()
        .map(|song| song.id.as_str().to_string())
        .collect()
}

/// Manager over `engine` with an in-memory store and a seeded shuffle
pub fn manager_with(engine: &Arc<FakeEngine>, store: Arc<dyn KeyValueStore>) -> PlaybackManager {
    PlaybackManager::new(engine.clone(), store, PlayerConfig::default())
        .with_rng(StdRng::seed_from_u64(0xC0FFEE))
}

pub fn manager(engine: &Arc<FakeEngine>) -> PlaybackManager {
    manager_with(engine, Arc::new(MemoryStore::new()))
}

/// Manager that has settled on `queue` at `start`
pub async fn playing(engine: &Arc<FakeEngine>, queue: &[&str], start: usize) -> PlaybackManager {
    let mut manager = manager(engine);
    manager.set_queue_and_play(songs(queue), Some(start)).await;
    manager.settle().await;
    engine.clear_calls();
    manager
}

/// Loaded handle, panicking if nothing is loaded
pub fn handle(manager: &PlaybackManager) -> EngineHandle {
    manager.loaded_handle().expect("a resource should be loaded")
}

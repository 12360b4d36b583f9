//! Simulated audio engine
//!
//! Stands in for a platform player when running headless. Every loaded
//! resource gets a clock task that advances the play head while playing and
//! pushes progress through the [`StatusSink`] registered at load time. No
//! audio is decoded; each resource lasts a fixed `track_length`.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use encore_core::{AudioEngine, EncoreError, EngineHandle, EngineStatus, LoadOptions, Result, StatusSink};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Resources opened by the simulated engine
#[derive(Debug)]
struct Resource {
    url: String,
    playing: bool,
    looping: bool,
    position_ms: u64,
    sink: StatusSink,
    clock: Option<JoinHandle<()>>,
}

impl Resource {
    fn status(&self, duration_ms: u64) -> EngineStatus {
        EngineStatus::progress(self.playing, self.position_ms, duration_ms)
    }
}

#[derive(Debug, Default)]
struct EngineState {
    next_handle: u64,
    resources: HashMap<EngineHandle, Resource>,
}

/// Clock-driven engine that never touches an audio device
#[derive(Debug, Clone)]
pub struct SimulatedEngine {
    state: Arc<Mutex<EngineState>>,
    tick: Duration,
    duration_ms: u64,
}

impl SimulatedEngine {
    /// Create an engine whose resources last `track_length` and report
    /// progress every `tick`
    pub fn new(track_length: Duration, tick: Duration) -> Self {
        Self {
            state: Arc::new(Mutex::new(EngineState::default())),
            tick,
            duration_ms: u64::try_from(track_length.as_millis()).unwrap_or(u64::MAX),
        }
    }

    /// URL of a loaded resource
    pub async fn url_of(&self, handle: EngineHandle) -> Option<String> {
        let state = self.state.lock().await;
        state.resources.get(&handle).map(|r| r.url.clone())
    }

    /// Number of resources currently loaded
    pub async fn loaded_count(&self) -> usize {
        self.state.lock().await.resources.len()
    }

    fn tick_ms(&self) -> u64 {
        u64::try_from(self.tick.as_millis()).unwrap_or(u64::MAX).max(1)
    }

    fn spawn_clock(&self, handle: EngineHandle) -> JoinHandle<()> {
        let state = Arc::clone(&self.state);
        let period = self.tick;
        let step = self.tick_ms();
        let duration_ms = self.duration_ms;

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            interval.tick().await;

            loop {
                interval.tick().await;
                let mut guard = state.lock().await;
                let Some(resource) = guard.resources.get_mut(&handle) else {
                    break;
                };
                if !resource.playing {
                    continue;
                }

                resource.position_ms = resource.position_ms.saturating_add(step);
                if resource.position_ms < duration_ms {
                    resource.sink.report(handle, resource.status(duration_ms));
                } else if resource.looping {
                    resource.position_ms = 0;
                    resource.sink.report(handle, resource.status(duration_ms));
                } else {
                    resource.playing = false;
                    resource.position_ms = duration_ms;
                    resource.sink.report(handle, EngineStatus::finished(duration_ms));
                }
            }
        })
    }

    async fn with_resource<F>(&self, handle: EngineHandle, apply: F) -> Result<()>
    where
        F: FnOnce(&mut Resource),
    {
        let mut state = self.state.lock().await;
        let resource = state
            .resources
            .get_mut(&handle)
            .ok_or(EncoreError::HandleNotLoaded(handle.get()))?;
        apply(resource);
        resource.sink.report(handle, resource.status(self.duration_ms));
        Ok(())
    }
}

impl Default for SimulatedEngine {
    fn default() -> Self {
        Self::new(Duration::from_secs(30), Duration::from_millis(250))
    }
}

#[async_trait]
impl AudioEngine for SimulatedEngine {
    async fn prepare(&self) -> Result<()> {
        tracing::debug!("Simulated audio session ready");
        Ok(())
    }

    async fn load(&self, url: &str, options: LoadOptions, sink: StatusSink) -> Result<EngineHandle> {
        let handle = {
            let mut state = self.state.lock().await;
            state.next_handle += 1;
            let handle = EngineHandle::new(state.next_handle);
            state.resources.insert(
                handle,
                Resource {
                    url: url.to_string(),
                    playing: options.autoplay,
                    looping: options.looping,
                    position_ms: 0,
                    sink,
                    clock: None,
                },
            );
            handle
        };

        let clock = self.spawn_clock(handle);
        let mut state = self.state.lock().await;
        if let Some(resource) = state.resources.get_mut(&handle) {
            resource.clock = Some(clock);
            resource.sink.report(handle, resource.status(self.duration_ms));
        }

        tracing::debug!("Loaded {} as {}", url, handle);
        Ok(handle)
    }

    async fn play(&self, handle: EngineHandle) -> Result<()> {
        self.with_resource(handle, |r| r.playing = true).await
    }

    async fn pause(&self, handle: EngineHandle) -> Result<()> {
        self.with_resource(handle, |r| r.playing = false).await
    }

    async fn seek(&self, handle: EngineHandle, position_ms: u64) -> Result<()> {
        let duration_ms = self.duration_ms;
        self.with_resource(handle, |r| r.position_ms = position_ms.min(duration_ms))
            .await
    }

    async fn set_looping(&self, handle: EngineHandle, looping: bool) -> Result<()> {
        self.with_resource(handle, |r| r.looping = looping).await
    }

    async fn unload(&self, handle: EngineHandle) -> Result<()> {
        let removed = self.state.lock().await.resources.remove(&handle);
        match removed {
            Some(resource) => {
                if let Some(clock) = resource.clock {
                    clock.abort();
                }
                tracing::debug!("Unloaded {}", handle);
                Ok(())
            }
            None => Err(EncoreError::HandleNotLoaded(handle.get())),
        }
    }
}

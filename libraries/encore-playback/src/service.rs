//! Player service
//!
//! Runs a [`PlaybackManager`] on its own task so any number of UI surfaces
//! can drive one player. Commands travel over a bounded channel and are
//! handled one at a time; between commands the task reacts to load outcomes
//! and engine status reports.
//!
//! Observers either read the latest [`PlayerView`] from a watch channel or
//! subscribe to the [`PlaybackEvent`] broadcast.

use encore_core::{PlaybackStatus, RepeatMode, Song};
use serde::Serialize;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::error::{PlaybackError, Result};
use crate::events::PlaybackEvent;
use crate::manager::PlaybackManager;

/// Read-only view of the player for UI surfaces
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerView {
    /// Songs in playback order
    pub queue: Vec<Song>,
    /// Index of the current song
    pub current_index: usize,
    /// Whether shuffle is on
    pub shuffle_on: bool,
    /// Current repeat mode
    pub repeat_mode: RepeatMode,
    /// Mirrored playback status
    pub status: PlaybackStatus,
    /// Whether a resource is loaded in the engine
    pub is_loaded: bool,
    /// Whether `next` would load something
    pub has_next: bool,
}

impl PlayerView {
    fn of(manager: &PlaybackManager) -> Self {
        Self {
            queue: manager.queue().to_vec(),
            current_index: manager.current_index(),
            shuffle_on: manager.shuffle_on(),
            repeat_mode: manager.repeat_mode(),
            status: manager.status().clone(),
            is_loaded: manager.is_loaded(),
            has_next: manager.has_next(),
        }
    }

    /// Song at the current index
    pub fn current_song(&self) -> Option<&Song> {
        self.queue.get(self.current_index)
    }
}

#[derive(Debug)]
enum Op {
    SetQueueAndPlay(Vec<Song>, Option<usize>),
    PlaySingle(Song),
    Enqueue(Vec<Song>),
    TogglePlayPause,
    Play,
    Pause,
    Stop,
    Next,
    Prev,
    SeekTo(i64),
    SkipTo(usize),
    ToggleShuffle,
    CycleRepeat,
    MoveUp(usize),
    MoveDown(usize),
    MoveItem(usize, usize),
    RemoveAt(usize),
    ClearQueue,
    Refresh,
    Settle,
    Shutdown,
}

#[derive(Debug)]
struct Command {
    op: Op,
    reply: oneshot::Sender<PlayerView>,
}

/// Spawns and runs the player task
pub struct PlayerService;

impl PlayerService {
    /// Move `manager` onto a new task and return a handle to it
    pub fn spawn(manager: PlaybackManager) -> (PlayerHandle, JoinHandle<()>) {
        let config = manager.config().clone();
        let (commands_tx, commands_rx) = mpsc::channel(config.command_buffer);
        let (view_tx, view_rx) = watch::channel(PlayerView::of(&manager));
        let (events_tx, _) = broadcast::channel(config.event_buffer);

        let task = tokio::spawn(run(manager, commands_rx, view_tx, events_tx.clone()));

        let handle = PlayerHandle {
            commands: commands_tx,
            view: view_rx,
            events: events_tx,
        };
        (handle, task)
    }
}

async fn run(
    mut manager: PlaybackManager,
    mut commands: mpsc::Receiver<Command>,
    view_tx: watch::Sender<PlayerView>,
    events_tx: broadcast::Sender<PlaybackEvent>,
) {
    info!("Player service started");

    loop {
        tokio::select! {
            biased;
            input = manager.next_input() => {
                manager.handle_input(input).await;
                publish(&mut manager, &view_tx, &events_tx);
            }
            command = commands.recv() => {
                let Some(Command { op, reply }) = command else {
                    // Every handle is gone
                    shut_down(&mut manager).await;
                    publish(&mut manager, &view_tx, &events_tx);
                    break;
                };

                let shutdown = matches!(op, Op::Shutdown);
                dispatch(&mut manager, op).await;
                manager.drain_ready_inputs().await;
                let view = publish(&mut manager, &view_tx, &events_tx);
                let _ = reply.send(view);

                if shutdown {
                    break;
                }
            }
        }
    }

    info!("Player service stopped");
}

async fn shut_down(manager: &mut PlaybackManager) {
    manager.stop().await;
    manager.flush_persistence().await;
}

async fn dispatch(manager: &mut PlaybackManager, op: Op) {
    debug!("Player command: {:?}", op);
    match op {
        Op::SetQueueAndPlay(songs, start) => manager.set_queue_and_play(songs, start).await,
        Op::PlaySingle(song) => manager.play_single(song).await,
        Op::Enqueue(songs) => manager.enqueue(songs),
        Op::TogglePlayPause => manager.toggle_play_pause().await,
        Op::Play => manager.play().await,
        Op::Pause => manager.pause().await,
        Op::Stop => manager.stop().await,
        Op::Next => manager.next().await,
        Op::Prev => manager.prev().await,
        Op::SeekTo(position_ms) => manager.seek_to(position_ms).await,
        Op::SkipTo(index) => manager.skip_to(index).await,
        Op::ToggleShuffle => manager.toggle_shuffle(),
        Op::CycleRepeat => manager.cycle_repeat().await,
        Op::MoveUp(index) => manager.move_up(index),
        Op::MoveDown(index) => manager.move_down(index),
        Op::MoveItem(from, to) => manager.move_item(from, to),
        Op::RemoveAt(index) => manager.remove_at(index).await,
        Op::ClearQueue => manager.clear_queue().await,
        Op::Settle => manager.settle().await,
        Op::Shutdown => shut_down(manager).await,
        Op::Refresh => {}
    }
}

fn publish(
    manager: &mut PlaybackManager,
    view_tx: &watch::Sender<PlayerView>,
    events_tx: &broadcast::Sender<PlaybackEvent>,
) -> PlayerView {
    for event in manager.drain_events() {
        // No subscribers is fine
        let _ = events_tx.send(event);
    }

    let view = PlayerView::of(manager);
    view_tx.send_if_modified(|current| {
        if *current == view {
            false
        } else {
            *current = view.clone();
            true
        }
    });
    view
}

/// Cloneable handle to a running [`PlayerService`]
///
/// Every command resolves to the player view right after the command (and
/// any input that was already queued) has been handled.
#[derive(Debug, Clone)]
pub struct PlayerHandle {
    commands: mpsc::Sender<Command>,
    view: watch::Receiver<PlayerView>,
    events: broadcast::Sender<PlaybackEvent>,
}

impl PlayerHandle {
    async fn send(&self, op: Op) -> Result<PlayerView> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(Command { op, reply })
            .await
            .map_err(|_| PlaybackError::ServiceStopped)?;
        rx.await.map_err(|_| PlaybackError::ServiceStopped)
    }

    /// Replace the queue and start playing at `start`
    ///
    /// # Errors
    ///
    /// Returns [`PlaybackError::ServiceStopped`] after shutdown
    pub async fn set_queue_and_play(&self, songs: Vec<Song>, start: Option<usize>) -> Result<PlayerView> {
        self.send(Op::SetQueueAndPlay(songs, start)).await
    }

    /// Replace the queue with one song and play it
    ///
    /// # Errors
    ///
    /// Returns [`PlaybackError::ServiceStopped`] after shutdown
    pub async fn play_single(&self, song: Song) -> Result<PlayerView> {
        self.send(Op::PlaySingle(song)).await
    }

    /// Append songs to the queue
    ///
    /// # Errors
    ///
    /// Returns [`PlaybackError::ServiceStopped`] after shutdown
    pub async fn enqueue(&self, songs: Vec<Song>) -> Result<PlayerView> {
        self.send(Op::Enqueue(songs)).await
    }

    /// Toggle play/pause
    ///
    /// # Errors
    ///
    /// Returns [`PlaybackError::ServiceStopped`] after shutdown
    pub async fn toggle_play_pause(&self) -> Result<PlayerView> {
        self.send(Op::TogglePlayPause).await
    }

    /// Start or resume playback
    ///
    /// # Errors
    ///
    /// Returns [`PlaybackError::ServiceStopped`] after shutdown
    pub async fn play(&self) -> Result<PlayerView> {
        self.send(Op::Play).await
    }

    /// Pause playback
    ///
    /// # Errors
    ///
    /// Returns [`PlaybackError::ServiceStopped`] after shutdown
    pub async fn pause(&self) -> Result<PlayerView> {
        self.send(Op::Pause).await
    }

    /// Unload the current song, keeping the queue
    ///
    /// # Errors
    ///
    /// Returns [`PlaybackError::ServiceStopped`] after shutdown
    pub async fn stop(&self) -> Result<PlayerView> {
        self.send(Op::Stop).await
    }

    /// Skip to next song
    ///
    /// # Errors
    ///
    /// Returns [`PlaybackError::ServiceStopped`] after shutdown
    pub async fn next(&self) -> Result<PlayerView> {
        self.send(Op::Next).await
    }

    /// Go to previous song (or restart the current one)
    ///
    /// # Errors
    ///
    /// Returns [`PlaybackError::ServiceStopped`] after shutdown
    pub async fn prev(&self) -> Result<PlayerView> {
        self.send(Op::Prev).await
    }

    /// Seek within the loaded song
    ///
    /// # Errors
    ///
    /// Returns [`PlaybackError::ServiceStopped`] after shutdown
    pub async fn seek_to(&self, position_ms: i64) -> Result<PlayerView> {
        self.send(Op::SeekTo(position_ms)).await
    }

    /// Jump to `index` and play it
    ///
    /// # Errors
    ///
    /// Returns [`PlaybackError::ServiceStopped`] after shutdown
    pub async fn skip_to(&self, index: usize) -> Result<PlayerView> {
        self.send(Op::SkipTo(index)).await
    }

    /// Flip shuffle
    ///
    /// # Errors
    ///
    /// Returns [`PlaybackError::ServiceStopped`] after shutdown
    pub async fn toggle_shuffle(&self) -> Result<PlayerView> {
        self.send(Op::ToggleShuffle).await
    }

    /// Advance the repeat mode
    ///
    /// # Errors
    ///
    /// Returns [`PlaybackError::ServiceStopped`] after shutdown
    pub async fn cycle_repeat(&self) -> Result<PlayerView> {
        self.send(Op::CycleRepeat).await
    }

    /// Swap the entry at `index` with the one above it
    ///
    /// # Errors
    ///
    /// Returns [`PlaybackError::ServiceStopped`] after shutdown
    pub async fn move_up(&self, index: usize) -> Result<PlayerView> {
        self.send(Op::MoveUp(index)).await
    }

    /// Swap the entry at `index` with the one below it
    ///
    /// # Errors
    ///
    /// Returns [`PlaybackError::ServiceStopped`] after shutdown
    pub async fn move_down(&self, index: usize) -> Result<PlayerView> {
        self.send(Op::MoveDown(index)).await
    }

    /// Move the entry at `from` to `to`
    ///
    /// # Errors
    ///
    /// Returns [`PlaybackError::ServiceStopped`] after shutdown
    pub async fn move_item(&self, from: usize, to: usize) -> Result<PlayerView> {
        self.send(Op::MoveItem(from, to)).await
    }

    /// Remove the entry at `index`
    ///
    /// # Errors
    ///
    /// Returns [`PlaybackError::ServiceStopped`] after shutdown
    pub async fn remove_at(&self, index: usize) -> Result<PlayerView> {
        self.send(Op::RemoveAt(index)).await
    }

    /// Empty the queue and unload the engine
    ///
    /// # Errors
    ///
    /// Returns [`PlaybackError::ServiceStopped`] after shutdown
    pub async fn clear_queue(&self) -> Result<PlayerView> {
        self.send(Op::ClearQueue).await
    }

    /// Fetch a fresh view after handling every queued input
    ///
    /// # Errors
    ///
    /// Returns [`PlaybackError::ServiceStopped`] after shutdown
    pub async fn refresh(&self) -> Result<PlayerView> {
        self.send(Op::Refresh).await
    }

    /// Wait for in-flight loads to finish, then return the view
    ///
    /// Other commands queue up behind this one until the loads resolve.
    ///
    /// # Errors
    ///
    /// Returns [`PlaybackError::ServiceStopped`] after shutdown
    pub async fn settle(&self) -> Result<PlayerView> {
        self.send(Op::Settle).await
    }

    /// Stop playback, flush persistence and end the service task
    ///
    /// # Errors
    ///
    /// Returns [`PlaybackError::ServiceStopped`] if it already stopped
    pub async fn shutdown(&self) -> Result<PlayerView> {
        self.send(Op::Shutdown).await
    }

    /// Latest published view, without a round trip
    pub fn view(&self) -> PlayerView {
        self.view.borrow().clone()
    }

    /// Watch the published view
    pub fn watch_view(&self) -> watch::Receiver<PlayerView> {
        self.view.clone()
    }

    /// Subscribe to playback events
    pub fn subscribe(&self) -> broadcast::Receiver<PlaybackEvent> {
        self.events.subscribe()
    }
}

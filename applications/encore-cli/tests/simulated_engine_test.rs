//! Simulated engine clock and its use behind the player service

use std::sync::Arc;
use std::time::Duration;

use encore_cli::SimulatedEngine;
use encore_core::{AudioEngine, EngineHandle, LoadOptions, StatusReport, StatusSink};
use encore_playback::{PlaybackManager, PlayerConfig, PlayerService};
use encore_storage::MemoryStore;
use tokio::sync::mpsc::UnboundedReceiver;

const TICK: Duration = Duration::from_millis(100);

fn engine() -> SimulatedEngine {
    SimulatedEngine::new(Duration::from_secs(1), TICK)
}

fn autoplay(looping: bool) -> LoadOptions {
    LoadOptions {
        autoplay: true,
        looping,
    }
}

fn drain(rx: &mut UnboundedReceiver<StatusReport>) -> Vec<StatusReport> {
    let mut reports = Vec::new();
    while let Ok(report) = rx.try_recv() {
        reports.push(report);
    }
    reports
}

async fn advance(duration: Duration) {
    tokio::time::sleep(duration).await;
}

#[tokio::test(start_paused = true)]
async fn autoplay_advances_and_finishes_once() {
    let engine = engine();
    let (sink, mut rx) = StatusSink::channel();
    let handle = engine
        .load("https://cdn.example.com/a.mp3", autoplay(false), sink)
        .await
        .unwrap();

    advance(Duration::from_millis(550)).await;
    let reports = drain(&mut rx);
    let last = reports.last().unwrap();
    assert_eq!(last.handle, handle);
    assert!(last.status.is_playing);
    assert_eq!(last.status.position_ms, 500);
    assert_eq!(last.status.duration_ms, 1_000);

    advance(Duration::from_secs(2)).await;
    let reports = drain(&mut rx);
    let finished: Vec<_> = reports
        .iter()
        .filter(|r| r.status.did_just_finish)
        .collect();
    assert_eq!(finished.len(), 1);
    assert_eq!(finished[0].status.position_ms, 1_000);
}

#[tokio::test(start_paused = true)]
async fn looping_resource_wraps_without_finishing() {
    let engine = engine();
    let (sink, mut rx) = StatusSink::channel();
    engine
        .load("https://cdn.example.com/a.mp3", autoplay(true), sink)
        .await
        .unwrap();

    advance(Duration::from_millis(2_550)).await;
    let reports = drain(&mut rx);
    assert!(reports.iter().all(|r| !r.status.did_just_finish));
    assert!(reports.last().unwrap().status.position_ms < 1_000);
}

#[tokio::test(start_paused = true)]
async fn pause_freezes_the_clock() {
    let engine = engine();
    let (sink, mut rx) = StatusSink::channel();
    let handle = engine
        .load("https://cdn.example.com/a.mp3", autoplay(false), sink)
        .await
        .unwrap();

    advance(Duration::from_millis(350)).await;
    engine.pause(handle).await.unwrap();
    let paused = drain(&mut rx).last().unwrap().status;
    assert!(!paused.is_playing);

    advance(Duration::from_secs(5)).await;
    assert!(drain(&mut rx).is_empty());

    engine.seek(handle, 9_999).await.unwrap();
    assert_eq!(drain(&mut rx).last().unwrap().status.position_ms, 1_000);
}

#[tokio::test(start_paused = true)]
async fn unload_stops_reports_and_forgets_handle() {
    let engine = engine();
    let (sink, mut rx) = StatusSink::channel();
    let handle = engine
        .load("https://cdn.example.com/a.mp3", autoplay(false), sink)
        .await
        .unwrap();
    assert_eq!(
        engine.url_of(handle).await.as_deref(),
        Some("https://cdn.example.com/a.mp3")
    );

    engine.unload(handle).await.unwrap();
    drain(&mut rx);
    advance(Duration::from_secs(2)).await;

    assert!(drain(&mut rx).is_empty());
    assert_eq!(engine.loaded_count().await, 0);
    assert!(engine.play(handle).await.is_err());
    assert!(engine.unload(EngineHandle::new(99)).await.is_err());
}

#[tokio::test(start_paused = true)]
async fn player_walks_the_queue_on_the_simulated_clock() {
    let engine = Arc::new(engine());
    let store = Arc::new(MemoryStore::new());
    let manager = PlaybackManager::new(engine.clone(), store, PlayerConfig::default());
    let (player, _task) = PlayerService::spawn(manager);

    let songs = vec![
        encore_core::Song::new("1", "One").with_source("https://cdn.example.com/1.mp3"),
        encore_core::Song::new("2", "Two").with_source("https://cdn.example.com/2.mp3"),
    ];
    player.set_queue_and_play(songs, None).await.unwrap();
    let view = player.settle().await.unwrap();
    assert!(view.status.is_playing);
    assert_eq!(view.current_index, 0);

    advance(Duration::from_millis(1_150)).await;
    let view = player.settle().await.unwrap();
    assert_eq!(view.current_index, 1);
    assert!(view.is_loaded);

    advance(Duration::from_millis(1_150)).await;
    let view = player.settle().await.unwrap();
    assert_eq!(view.current_index, 1);
    assert!(!view.status.is_playing);

    player.shutdown().await.unwrap();
    assert_eq!(engine.loaded_count().await, 0);
}

/// Encore - headless player driver
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use encore_cli::{catalog::read_catalog, render, SimulatedEngine};
use encore_core::{AudioEngine, KeyValueStore};
use encore_playback::{persistence::load_snapshot, PlaybackManager, PlayerConfig, PlayerHandle, PlayerService};
use encore_storage::SqliteStore;
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "encore")]
#[command(about = "Drive the Encore player from a terminal", long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "encore.toml")]
    config: PathBuf,

    /// SQLite database holding the saved session
    #[arg(long, env = "ENCORE_DATABASE_URL", default_value = "sqlite://encore.db")]
    database: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replace the queue with a saved catalog response and start playing
    Play {
        /// Catalog JSON file (search response or bare array)
        catalog: PathBuf,
        /// Queue position to start from (1-based)
        #[arg(short, long)]
        start: Option<usize>,
        /// Seconds to keep playing before exiting
        #[arg(long, default_value_t = 60)]
        seconds: u64,
        /// Simulated length of every track in seconds
        #[arg(long, default_value_t = 30)]
        track_secs: u64,
    },
    /// Restore the saved session and resume where it left off
    Resume {
        /// Seconds to keep playing before exiting
        #[arg(long, default_value_t = 60)]
        seconds: u64,
        /// Simulated length of every track in seconds
        #[arg(long, default_value_t = 30)]
        track_secs: u64,
    },
    /// Print the saved session
    Status,
    /// Forget the saved session
    Clear,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "encore=info,encore_playback=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = PlayerConfig::load(&cli.config)?;
    let store = Arc::new(SqliteStore::connect(&cli.database).await?);

    match cli.command {
        Commands::Play {
            catalog,
            start,
            seconds,
            track_secs,
        } => {
            let player = start_player(store, config, track_secs).await;
            play_catalog(&player, &catalog, start).await?;
            run_session(&player, Duration::from_secs(seconds)).await?;
        }
        Commands::Resume { seconds, track_secs } => {
            let player = start_player(store, config, track_secs).await;
            let view = player.play().await?;
            println!("{}", render::status_line(&view));
            run_session(&player, Duration::from_secs(seconds)).await?;
        }
        Commands::Status => {
            print_saved(store.as_ref(), &config.storage_key).await;
        }
        Commands::Clear => {
            store.remove(&config.storage_key).await?;
            tracing::info!("Cleared saved session {}", config.storage_key);
        }
    }

    Ok(())
}

async fn start_player(store: Arc<SqliteStore>, config: PlayerConfig, track_secs: u64) -> PlayerHandle {
    let engine: Arc<dyn AudioEngine> = Arc::new(SimulatedEngine::new(
        Duration::from_secs(track_secs.max(1)),
        Duration::from_millis(250),
    ));
    let store: Arc<dyn KeyValueStore> = store;

    let manager = PlaybackManager::hydrate(engine, store, config).await;
    tracing::info!("Restored {} queued songs", manager.queue().len());

    let (player, _task) = PlayerService::spawn(manager);
    player
}

async fn play_catalog(player: &PlayerHandle, path: &Path, start: Option<usize>) -> anyhow::Result<()> {
    let songs = read_catalog(path).await?;
    let view = player
        .set_queue_and_play(songs, start.map(|n| n.saturating_sub(1)))
        .await?;
    println!("{}", render::status_line(&view));
    Ok(())
}

async fn run_session(player: &PlayerHandle, length: Duration) -> anyhow::Result<()> {
    let mut events = player.subscribe();
    let mut ticker = tokio::time::interval(Duration::from_secs(1));
    let deadline = tokio::time::sleep(length);
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            () = &mut deadline => break,
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupted");
                break;
            }
            _ = ticker.tick() => {
                println!("{}", render::status_line(&player.view()));
            }
            event = events.recv() => match event {
                Ok(event) => {
                    if let Some(line) = render::event_line(&event) {
                        println!("{line}");
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!("Dropped {} player events", skipped);
                }
                Err(RecvError::Closed) => break,
            },
        }
    }

    let view = player.shutdown().await?;
    println!("{}", render::status_line(&view));
    Ok(())
}

async fn print_saved(store: &dyn KeyValueStore, key: &str) {
    let Some(snapshot) = load_snapshot(store, key).await else {
        println!("No saved session under {key}");
        return;
    };

    println!(
        "{} songs, shuffle {}, repeat {}",
        snapshot.queue.len(),
        if snapshot.shuffle_on { "on" } else { "off" },
        snapshot.repeat_mode,
    );
    for (index, song) in snapshot.queue.iter().enumerate() {
        let marker = if index == snapshot.current_index { ">" } else { " " };
        println!("{marker} {:>3}. {} - {}", index + 1, song.name, song.artists);
    }
}

//! Terminal rendering of player state

use encore_core::time::format_millis;
use encore_playback::{PlaybackEvent, PlayerView};

/// One-line status: transport, song, progress and policies
pub fn status_line(view: &PlayerView) -> String {
    let Some(song) = view.current_song() else {
        return "[empty queue]".to_string();
    };

    let transport = if view.status.is_loading {
        "loading"
    } else if view.status.is_playing {
        "playing"
    } else if view.is_loaded {
        "paused"
    } else {
        "stopped"
    };

    let mut line = format!(
        "[{transport}] {}/{} {} - {} {}/{} shuffle:{} repeat:{}",
        view.current_index + 1,
        view.queue.len(),
        song.name,
        song.artists,
        format_millis(view.status.position_ms),
        format_millis(view.status.duration_ms),
        if view.shuffle_on { "on" } else { "off" },
        view.repeat_mode,
    );
    if let Some(error) = &view.status.last_error {
        line.push_str(" error: ");
        line.push_str(error);
    }
    line
}

/// Human-readable line for events worth printing; progress is skipped
pub fn event_line(event: &PlaybackEvent) -> Option<String> {
    match event {
        PlaybackEvent::TrackChanged { index, song_id } => {
            Some(format!("now playing #{} ({song_id})", index + 1))
        }
        PlaybackEvent::TrackFinished { song_id } => Some(format!("finished {song_id}")),
        PlaybackEvent::QueueEnded => Some("end of queue".to_string()),
        PlaybackEvent::Error { message } => Some(format!("error: {message}")),
        _ => None,
    }
}

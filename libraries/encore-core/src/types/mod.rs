mod audio;
mod ids;
mod playback_state;
mod song;

pub use audio::{EngineStatus, LoadOptions, StatusReport, StatusSink};
pub use ids::{EngineHandle, SongId};
pub use playback_state::{PersistedSnapshot, PlaybackStatus, RepeatMode};
pub use song::Song;

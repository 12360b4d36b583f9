//! Engine status mirror
//!
//! Copies engine status reports onto [`PlaybackStatus`] and decides what a
//! completion report means for the transport. Handle filtering happens in
//! the manager; the mirror only sees reports for the loaded resource.

use encore_core::{EngineStatus, PlaybackStatus, RepeatMode};

/// What the manager should do after a report has been mirrored
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MirrorAction {
    /// Nothing beyond the status update
    None,
    /// Song finished with repeat-one: rewind and play the same resource
    ReplayCurrent,
    /// Song finished: advance as if the user pressed next
    Advance,
}

/// Mirrors engine reports and latches completion
///
/// Engines can repeat the completion flag on several consecutive reports.
/// The latch makes sure only the first one triggers an action; it releases
/// once the engine reports playback again or a new load is applied.
#[derive(Debug, Default)]
pub struct StatusMirror {
    finish_latched: bool,
}

impl StatusMirror {
    /// Create a mirror with the latch released
    pub fn new() -> Self {
        Self::default()
    }

    /// Release the completion latch
    pub fn reset(&mut self) {
        self.finish_latched = false;
    }

    /// Apply `report` to `status`
    ///
    /// Reports without a loaded resource are ignored. Otherwise playing,
    /// position and duration are overwritten, so re-applying the same report
    /// leaves the status unchanged.
    pub fn apply(
        &mut self,
        status: &mut PlaybackStatus,
        report: &EngineStatus,
        repeat: RepeatMode,
    ) -> MirrorAction {
        if !report.is_loaded {
            return MirrorAction::None;
        }

        status.is_playing = report.is_playing;
        status.position_ms = report.position_ms;
        status.duration_ms = report.duration_ms;

        if !report.did_just_finish {
            if report.is_playing {
                self.finish_latched = false;
            }
            return MirrorAction::None;
        }

        if self.finish_latched {
            return MirrorAction::None;
        }
        self.finish_latched = true;

        if repeat.loops_track() {
            MirrorAction::ReplayCurrent
        } else {
            MirrorAction::Advance
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unloaded_report_is_ignored() {
        let mut mirror = StatusMirror::new();
        let mut status = PlaybackStatus {
            is_playing: true,
            position_ms: 10,
            duration_ms: 100,
            ..PlaybackStatus::default()
        };
        let before = status.clone();

        let action = mirror.apply(&mut status, &EngineStatus::default(), RepeatMode::Off);
        assert_eq!(action, MirrorAction::None);
        assert_eq!(status, before);
    }

    #[test]
    fn progress_overwrites_fields() {
        let mut mirror = StatusMirror::new();
        let mut status = PlaybackStatus::default();

        let report = EngineStatus::progress(true, 1500, 200_000);
        mirror.apply(&mut status, &report, RepeatMode::Off);
        let once = status.clone();
        mirror.apply(&mut status, &report, RepeatMode::Off);

        assert_eq!(status, once);
        assert!(status.is_playing);
        assert_eq!(status.position_ms, 1500);
        assert_eq!(status.duration_ms, 200_000);
    }

    #[test]
    fn mirror_leaves_loading_and_error_alone() {
        let mut mirror = StatusMirror::new();
        let mut status = PlaybackStatus {
            last_error: Some("Seek failed".into()),
            ..PlaybackStatus::default()
        };
        mirror.apply(&mut status, &EngineStatus::progress(false, 5, 10), RepeatMode::Off);
        assert_eq!(status.last_error.as_deref(), Some("Seek failed"));
        assert!(!status.is_loading);
    }

    #[test]
    fn finish_maps_to_repeat_mode() {
        let mut status = PlaybackStatus::default();
        let finished = EngineStatus::finished(1000);

        let mut mirror = StatusMirror::new();
        assert_eq!(
            mirror.apply(&mut status, &finished, RepeatMode::One),
            MirrorAction::ReplayCurrent
        );

        let mut mirror = StatusMirror::new();
        assert_eq!(
            mirror.apply(&mut status, &finished, RepeatMode::Off),
            MirrorAction::Advance
        );

        let mut mirror = StatusMirror::new();
        assert_eq!(
            mirror.apply(&mut status, &finished, RepeatMode::All),
            MirrorAction::Advance
        );
        assert_eq!(status.position_ms, 1000);
        assert!(!status.is_playing);
    }

    #[test]
    fn repeated_finish_triggers_once() {
        let mut mirror = StatusMirror::new();
        let mut status = PlaybackStatus::default();
        let finished = EngineStatus::finished(1000);

        assert_eq!(
            mirror.apply(&mut status, &finished, RepeatMode::Off),
            MirrorAction::Advance
        );
        assert_eq!(
            mirror.apply(&mut status, &finished, RepeatMode::Off),
            MirrorAction::None
        );
    }

    #[test]
    fn latch_releases_when_playing_again() {
        let mut mirror = StatusMirror::new();
        let mut status = PlaybackStatus::default();
        let finished = EngineStatus::finished(1000);

        mirror.apply(&mut status, &finished, RepeatMode::One);
        mirror.apply(&mut status, &EngineStatus::progress(true, 0, 1000), RepeatMode::One);
        assert_eq!(
            mirror.apply(&mut status, &finished, RepeatMode::One),
            MirrorAction::ReplayCurrent
        );

        mirror.apply(&mut status, &finished, RepeatMode::One);
        mirror.reset();
        assert_eq!(
            mirror.apply(&mut status, &finished, RepeatMode::One),
            MirrorAction::ReplayCurrent
        );
    }
}

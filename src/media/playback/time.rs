use tokio::time::Instant;

use super::coordinator::SessionCoordinator;
use crate::media::engine::PlaybackEngine;
use crate::media::types::{MediaErrorKind, PlaybackPhase};

/// Position for a seek bar fraction. Fractions outside `[0, 1]` are clamped;
/// `None` for NaN.
pub(crate) fn position_for_fraction(fraction: f64, duration: f64) -> Option<f64> {
    if fraction.is_nan() {
        return None;
    }
    Some((fraction.clamp(0.0, 1.0) * duration).clamp(0.0, duration))
}

/// Keeps `current_time` inside `[0, duration]` once the duration is known.
pub(crate) fn clamp_position(time: f64, duration: Option<f64>) -> f64 {
    let time = if time.is_finite() { time.max(0.0) } else { 0.0 };
    match duration {
        Some(duration) => time.min(duration),
        None => time,
    }
}

/// Engines report `NaN` or `Infinity` for unknown or live durations.
pub(crate) fn sanitize_duration(duration: f64) -> Option<f64> {
    (duration.is_finite() && duration >= 0.0).then_some(duration)
}

impl<E: PlaybackEngine> SessionCoordinator<E> {
    /// Housekeeping run on every session tick: gives up on a source that has
    /// sat in `Loading` or `Buffering` past the configured stall timeout.
    pub fn check_stall(&mut self, now: Instant) {
        let Some(limit) = self.config.stall_timeout() else {
            return;
        };
        let phase = self.session.phase;
        if !matches!(phase, PlaybackPhase::Loading | PlaybackPhase::Buffering) {
            return;
        }
        let stalled_for = now.saturating_duration_since(self.session.phase_entered_at);
        if stalled_for < limit {
            return;
        }
        log::warn!(
            "Session: Source {:?} stalled in {} for {:?}.",
            self.session.active_index,
            phase,
            stalled_for
        );
        self.record_error(
            MediaErrorKind::LoadError,
            format!("source stalled while {} for {:?}", phase, stalled_for),
        );
        self.transition(PlaybackPhase::Errored);
        self.publish();
    }
}

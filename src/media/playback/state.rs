use tokio::time::Instant;

use crate::media::config::SessionConfig;
use crate::media::engine::PlayOperation;
use crate::media::guard::RateLimitGuard;
use crate::media::types::{
    BufferedRange, MediaError, MediaSource, PlaybackPhase, SessionDiagnostics, SessionSnapshot,
    Timing, VolumeState,
};

// --- State Management ---

/// The single outstanding play invocation, tagged with the source generation
/// it was issued against.
pub(crate) struct PendingPlay {
    pub(crate) generation: u64,
    pub(crate) operation: PlayOperation,
}

/// Outcome of a pending play, as observed by the session loop.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaySettlement {
    pub generation: u64,
    pub outcome: crate::media::engine::PlayOutcome,
}

pub(crate) struct PlaybackSession {
    pub(crate) sources: Vec<MediaSource>,
    pub(crate) phase: PlaybackPhase,
    pub(crate) active_index: Option<usize>,
    /// Bumped on every switch and re-initialize; engine events and play
    /// outcomes carrying an older value are stale.
    pub(crate) generation: u64,
    pub(crate) pending_play: Option<PendingPlay>,
    pub(crate) timing: Timing,
    pub(crate) volume: VolumeState,
    pub(crate) buffered: Vec<BufferedRange>,
    pub(crate) last_error: Option<MediaError>,
    /// Phase a `waiting` event interrupted.
    pub(crate) resume_phase: PlaybackPhase,
    pub(crate) phase_entered_at: Instant,
    pub(crate) diagnostics: SessionDiagnostics,
}

impl PlaybackSession {
    pub(crate) fn new(config: &SessionConfig) -> Self {
        PlaybackSession {
            sources: Vec::new(),
            phase: PlaybackPhase::Idle,
            active_index: None,
            generation: 0,
            pending_play: None,
            timing: Timing::default(),
            volume: VolumeState::new(config.initial_volume, config.initial_muted),
            buffered: Vec::new(),
            last_error: None,
            resume_phase: PlaybackPhase::Idle,
            phase_entered_at: Instant::now(),
            diagnostics: SessionDiagnostics::default(),
        }
    }

    pub(crate) fn has_media(&self) -> bool {
        !self.sources.is_empty()
    }

    /// Forgets everything tied to the active source. Volume and diagnostics
    /// survive.
    pub(crate) fn reset_source_state(&mut self) {
        self.timing = Timing::default();
        self.buffered.clear();
        self.resume_phase = PlaybackPhase::Idle;
    }

    pub(crate) fn snapshot(&self, guard: &RateLimitGuard) -> SessionSnapshot {
        SessionSnapshot {
            phase: self.phase,
            active_index: self.active_index,
            source_count: self.sources.len(),
            has_media: self.has_media(),
            play_pending: self.pending_play.is_some(),
            timing: self.timing,
            volume: self.volume,
            buffered: self.buffered.clone(),
            last_error: self.last_error.clone(),
            rate_limited: guard.is_tripped(),
            is_loading: self.phase.is_loading(),
            diagnostics: self.diagnostics,
        }
    }
}

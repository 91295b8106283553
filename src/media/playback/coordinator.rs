use tokio::sync::{broadcast, watch};
use tokio::time::Instant;

use super::events::{emit_error_event, emit_status_event, SessionEmitter, SessionEvent};
use super::state::{PendingPlay, PlaySettlement, PlaybackSession};
use crate::media::config::SessionConfig;
use crate::media::engine::{PlayOutcome, PlaybackEngine};
use crate::media::guard::RateLimitGuard;
use crate::media::types::{MediaError, MediaErrorKind, PlaybackPhase, SessionSnapshot};

/// Owns the engine and the authoritative playback state for one open details
/// surface.
///
/// Every mutation goes through a command method or
/// [`handle_engine_event`](Self::handle_engine_event). Commands that are not
/// valid for the current phase are no-ops. The only suspension point is the
/// await on a pending play operation inside `request_play_pause` (before
/// pausing) and `request_switch` (before loading the new source).
pub struct SessionCoordinator<E: PlaybackEngine> {
    pub(crate) engine: E,
    pub(crate) session: PlaybackSession,
    pub(crate) guard: RateLimitGuard,
    pub(crate) config: SessionConfig,
    pub(crate) emitter: SessionEmitter,
}

impl<E: PlaybackEngine> SessionCoordinator<E> {
    pub fn new(engine: E, config: SessionConfig) -> Self {
        let session = PlaybackSession::new(&config);
        let coordinator = SessionCoordinator {
            engine,
            session,
            guard: RateLimitGuard::new(),
            config,
            emitter: SessionEmitter::new(),
        };
        coordinator.publish();
        coordinator
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn phase(&self) -> PlaybackPhase {
        self.session.phase
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.session.snapshot(&self.guard)
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.emitter.subscribe_snapshots()
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<SessionEvent> {
        self.emitter.event_sender().subscribe()
    }

    pub(crate) fn event_sender(&self) -> broadcast::Sender<SessionEvent> {
        self.emitter.event_sender()
    }

    pub(crate) fn publish(&self) {
        self.emitter.publish_snapshot(self.snapshot());
    }

    pub(crate) fn transition(&mut self, phase: PlaybackPhase) {
        let previous = self.session.phase;
        if previous == phase {
            return;
        }
        if previous.is_terminal() {
            log::warn!(
                "Session: Refusing transition {} -> {}, session is rate limited.",
                previous,
                phase
            );
            return;
        }
        log::debug!("Session: Phase {} -> {}", previous, phase);
        self.session.phase = phase;
        self.session.phase_entered_at = Instant::now();
        emit_status_event(
            &self.emitter,
            phase,
            self.session.active_index,
            self.session.pending_play.is_some(),
        );
    }

    pub(crate) fn record_error(&mut self, kind: MediaErrorKind, message: impl Into<String>) {
        let error = MediaError::new(kind, message);
        log::warn!(
            "Session: {} on source {:?}: {}",
            error.kind,
            self.session.active_index,
            error.message
        );
        emit_error_event(
            &self.emitter,
            self.session.active_index,
            error.kind,
            &error.message,
        );
        self.session.last_error = Some(error);
    }

    /// Guard check shared by play/pause, switch and seek.
    pub(crate) fn accepts_playback_commands(&mut self, command: &str) -> bool {
        if self.guard.is_tripped() {
            log::warn!(
                "Session: '{}' ignored, playback disabled after rate limiting.",
                command
            );
            self.session.diagnostics.ignored_commands += 1;
            return false;
        }
        if !self.session.has_media() {
            log::warn!("Session: '{}' ignored, no media sources.", command);
            self.session.diagnostics.ignored_commands += 1;
            return false;
        }
        true
    }

    pub(crate) fn ignore_command(&mut self, command: &str, reason: &str) {
        log::debug!("Session: '{}' ignored: {}", command, reason);
        self.session.diagnostics.ignored_commands += 1;
    }

    // --- Pending Play Operation ---

    /// Awaits a pending play the caller has already taken out of the session.
    /// Returns `None` when the settle timeout elapsed and the operation was
    /// abandoned.
    pub(crate) async fn await_settlement(&mut self, pending: PendingPlay) -> Option<PlayOutcome> {
        match self.config.play_settle_timeout() {
            Some(limit) => match tokio::time::timeout(limit, pending.operation).await {
                Ok(outcome) => Some(outcome),
                Err(_) => {
                    log::warn!(
                        "Session: Play operation for generation {} did not settle within {:?}; abandoning it.",
                        pending.generation,
                        limit
                    );
                    self.session.diagnostics.abandoned_operations += 1;
                    None
                }
            },
            None => Some(pending.operation.await),
        }
    }

    /// Awaits then discards a superseded play outcome.
    pub(crate) async fn await_and_ignore(&mut self, pending: PendingPlay, superseded_by: &str) {
        let generation = pending.generation;
        match self.await_settlement(pending).await {
            Some(Ok(())) => log::debug!(
                "Session: Superseded play (generation {}) resolved before {}.",
                generation,
                superseded_by
            ),
            Some(Err(rejection)) => {
                self.session.diagnostics.suppressed_rejections += 1;
                log::debug!(
                    "Session: Suppressed play rejection (generation {}) superseded by {}: {}",
                    generation,
                    superseded_by,
                    rejection
                );
            }
            None => {}
        }
    }

    /// Resolves when the pending play operation settles. Never resolves while
    /// nothing is pending, so it can sit in a `select!` branch.
    pub async fn next_play_settlement(&mut self) -> PlaySettlement {
        match self.session.pending_play.as_mut() {
            Some(pending) => {
                let outcome = (&mut pending.operation).await;
                PlaySettlement {
                    generation: pending.generation,
                    outcome,
                }
            }
            None => std::future::pending().await,
        }
    }

    pub fn apply_play_settlement(&mut self, settlement: PlaySettlement) {
        let matches_pending = self
            .session
            .pending_play
            .as_ref()
            .is_some_and(|pending| pending.generation == settlement.generation);
        if !matches_pending {
            log::debug!(
                "Session: Ignoring settlement for generation {}, no matching play is pending.",
                settlement.generation
            );
            return;
        }
        self.session.pending_play = None;

        match settlement.outcome {
            Ok(()) => log::debug!(
                "Session: Play resolved for generation {}.",
                settlement.generation
            ),
            Err(rejection) => {
                let superseded = settlement.generation != self.session.generation
                    || self.guard.is_tripped();
                if superseded {
                    self.session.diagnostics.suppressed_rejections += 1;
                    log::debug!(
                        "Session: Suppressed rejection from superseded play: {}",
                        rejection
                    );
                } else {
                    self.record_error(MediaErrorKind::PlaybackError, rejection.to_string());
                    self.transition(PlaybackPhase::Errored);
                }
            }
        }
        self.publish();
    }

    /// Waits for the pending play operation, if any, and applies its outcome.
    /// Returns `false` when nothing was pending.
    pub async fn settle_pending_play(&mut self) -> bool {
        if self.session.pending_play.is_none() {
            return false;
        }
        let settlement = self.next_play_settlement().await;
        self.apply_play_settlement(settlement);
        true
    }

    // --- Teardown ---

    /// Stops the engine and releases the sources. Engine commands are skipped
    /// once the guard has tripped; the engine was already stopped then.
    pub(crate) fn shutdown(&mut self) {
        log::info!("Session: Closing, releasing {} sources.", self.session.sources.len());
        if self.session.pending_play.take().is_some() {
            self.session.diagnostics.abandoned_operations += 1;
        }
        if !self.guard.is_tripped() && self.session.active_index.is_some() {
            if let Err(e) = self.engine.pause() {
                log::error!("Session: Failed to pause engine during shutdown: {}", e);
            }
            if let Err(e) = self.engine.unload() {
                log::error!("Session: Failed to unload engine during shutdown: {}", e);
            }
        }
        self.session.sources.clear();
        self.session.active_index = None;
        self.session.generation += 1;
        self.session.reset_source_state();
        if !self.session.phase.is_terminal() {
            self.transition(PlaybackPhase::Idle);
        }
        self.publish();
    }

    /// Ends the session and hands the engine back.
    pub fn close(mut self) -> E {
        self.shutdown();
        self.engine
    }
}

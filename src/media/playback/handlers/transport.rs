use super::*;

impl<E: PlaybackEngine> SessionCoordinator<E> {
    /// Play/pause toggle.
    ///
    /// Pausing first waits out a pending play (its outcome discarded) so the
    /// engine is never paused mid-start. Playing is optimistic: the phase
    /// becomes `Playing` as soon as the engine accepts the command and the
    /// returned operation is tracked until it settles.
    pub async fn request_play_pause(&mut self) {
        if !self.accepts_playback_commands("play/pause") {
            self.publish();
            return;
        }

        match self.session.phase {
            PlaybackPhase::Playing => self.pause_playback().await,
            PlaybackPhase::Ready | PlaybackPhase::Paused => self.start_playback(),
            // The toggle acts on the phase the stall interrupted.
            PlaybackPhase::Buffering => match self.session.resume_phase {
                PlaybackPhase::Playing => self.pause_playback().await,
                PlaybackPhase::Paused => self.start_playback(),
                _ => self.ignore_command("play/pause", "source is still loading"),
            },
            phase => self.ignore_command("play/pause", &format!("not available while {}", phase)),
        }
        self.publish();
    }

    fn start_playback(&mut self) {
        if self.session.pending_play.is_some() {
            self.ignore_command("play", "a play operation is still in flight");
            return;
        }
        log::info!(
            "Session: Playing source {:?} (generation {}).",
            self.session.active_index,
            self.session.generation
        );
        let operation = self.engine.play();
        self.session.pending_play = Some(PendingPlay {
            generation: self.session.generation,
            operation,
        });
        if self.session.phase == PlaybackPhase::Buffering {
            // Stay in Buffering until the engine reports `playing`.
            self.session.resume_phase = PlaybackPhase::Playing;
        } else {
            self.transition(PlaybackPhase::Playing);
        }
    }

    async fn pause_playback(&mut self) {
        if let Some(pending) = self.session.pending_play.take() {
            log::debug!(
                "Session: Pause waiting for pending play (generation {}) to settle.",
                pending.generation
            );
            self.await_and_ignore(pending, "pause").await;
        }
        if let Err(e) = self.engine.pause() {
            log::error!("Session: Engine pause failed: {}", e);
            self.record_error(MediaErrorKind::PlaybackError, e.to_string());
            self.transition(PlaybackPhase::Errored);
            return;
        }
        log::info!("Session: Paused at {:.2}s.", self.session.timing.current_time);
        self.transition(PlaybackPhase::Paused);
    }

    /// Seeks to `fraction` of the known duration. No-op until metadata has
    /// arrived.
    pub fn request_seek(&mut self, fraction: f64) {
        if !self.accepts_playback_commands("seek") {
            self.publish();
            return;
        }
        let Some(duration) = self.session.timing.duration else {
            self.ignore_command("seek", "duration unknown");
            self.publish();
            return;
        };
        if self.session.phase == PlaybackPhase::Switching {
            self.ignore_command("seek", "switch in progress");
            self.publish();
            return;
        }
        let Some(position) = time::position_for_fraction(fraction, duration) else {
            log::warn!("Session: Seek ignored, fraction {} is not a number.", fraction);
            self.session.diagnostics.ignored_commands += 1;
            self.publish();
            return;
        };

        self.session.timing.current_time = position;
        if let Err(e) = self.engine.seek(position) {
            log::error!("Session: Engine seek to {:.2}s failed: {}", position, e);
        }
        emit_tick_event(
            &self.emitter,
            self.session.active_index,
            position,
            self.session.timing.duration,
        );
        self.publish();
    }
}

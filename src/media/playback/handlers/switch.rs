use super::*;

impl<E: PlaybackEngine> SessionCoordinator<E> {
    /// Moves playback to another source in the catalog.
    ///
    /// Rejected when the target is already active, a switch is in progress,
    /// the target is out of range or the guard has tripped. Otherwise the
    /// session enters `Switching`, bumps its generation so anything still in
    /// flight for the old source reads as stale, waits out a pending play
    /// (discarding its outcome), then loads the target and enters `Loading`.
    /// A later switch simply runs the same sequence for its own target.
    pub async fn request_switch(&mut self, target_index: usize) {
        if !self.accepts_playback_commands("switch") {
            self.publish();
            return;
        }
        if target_index >= self.session.sources.len() {
            log::warn!(
                "Session: Switch to {} ignored, only {} sources.",
                target_index,
                self.session.sources.len()
            );
            self.session.diagnostics.ignored_commands += 1;
            self.publish();
            return;
        }
        if self.session.active_index == Some(target_index) {
            self.ignore_command("switch", "target is already the active source");
            self.publish();
            return;
        }
        if self.session.phase == PlaybackPhase::Switching {
            self.ignore_command("switch", "a switch is already in progress");
            self.publish();
            return;
        }

        log::info!(
            "Session: Switching from source {:?} to {}.",
            self.session.active_index,
            target_index
        );
        self.session.generation += 1;
        self.session.reset_source_state();
        self.transition(PlaybackPhase::Switching);
        self.publish();

        if let Some(pending) = self.session.pending_play.take() {
            self.await_and_ignore(pending, "switch").await;
        }

        let source = self.session.sources[target_index].clone();
        self.session.active_index = Some(target_index);
        self.session.last_error = None;
        match self.engine.load(&source, self.session.generation) {
            Ok(()) => {
                log::info!(
                    "Session: Loading source {} '{}' (generation {}).",
                    source.index,
                    source.uri,
                    self.session.generation
                );
                self.transition(PlaybackPhase::Loading);
                emit_load_event(&self.emitter, source.index, &source.uri, None);
            }
            Err(e) => {
                log::error!("Session: Engine load failed: {}", e);
                self.record_error(MediaErrorKind::LoadError, e.to_string());
                self.transition(PlaybackPhase::Errored);
            }
        }
        self.publish();
    }
}

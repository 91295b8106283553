use super::*;

impl<E: PlaybackEngine> SessionCoordinator<E> {
    /// Installs the source catalog and puts the session in `Idle`.
    ///
    /// An empty catalog leaves the session in the empty-media state, where
    /// playback commands are no-ops. Re-initializing an open session releases
    /// the current source first. With `autoload_first_source` the first
    /// switch to index 0 happens here.
    pub async fn initialize(&mut self, sources: Vec<String>) {
        if self.guard.is_tripped() {
            self.ignore_command("initialize", "session is rate limited");
            self.publish();
            return;
        }

        if self.session.active_index.is_some() {
            log::info!("Session: Re-initializing, releasing the current source.");
            if self.session.pending_play.take().is_some() {
                self.session.diagnostics.abandoned_operations += 1;
            }
            if let Err(e) = self.engine.unload() {
                log::error!("Session: Failed to unload previous source: {}", e);
            }
        }

        self.session.sources = MediaSource::catalog(sources);
        self.session.active_index = None;
        self.session.generation += 1;
        self.session.last_error = None;
        self.session.reset_source_state();
        self.transition(PlaybackPhase::Idle);

        if self.session.has_media() {
            log::info!(
                "Session: Initialized with {} sources.",
                self.session.sources.len()
            );
        } else {
            log::warn!("Session: Initialized without media sources; playback disabled.");
        }
        self.publish();

        if self.config.autoload_first_source && self.session.has_media() {
            self.request_switch(0).await;
        }
    }
}

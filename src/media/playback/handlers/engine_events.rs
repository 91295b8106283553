use super::*;
use crate::media::engine::{MediaErrorCode, NetworkState};

impl<E: PlaybackEngine> SessionCoordinator<E> {
    /// Applies one engine notification.
    ///
    /// Events tagged with an older generation belong to a source that has
    /// since been replaced and are dropped, as is everything that arrives
    /// after the rate-limit guard has tripped.
    pub fn handle_engine_event(&mut self, event: EngineEvent) {
        if self.guard.is_tripped() {
            log::trace!(
                "Session: '{}' event dropped, session is rate limited.",
                event.kind.name()
            );
            return;
        }
        if self.is_stale(&event) {
            self.session.diagnostics.stale_events += 1;
            log::debug!(
                "Session: Dropping stale '{}' event (generation {}, current {}).",
                event.kind.name(),
                event.generation,
                self.session.generation
            );
            self.publish();
            return;
        }

        match event.kind {
            EngineEventKind::LoadStart => {
                log::debug!("Session: Engine started fetching source {:?}.", self.session.active_index);
            }
            EngineEventKind::CanPlay => self.on_can_play(),
            EngineEventKind::LoadedMetadata { duration } => self.on_loaded_metadata(duration),
            EngineEventKind::TimeUpdate { time } => {
                let position = time::clamp_position(time, self.session.timing.duration);
                self.session.timing.current_time = position;
                emit_tick_event(
                    &self.emitter,
                    self.session.active_index,
                    position,
                    self.session.timing.duration,
                );
            }
            EngineEventKind::Waiting => self.on_waiting(),
            EngineEventKind::Playing => {
                if self.session.phase == PlaybackPhase::Buffering {
                    self.transition(PlaybackPhase::Playing);
                }
            }
            EngineEventKind::Progress { buffered } => self.session.buffered = buffered,
            EngineEventKind::Ended => self.on_ended(),
            EngineEventKind::Error {
                code,
                network_state,
                http_status,
                message,
            } => self.on_engine_error(code, network_state, http_status, message),
        }
        self.publish();
    }

    fn is_stale(&self, event: &EngineEvent) -> bool {
        event.generation != self.session.generation
            || self.session.active_index.is_none()
            || self.session.phase == PlaybackPhase::Switching
    }

    fn on_can_play(&mut self) {
        match self.session.phase {
            PlaybackPhase::Loading => self.transition(PlaybackPhase::Ready),
            PlaybackPhase::Buffering => {
                // Data is back but nothing said `playing`; fall back to where we were.
                let resume = self.session.resume_phase;
                if resume != PlaybackPhase::Playing {
                    self.transition(resume);
                }
            }
            _ => {}
        }
    }

    fn on_loaded_metadata(&mut self, duration: f64) {
        let duration = time::sanitize_duration(duration);
        self.session.timing.duration = duration;
        self.session.timing.current_time =
            time::clamp_position(self.session.timing.current_time, duration);
        if let Some(index) = self.session.active_index {
            let uri = self.session.sources[index].uri.clone();
            emit_load_event(&self.emitter, index, &uri, duration);
        }
    }

    fn on_waiting(&mut self) {
        let phase = self.session.phase;
        match phase {
            PlaybackPhase::Errored | PlaybackPhase::Idle | PlaybackPhase::Buffering => {}
            _ => {
                self.session.resume_phase = if phase == PlaybackPhase::Loading {
                    PlaybackPhase::Ready
                } else {
                    phase
                };
                self.transition(PlaybackPhase::Buffering);
            }
        }
    }

    fn on_ended(&mut self) {
        let playing = match self.session.phase {
            PlaybackPhase::Playing => true,
            PlaybackPhase::Buffering => self.session.resume_phase == PlaybackPhase::Playing,
            _ => false,
        };
        if playing {
            if let Some(duration) = self.session.timing.duration {
                self.session.timing.current_time = duration;
            }
            log::info!("Session: Source {:?} ended.", self.session.active_index);
            self.transition(PlaybackPhase::Paused);
        }
    }

    fn on_engine_error(
        &mut self,
        code: MediaErrorCode,
        network_state: NetworkState,
        http_status: Option<u16>,
        message: String,
    ) {
        let kind = guard::classify_engine_error(code, http_status, &message, self.session.phase);
        log::debug!(
            "Session: Engine error {:?} (network {:?}, status {:?}) classified as {}.",
            code,
            network_state,
            http_status,
            kind
        );
        if kind == MediaErrorKind::NetworkRateLimited {
            self.trip_rate_limit(http_status, message);
            return;
        }
        self.record_error(kind, message);
        self.transition(PlaybackPhase::Errored);
    }

    /// Stops all playback for the rest of the session.
    fn trip_rate_limit(&mut self, http_status: Option<u16>, message: String) {
        let reason = match http_status {
            Some(status) => format!("HTTP {}: {}", status, message),
            None => message,
        };
        if !self.guard.trip(reason.clone()) {
            return;
        }
        log::error!(
            "Session: Media host rate limited source {:?}; disabling playback. {}",
            self.session.active_index,
            reason
        );
        if self.session.pending_play.take().is_some() {
            self.session.diagnostics.abandoned_operations += 1;
        }
        if let Err(e) = self.engine.pause() {
            log::error!("Session: Failed to pause engine after rate limit: {}", e);
        }
        if let Err(e) = self.engine.unload() {
            log::error!("Session: Failed to unload engine after rate limit: {}", e);
        }
        self.record_error(MediaErrorKind::NetworkRateLimited, reason);
        self.transition(PlaybackPhase::RateLimited);
    }
}

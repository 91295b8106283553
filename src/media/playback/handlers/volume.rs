use super::*;

impl<E: PlaybackEngine> SessionCoordinator<E> {
    /// Records the volume level and forwards it to the engine. Works without
    /// media; once rate limited the level is still recorded but the engine is
    /// left alone.
    pub fn set_volume(&mut self, level: f32) {
        if !level.is_finite() {
            log::warn!("Session: SetVolume ignored, level {} is not finite.", level);
            self.session.diagnostics.ignored_commands += 1;
            self.publish();
            return;
        }
        let clamped_level = level.clamp(0.0, 1.0);
        self.session.volume.level = clamped_level;
        log::debug!("Session: Set volume to {}", clamped_level);

        if !self.guard.is_tripped() {
            if let Err(e) = self.engine.set_volume(clamped_level) {
                log::error!("Session: Engine set_volume failed: {}", e);
            }
        }
        self.publish();
    }

    pub fn toggle_mute(&mut self) {
        let muted = !self.session.volume.muted;
        self.session.volume.muted = muted;
        log::debug!("Session: Muted = {}", muted);

        if !self.guard.is_tripped() {
            if let Err(e) = self.engine.set_muted(muted) {
                log::error!("Session: Engine set_muted failed: {}", e);
            }
        }
        self.publish();
    }
}

pub mod media;

pub use media::catalog::MovieRecord;
pub use media::config::SessionConfig;
pub use media::engine::{engine_event_channel, EngineEvent, EngineEventKind, PlaybackEngine};
pub use media::errors::{CatalogError, ConfigError, EngineError, PlayRejection, SessionError};
pub use media::playback::commands::SessionHandle;
pub use media::playback::events::SessionEvent;
pub use media::playback::{spawn_session, SessionCoordinator};
pub use media::types::{MediaErrorKind, PlaybackPhase, SessionSnapshot};

/// Installs `env_logger` with an `info` default filter, overridable through
/// `RUST_LOG`. Safe to call more than once.
pub fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init();
}

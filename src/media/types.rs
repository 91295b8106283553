use serde::{Deserialize, Serialize};
use std::fmt;

// --- Media Sources ---

/// One entry of the session's source catalog. The sequence is fixed for the
/// lifetime of a session; switching only moves the active index.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MediaSource {
    pub uri: String,
    pub index: usize,
}

impl MediaSource {
    /// Builds an indexed catalog, preserving the order of `uris`.
    pub fn catalog<I, S>(uris: I) -> Vec<MediaSource>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        uris.into_iter()
            .enumerate()
            .map(|(index, uri)| MediaSource {
                uri: uri.into(),
                index,
            })
            .collect()
    }
}

// --- Session Phase ---

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum PlaybackPhase {
    #[default]
    Idle,
    Loading,
    Ready,
    Playing,
    Paused,
    Buffering,
    Switching,
    Errored,
    RateLimited,
}

impl PlaybackPhase {
    /// `RateLimited` is the only phase nothing can leave.
    pub fn is_terminal(self) -> bool {
        self == PlaybackPhase::RateLimited
    }

    /// Phases the presentation layer renders as a loading spinner.
    pub fn is_loading(self) -> bool {
        matches!(
            self,
            PlaybackPhase::Loading | PlaybackPhase::Switching | PlaybackPhase::Buffering
        )
    }
}

impl fmt::Display for PlaybackPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PlaybackPhase::Idle => "idle",
            PlaybackPhase::Loading => "loading",
            PlaybackPhase::Ready => "ready",
            PlaybackPhase::Playing => "playing",
            PlaybackPhase::Paused => "paused",
            PlaybackPhase::Buffering => "buffering",
            PlaybackPhase::Switching => "switching",
            PlaybackPhase::Errored => "errored",
            PlaybackPhase::RateLimited => "rateLimited",
        };
        f.write_str(name)
    }
}

// --- Timing & Volume ---

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Timing {
    pub current_time: f64,
    /// `None` until the engine reports metadata for the active source.
    pub duration: Option<f64>,
}

/// Level and mute are independent: a muted session keeps its level.
#[derive(Serialize, Debug, Clone, Copy, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VolumeState {
    pub level: f32,
    pub muted: bool,
}

impl VolumeState {
    pub fn new(level: f32, muted: bool) -> Self {
        let level = if level.is_finite() {
            level.clamp(0.0, 1.0)
        } else {
            1.0
        };
        VolumeState { level, muted }
    }
}

impl Default for VolumeState {
    fn default() -> Self {
        VolumeState::new(1.0, false)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BufferedRange {
    pub start: f64,
    pub end: f64,
}

// --- User-Visible Errors ---

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum MediaErrorKind {
    /// The source failed to initialize.
    LoadError,
    /// A play/pause operation was rejected, or playback broke mid-stream.
    PlaybackError,
    /// The media host answered with "too many requests". Sticky.
    NetworkRateLimited,
    UnknownMediaError,
}

impl fmt::Display for MediaErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MediaErrorKind::LoadError => "LoadError",
            MediaErrorKind::PlaybackError => "PlaybackError",
            MediaErrorKind::NetworkRateLimited => "NetworkRateLimited",
            MediaErrorKind::UnknownMediaError => "UnknownMediaError",
        };
        f.write_str(name)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MediaError {
    pub kind: MediaErrorKind,
    pub message: String,
}

impl MediaError {
    pub fn new(kind: MediaErrorKind, message: impl Into<String>) -> Self {
        MediaError {
            kind,
            message: message.into(),
        }
    }
}

// --- Snapshot ---

/// Counters for things the session swallowed on purpose. Never shown to the
/// user as failures.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct SessionDiagnostics {
    /// Play rejections discarded because a pause or switch superseded them.
    pub suppressed_rejections: u64,
    /// Engine events dropped because they belonged to a superseded source.
    pub stale_events: u64,
    /// Pending play operations given up on after the settle timeout, or
    /// dropped by a rate-limit trip or shutdown.
    pub abandoned_operations: u64,
    /// Commands rejected as no-ops by phase validation.
    pub ignored_commands: u64,
}

/// Read-only view of the session handed to the presentation layer.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub phase: PlaybackPhase,
    pub active_index: Option<usize>,
    pub source_count: usize,
    pub has_media: bool,
    pub play_pending: bool,
    pub timing: Timing,
    pub volume: VolumeState,
    pub buffered: Vec<BufferedRange>,
    pub last_error: Option<MediaError>,
    pub rate_limited: bool,
    pub is_loading: bool,
    pub diagnostics: SessionDiagnostics,
}

impl Default for SessionSnapshot {
    fn default() -> Self {
        SessionSnapshot {
            phase: PlaybackPhase::Idle,
            active_index: None,
            source_count: 0,
            has_media: false,
            play_pending: false,
            timing: Timing::default(),
            volume: VolumeState::default(),
            buffered: Vec::new(),
            last_error: None,
            rate_limited: false,
            is_loading: false,
            diagnostics: SessionDiagnostics::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_preserves_order() {
        let catalog = MediaSource::catalog(["a.mp4", "b.mp4", "c.mp4"]);
        assert_eq!(catalog.len(), 3);
        assert_eq!(catalog[2].uri, "c.mp4");
        assert_eq!(catalog[2].index, 2);
    }

    #[test]
    fn test_volume_state_clamps() {
        assert_eq!(VolumeState::new(1.7, false).level, 1.0);
        assert_eq!(VolumeState::new(-0.2, true).level, 0.0);
        assert_eq!(VolumeState::new(f32::NAN, false).level, 1.0);
    }

    #[test]
    fn test_snapshot_serializes_camel_case() {
        let json = serde_json::to_value(SessionSnapshot::default()).unwrap();
        assert_eq!(json["phase"], "idle");
        assert!(json.get("activeIndex").is_some());
        assert_eq!(json["diagnostics"]["staleEvents"], 0);
    }
}

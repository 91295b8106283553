use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot};

use crate::media::errors::{EngineError, PlayRejection};
use crate::media::types::{BufferedRange, MediaSource};

pub mod sim;

/// The runtime's media element, owned exclusively by one session.
///
/// Synchronous commands report immediate failures only. Everything the engine
/// learns later (readiness, metadata, stalls, failures) comes back as an
/// [`EngineEvent`] tagged with the generation passed to the `load` that
/// produced it.
pub trait PlaybackEngine: Send {
    fn load(&mut self, source: &MediaSource, generation: u64) -> Result<(), EngineError>;
    /// Starts playback. The returned operation settles independently of the
    /// caller.
    fn play(&mut self) -> PlayOperation;
    fn pause(&mut self) -> Result<(), EngineError>;
    fn seek(&mut self, position_seconds: f64) -> Result<(), EngineError>;
    fn set_volume(&mut self, level: f32) -> Result<(), EngineError>;
    fn set_muted(&mut self, muted: bool) -> Result<(), EngineError>;
    /// Clears the current source and releases whatever it holds.
    fn unload(&mut self) -> Result<(), EngineError>;
}

// --- Play Operation Handles ---

pub type PlayOutcome = Result<(), PlayRejection>;

/// Handle to an in-flight play invocation. Dropping it abandons the outcome;
/// the engine sees that through [`PlayResolver::is_abandoned`].
#[derive(Debug)]
pub struct PlayOperation {
    receiver: oneshot::Receiver<PlayOutcome>,
}

/// Engine-side half of a [`PlayOperation`].
#[derive(Debug)]
pub struct PlayResolver {
    sender: oneshot::Sender<PlayOutcome>,
}

pub fn play_operation() -> (PlayResolver, PlayOperation) {
    let (sender, receiver) = oneshot::channel();
    (PlayResolver { sender }, PlayOperation { receiver })
}

impl PlayOperation {
    pub fn resolved() -> Self {
        let (resolver, operation) = play_operation();
        resolver.resolve();
        operation
    }

    pub fn rejected(rejection: PlayRejection) -> Self {
        let (resolver, operation) = play_operation();
        resolver.reject(rejection);
        operation
    }
}

impl Future for PlayOperation {
    type Output = PlayOutcome;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.receiver)
            .poll(cx)
            .map(|received| received.unwrap_or(Err(PlayRejection::Dropped)))
    }
}

impl PlayResolver {
    pub fn resolve(self) {
        // The session may already have abandoned the operation.
        let _ = self.sender.send(Ok(()));
    }

    pub fn reject(self, rejection: PlayRejection) {
        let _ = self.sender.send(Err(rejection));
    }

    pub fn is_abandoned(&self) -> bool {
        self.sender.is_closed()
    }
}

// --- Engine Events ---

/// Mirrors the HTML media error codes.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum MediaErrorCode {
    Aborted,
    Network,
    Decode,
    SrcNotSupported,
    Unknown,
}

impl MediaErrorCode {
    pub fn from_code(code: u16) -> Self {
        match code {
            1 => MediaErrorCode::Aborted,
            2 => MediaErrorCode::Network,
            3 => MediaErrorCode::Decode,
            4 => MediaErrorCode::SrcNotSupported,
            _ => MediaErrorCode::Unknown,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum NetworkState {
    Empty,
    Idle,
    Loading,
    NoSource,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EngineEventKind {
    LoadStart,
    CanPlay,
    LoadedMetadata {
        duration: f64,
    },
    TimeUpdate {
        time: f64,
    },
    Waiting,
    Playing,
    Progress {
        buffered: Vec<BufferedRange>,
    },
    Ended,
    Error {
        code: MediaErrorCode,
        network_state: NetworkState,
        /// Transport status behind a network failure, when the engine knows it.
        http_status: Option<u16>,
        message: String,
    },
}

impl EngineEventKind {
    pub fn name(&self) -> &'static str {
        match self {
            EngineEventKind::LoadStart => "loadStart",
            EngineEventKind::CanPlay => "canPlay",
            EngineEventKind::LoadedMetadata { .. } => "loadedMetadata",
            EngineEventKind::TimeUpdate { .. } => "timeUpdate",
            EngineEventKind::Waiting => "waiting",
            EngineEventKind::Playing => "playing",
            EngineEventKind::Progress { .. } => "progress",
            EngineEventKind::Ended => "ended",
            EngineEventKind::Error { .. } => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EngineEvent {
    pub generation: u64,
    pub kind: EngineEventKind,
}

impl EngineEvent {
    pub fn new(generation: u64, kind: EngineEventKind) -> Self {
        EngineEvent { generation, kind }
    }
}

/// Sender engines use to push events into the session loop. Unbounded so a
/// media callback never blocks.
#[derive(Debug, Clone)]
pub struct EngineEventSink {
    sender: mpsc::UnboundedSender<EngineEvent>,
}

pub type EngineEventReceiver = mpsc::UnboundedReceiver<EngineEvent>;

pub fn engine_event_channel() -> (EngineEventSink, EngineEventReceiver) {
    let (sender, receiver) = mpsc::unbounded_channel();
    (EngineEventSink { sender }, receiver)
}

impl EngineEventSink {
    /// Returns `false` once the session has gone away.
    pub fn emit(&self, generation: u64, kind: EngineEventKind) -> bool {
        let name = kind.name();
        match self.sender.send(EngineEvent::new(generation, kind)) {
            Ok(()) => true,
            Err(_) => {
                log::debug!(
                    "Engine: '{}' event for generation {} dropped, session closed.",
                    name,
                    generation
                );
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_play_operation_resolves() {
        let (resolver, operation) = play_operation();
        resolver.resolve();
        assert_eq!(operation.await, Ok(()));
    }

    #[tokio::test]
    async fn test_play_operation_rejects() {
        let operation = PlayOperation::rejected(PlayRejection::NotAllowed("autoplay".into()));
        assert_eq!(
            operation.await,
            Err(PlayRejection::NotAllowed("autoplay".into()))
        );
    }

    #[tokio::test]
    async fn test_dropped_resolver_reads_as_rejection() {
        let (resolver, operation) = play_operation();
        drop(resolver);
        assert_eq!(operation.await, Err(PlayRejection::Dropped));
    }

    #[test]
    fn test_abandoned_operation_is_visible_to_engine() {
        let (resolver, operation) = play_operation();
        assert!(!resolver.is_abandoned());
        drop(operation);
        assert!(resolver.is_abandoned());
    }

    #[tokio::test]
    async fn test_event_sink_reports_closed_session() {
        let (sink, mut receiver) = engine_event_channel();
        assert!(sink.emit(3, EngineEventKind::CanPlay));
        let event = receiver.recv().await.unwrap();
        assert_eq!(event, EngineEvent::new(3, EngineEventKind::CanPlay));

        drop(receiver);
        assert!(!sink.emit(3, EngineEventKind::Waiting));
    }

    #[test]
    fn test_error_codes_follow_media_element_numbering() {
        assert_eq!(MediaErrorCode::from_code(2), MediaErrorCode::Network);
        assert_eq!(MediaErrorCode::from_code(4), MediaErrorCode::SrcNotSupported);
        assert_eq!(MediaErrorCode::from_code(42), MediaErrorCode::Unknown);
    }
}

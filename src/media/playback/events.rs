use serde::Serialize;
use tokio::sync::{broadcast, watch};

use crate::media::config::SESSION_EVENT_CHANNEL_SIZE;
use crate::media::types::{MediaErrorKind, PlaybackPhase, SessionSnapshot};

// --- Event Payloads for the Presentation Layer ---

#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatusEventPayload {
    pub phase: PlaybackPhase,
    pub active_index: Option<usize>,
    pub play_pending: bool,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionTickEventPayload {
    pub active_index: Option<usize>,
    pub current_time: f64,
    pub duration: Option<f64>,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionErrorEventPayload {
    pub active_index: Option<usize>,
    pub kind: MediaErrorKind,
    pub error: String,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionLoadEventPayload {
    pub active_index: usize,
    pub uri: String,
    pub duration: Option<f64>,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(tag = "event", content = "payload")]
pub enum SessionEvent {
    #[serde(rename = "session://status")]
    Status(SessionStatusEventPayload),
    #[serde(rename = "session://tick")]
    Tick(SessionTickEventPayload),
    #[serde(rename = "session://error")]
    Error(SessionErrorEventPayload),
    #[serde(rename = "session://load")]
    Load(SessionLoadEventPayload),
}

impl SessionEvent {
    pub fn name(&self) -> &'static str {
        match self {
            SessionEvent::Status(_) => "session://status",
            SessionEvent::Tick(_) => "session://tick",
            SessionEvent::Error(_) => "session://error",
            SessionEvent::Load(_) => "session://load",
        }
    }
}

/// Fan-out for notifications and the latest snapshot.
pub(crate) struct SessionEmitter {
    events: broadcast::Sender<SessionEvent>,
    snapshots: watch::Sender<SessionSnapshot>,
}

impl SessionEmitter {
    pub(crate) fn new() -> Self {
        let (events, _) = broadcast::channel(SESSION_EVENT_CHANNEL_SIZE);
        let (snapshots, _) = watch::channel(SessionSnapshot::default());
        SessionEmitter { events, snapshots }
    }

    pub(crate) fn event_sender(&self) -> broadcast::Sender<SessionEvent> {
        self.events.clone()
    }

    pub(crate) fn subscribe_snapshots(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshots.subscribe()
    }

    pub(crate) fn publish_snapshot(&self, snapshot: SessionSnapshot) {
        self.snapshots.send_if_modified(|current| {
            if *current == snapshot {
                return false;
            }
            *current = snapshot;
            true
        });
    }

    fn emit(&self, event: SessionEvent) {
        // No subscribers is fine; the snapshot channel still carries the state.
        let name = event.name();
        if self.events.send(event).is_err() {
            log::trace!("No listeners for {}", name);
        }
    }
}

// --- Event Emitter Helpers ---

pub(crate) fn emit_status_event(
    emitter: &SessionEmitter,
    phase: PlaybackPhase,
    active_index: Option<usize>,
    play_pending: bool,
) {
    emitter.emit(SessionEvent::Status(SessionStatusEventPayload {
        phase,
        active_index,
        play_pending,
    }));
}

pub(crate) fn emit_tick_event(
    emitter: &SessionEmitter,
    active_index: Option<usize>,
    current_time: f64,
    duration: Option<f64>,
) {
    emitter.emit(SessionEvent::Tick(SessionTickEventPayload {
        active_index,
        current_time,
        duration,
    }));
}

pub(crate) fn emit_error_event(
    emitter: &SessionEmitter,
    active_index: Option<usize>,
    kind: MediaErrorKind,
    error_message: &str,
) {
    emitter.emit(SessionEvent::Error(SessionErrorEventPayload {
        active_index,
        kind,
        error: error_message.to_string(),
    }));
}

pub(crate) fn emit_load_event(
    emitter: &SessionEmitter,
    active_index: usize,
    uri: &str,
    duration: Option<f64>,
) {
    emitter.emit(SessionEvent::Load(SessionLoadEventPayload {
        active_index,
        uri: uri.to_string(),
        duration,
    }));
}

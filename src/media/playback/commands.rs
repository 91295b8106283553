use tokio::sync::{broadcast, mpsc, oneshot, watch};

use super::events::SessionEvent;
use crate::media::catalog::MovieRecord;
use crate::media::errors::{CatalogError, SessionError};
use crate::media::types::SessionSnapshot;

// --- Session Loop Commands ---
#[derive(Debug)]
pub enum SessionCommand {
    Initialize(Vec<String>),
    PlayPause,
    Switch(usize),
    /// Fraction of the known duration in `[0, 1]`.
    Seek(f64),
    SetVolume(f32),
    ToggleMute,
    Shutdown(oneshot::Sender<()>),
}

// --- Presentation-Facing Handle ---

/// Cheap-to-clone front for a session running on its own thread.
///
/// Commands are queued in order and applied one at a time; the handle never
/// sees intermediate state except through [`snapshot`](Self::snapshot) and the
/// event stream.
#[derive(Clone)]
pub struct SessionHandle {
    command_sender: mpsc::Sender<SessionCommand>,
    snapshots: watch::Receiver<SessionSnapshot>,
    events: broadcast::Sender<SessionEvent>,
}

impl SessionHandle {
    pub(crate) fn new(
        command_sender: mpsc::Sender<SessionCommand>,
        snapshots: watch::Receiver<SessionSnapshot>,
        events: broadcast::Sender<SessionEvent>,
    ) -> Self {
        SessionHandle {
            command_sender,
            snapshots,
            events,
        }
    }

    async fn send(&self, command: SessionCommand) -> Result<(), SessionError> {
        self.command_sender.send(command).await.map_err(|e| {
            log::error!("Failed to send {:?} to session loop: {}", e.0, e);
            SessionError::from(e)
        })
    }

    pub async fn initialize(&self, sources: Vec<String>) -> Result<(), SessionError> {
        log::info!("CMD: Initialize session with {} sources", sources.len());
        self.send(SessionCommand::Initialize(sources)).await
    }

    /// Initializes from a catalog record; a record without playable sources
    /// still opens an empty-media session.
    pub async fn initialize_from_record(&self, record: &MovieRecord) -> Result<(), SessionError> {
        if let Err(CatalogError::NoPlayableSources { id }) = record.require_sources() {
            log::warn!("CMD: Movie '{}' has no playable sources", id);
        }
        self.initialize(record.playable_sources()).await
    }

    pub async fn play_pause(&self) -> Result<(), SessionError> {
        log::info!("CMD: Play/pause");
        self.send(SessionCommand::PlayPause).await
    }

    pub async fn switch(&self, index: usize) -> Result<(), SessionError> {
        log::info!("CMD: Switch to source {}", index);
        self.send(SessionCommand::Switch(index)).await
    }

    pub async fn seek(&self, fraction: f64) -> Result<(), SessionError> {
        log::info!("CMD: Seek to fraction {}", fraction);
        self.send(SessionCommand::Seek(fraction)).await
    }

    pub async fn set_volume(&self, level: f32) -> Result<(), SessionError> {
        log::debug!("CMD: Set volume {}", level);
        self.send(SessionCommand::SetVolume(level)).await
    }

    pub async fn toggle_mute(&self) -> Result<(), SessionError> {
        log::debug!("CMD: Toggle mute");
        self.send(SessionCommand::ToggleMute).await
    }

    /// Tears the session down and waits for the loop to confirm.
    pub async fn shutdown(&self) -> Result<(), SessionError> {
        log::info!("CMD: Shutdown session");
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        self.send(SessionCommand::Shutdown(shutdown_tx)).await?;
        shutdown_rx.await.map_err(|e| {
            log::error!("Failed to receive shutdown confirmation from session loop: {}", e);
            SessionError::ShutdownSignalError(e.to_string())
        })
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshots.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshots.clone()
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Waits for the first snapshot matching `predicate`.
    pub async fn wait_until<F>(&self, mut predicate: F) -> Result<SessionSnapshot, SessionError>
    where
        F: FnMut(&SessionSnapshot) -> bool,
    {
        let mut snapshots = self.snapshots.clone();
        let snapshot = snapshots
            .wait_for(|snapshot| predicate(snapshot))
            .await
            .map_err(|_| SessionError::SessionClosed)?;
        Ok(snapshot.clone())
    }
}

use std::thread::JoinHandle;

use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;

use crate::media::config::SessionConfig;
use crate::media::engine::{EngineEventReceiver, PlaybackEngine};
use crate::media::errors::SessionError;
use commands::{SessionCommand, SessionHandle};

pub mod commands;
mod coordinator;
pub use coordinator::SessionCoordinator;
pub mod events;
mod handlers;
pub mod state;
pub(crate) mod time;

// --- Session Thread Implementation ---

/// Starts a session on a dedicated thread and returns the handle the
/// presentation layer talks to.
///
/// `engine_events` must be the receiving end of the sink the engine emits on.
pub fn spawn_session<E>(
    engine: E,
    engine_events: EngineEventReceiver,
    config: SessionConfig,
) -> Result<(SessionHandle, JoinHandle<()>), SessionError>
where
    E: PlaybackEngine + 'static,
{
    config.validate()?;
    let (command_tx, command_rx) = mpsc::channel(config.command_channel_size);
    let coordinator = SessionCoordinator::new(engine, config);
    let handle = SessionHandle::new(command_tx, coordinator.subscribe(), coordinator.event_sender());

    let thread = std::thread::Builder::new()
        .name("playback-session".into())
        .spawn(move || {
            log::info!("Session Thread: Building Tokio current_thread runtime...");
            let rt = match tokio::runtime::Builder::new_current_thread()
                .enable_time()
                .build()
            {
                Ok(rt) => rt,
                Err(e) => {
                    log::error!("Session Thread: Failed to build Tokio runtime: {}", e);
                    return;
                }
            };
            rt.block_on(run_session_loop(coordinator, command_rx, engine_events));
            log::info!("Session thread has stopped.");
        })
        .map_err(SessionError::ThreadSpawn)?;

    Ok((handle, thread))
}

/// Drives one session until it is shut down or every handle is dropped.
///
/// Play settlements are applied before engine events, and both before queued
/// commands, so a command always sees the outcome of everything that already
/// happened to the engine.
pub async fn run_session_loop<E: PlaybackEngine>(
    mut coordinator: SessionCoordinator<E>,
    mut commands: mpsc::Receiver<SessionCommand>,
    mut engine_events: EngineEventReceiver,
) {
    log::info!("Session Loop: Entering main loop.");
    let mut should_shutdown = false;
    let mut engine_events_open = true;
    let mut tick_interval = tokio::time::interval(coordinator.config().tick_interval());
    tick_interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    while !should_shutdown {
        tokio::select! {
            biased;

            settlement = coordinator.next_play_settlement() => {
                coordinator.apply_play_settlement(settlement);
            }
            maybe_event = engine_events.recv(), if engine_events_open => {
                match maybe_event {
                    Some(event) => coordinator.handle_engine_event(event),
                    None => {
                        log::warn!("Session Loop: Engine event channel closed.");
                        engine_events_open = false;
                    }
                }
            }
            maybe_command = commands.recv() => {
                match maybe_command {
                    Some(command) => {
                        log::debug!("Session Loop Received: {:?}", command);
                        match command {
                            SessionCommand::Initialize(sources) => coordinator.initialize(sources).await,
                            SessionCommand::PlayPause => coordinator.request_play_pause().await,
                            SessionCommand::Switch(index) => coordinator.request_switch(index).await,
                            SessionCommand::Seek(fraction) => coordinator.request_seek(fraction),
                            SessionCommand::SetVolume(level) => coordinator.set_volume(level),
                            SessionCommand::ToggleMute => coordinator.toggle_mute(),
                            SessionCommand::Shutdown(shutdown_complete_tx) => {
                                log::info!("Session Loop: Shutdown received. Releasing sources.");
                                coordinator.shutdown();
                                should_shutdown = true;
                                if shutdown_complete_tx.send(()).is_err() {
                                    log::error!("Session Loop: Failed to send shutdown completion signal.");
                                }
                            }
                        }
                    }
                    None => {
                        log::info!("Session Loop: Command channel closed. Exiting loop.");
                        coordinator.shutdown();
                        should_shutdown = true;
                    }
                }
            }
            now = tick_interval.tick(), if !should_shutdown => {
                coordinator.check_stall(now);
            }
        }
    }
    log::info!("Session Loop: Finished.");
}

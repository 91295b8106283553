pub mod init;
pub mod transport;
pub mod switch;
pub mod volume;
pub mod engine_events;

use super::coordinator::SessionCoordinator;
use super::events::*;
use super::state::PendingPlay;
use super::time;
use crate::media::engine::{EngineEvent, EngineEventKind, PlaybackEngine};
use crate::media::guard;
use crate::media::types::{MediaErrorKind, MediaSource, PlaybackPhase};

//! In-memory engine that records every command and lets the caller decide
//! when play operations settle. Used by the test suites and for wiring a
//! session without a real media element.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use super::{
    play_operation, EngineEvent, EngineEventKind, EngineEventSink, PlayOperation, PlayResolver,
    PlaybackEngine,
};
use crate::media::errors::{EngineError, PlayRejection};
use crate::media::types::MediaSource;

#[derive(Debug, Clone, PartialEq)]
pub enum EngineCall {
    Load {
        index: usize,
        uri: String,
        generation: u64,
    },
    Play,
    Pause,
    Seek(f64),
    SetVolume(f32),
    SetMuted(bool),
    Unload,
}

#[derive(Debug)]
struct SimulatedEngineState {
    calls: Vec<EngineCall>,
    unsettled: VecDeque<PlayResolver>,
    generation: Option<u64>,
    auto_resolve_play: bool,
    interrupt_pending_plays: bool,
    max_plays_in_flight: usize,
    fail_next_load: Option<String>,
}

/// Cloning shares the same recorded state, so a test can keep one clone
/// while the session owns the other.
#[derive(Debug, Clone)]
pub struct SimulatedEngine {
    state: Arc<Mutex<SimulatedEngineState>>,
    events: Option<EngineEventSink>,
}

impl Default for SimulatedEngine {
    fn default() -> Self {
        SimulatedEngine::new()
    }
}

impl SimulatedEngine {
    pub fn new() -> Self {
        SimulatedEngine {
            state: Arc::new(Mutex::new(SimulatedEngineState {
                calls: Vec::new(),
                unsettled: VecDeque::new(),
                generation: None,
                auto_resolve_play: false,
                interrupt_pending_plays: true,
                max_plays_in_flight: 0,
                fail_next_load: None,
            })),
            events: None,
        }
    }

    pub fn with_event_sink(mut self, sink: EngineEventSink) -> Self {
        self.events = Some(sink);
        self
    }

    /// Play operations settle successfully as soon as they are issued.
    pub fn set_auto_resolve_play(&self, enabled: bool) {
        self.state().auto_resolve_play = enabled;
    }

    /// Like a media element, reject outstanding plays on `pause` and `load`.
    /// On by default.
    pub fn set_interrupt_pending_plays(&self, enabled: bool) {
        self.state().interrupt_pending_plays = enabled;
    }

    pub fn fail_next_load(&self, reason: impl Into<String>) {
        self.state().fail_next_load = Some(reason.into());
    }

    pub fn calls(&self) -> Vec<EngineCall> {
        self.state().calls.clone()
    }

    pub fn play_count(&self) -> usize {
        self.state()
            .calls
            .iter()
            .filter(|call| **call == EngineCall::Play)
            .count()
    }

    /// Highest number of unsettled, non-abandoned play operations ever
    /// outstanding at once.
    pub fn max_plays_in_flight(&self) -> usize {
        self.state().max_plays_in_flight
    }

    pub fn plays_in_flight(&self) -> usize {
        let mut state = self.state();
        state.unsettled.retain(|resolver| !resolver.is_abandoned());
        state.unsettled.len()
    }

    pub fn current_generation(&self) -> Option<u64> {
        self.state().generation
    }

    /// Settles the oldest outstanding play successfully.
    pub fn resolve_play(&self) -> bool {
        match self.next_unsettled() {
            Some(resolver) => {
                resolver.resolve();
                true
            }
            None => false,
        }
    }

    pub fn reject_play(&self, rejection: PlayRejection) -> bool {
        match self.next_unsettled() {
            Some(resolver) => {
                resolver.reject(rejection);
                true
            }
            None => false,
        }
    }

    /// An event tagged with the generation of the most recent load.
    pub fn event(&self, kind: EngineEventKind) -> Option<EngineEvent> {
        self.current_generation()
            .map(|generation| EngineEvent::new(generation, kind))
    }

    /// Pushes an event for the current source into the attached sink.
    pub fn emit(&self, kind: EngineEventKind) -> bool {
        match (self.current_generation(), self.events.as_ref()) {
            (Some(generation), Some(sink)) => sink.emit(generation, kind),
            _ => false,
        }
    }

    /// Pushes an event tagged with an explicit (possibly stale) generation.
    pub fn emit_for(&self, generation: u64, kind: EngineEventKind) -> bool {
        match self.events.as_ref() {
            Some(sink) => sink.emit(generation, kind),
            None => false,
        }
    }

    fn state(&self) -> MutexGuard<'_, SimulatedEngineState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn next_unsettled(&self) -> Option<PlayResolver> {
        let mut state = self.state();
        while let Some(resolver) = state.unsettled.pop_front() {
            if !resolver.is_abandoned() {
                return Some(resolver);
            }
        }
        None
    }

    fn interrupt_unsettled(state: &mut SimulatedEngineState, reason: &str) {
        if !state.interrupt_pending_plays {
            return;
        }
        for resolver in state.unsettled.drain(..) {
            resolver.reject(PlayRejection::Interrupted(reason.to_string()));
        }
    }
}

impl PlaybackEngine for SimulatedEngine {
    fn load(&mut self, source: &MediaSource, generation: u64) -> Result<(), EngineError> {
        let mut state = self.state();
        state.calls.push(EngineCall::Load {
            index: source.index,
            uri: source.uri.clone(),
            generation,
        });
        if let Some(reason) = state.fail_next_load.take() {
            return Err(EngineError::LoadRejected {
                index: source.index,
                uri: source.uri.clone(),
                reason,
            });
        }
        Self::interrupt_unsettled(&mut state, "interrupted by a new load request");
        state.generation = Some(generation);
        Ok(())
    }

    fn play(&mut self) -> PlayOperation {
        let mut state = self.state();
        state.calls.push(EngineCall::Play);
        if state.auto_resolve_play {
            return PlayOperation::resolved();
        }
        let (resolver, operation) = play_operation();
        state.unsettled.retain(|pending| !pending.is_abandoned());
        state.unsettled.push_back(resolver);
        state.max_plays_in_flight = state.max_plays_in_flight.max(state.unsettled.len());
        operation
    }

    fn pause(&mut self) -> Result<(), EngineError> {
        let mut state = self.state();
        state.calls.push(EngineCall::Pause);
        Self::interrupt_unsettled(&mut state, "interrupted by a call to pause()");
        Ok(())
    }

    fn seek(&mut self, position_seconds: f64) -> Result<(), EngineError> {
        self.state().calls.push(EngineCall::Seek(position_seconds));
        Ok(())
    }

    fn set_volume(&mut self, level: f32) -> Result<(), EngineError> {
        self.state().calls.push(EngineCall::SetVolume(level));
        Ok(())
    }

    fn set_muted(&mut self, muted: bool) -> Result<(), EngineError> {
        self.state().calls.push(EngineCall::SetMuted(muted));
        Ok(())
    }

    fn unload(&mut self) -> Result<(), EngineError> {
        let mut state = self.state();
        state.calls.push(EngineCall::Unload);
        Self::interrupt_unsettled(&mut state, "interrupted by removing the source");
        state.generation = None;
        Ok(())
    }
}

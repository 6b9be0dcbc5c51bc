use std::sync::Arc;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::info;

use crate::{
    catalog::{Track, TrackId},
    config::DrillConfig,
    debug::DebugOverlay,
    fault::FaultId,
    machine::{self, TickReport},
    outcome::{Completion, Exit},
    resolution::ActionId,
    resolver::{ActionInput, ActionOutcome},
    session::{Phase, SessionError, SessionState},
    snapshot::SessionSnapshot,
};

pub struct DrillSession<R = ChaCha8Rng> {
    state: SessionState,
    track: Track,
    config: Arc<DrillConfig>,
    debug: bool,
    rng: R,
}

impl DrillSession<ChaCha8Rng> {
    /// Session backed by a ChaCha generator seeded with `seed`.
    pub fn seeded(track: TrackId, config: Arc<DrillConfig>, seed: u64) -> Self {
        Self::new(Track::new(track), config, ChaCha8Rng::seed_from_u64(seed))
    }
}

impl<R: Rng> DrillSession<R> {
    pub fn new(track: Track, config: Arc<DrillConfig>, rng: R) -> Self {
        let state = SessionState::new(track.id(), &config);
        info!(
            target: "drill::session",
            track = %track.id(),
            budget = config.tick_budget,
            "session.phase=briefing"
        );
        Self {
            state,
            track,
            config,
            debug: false,
            rng,
        }
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.phase()
    }

    pub fn track(&self) -> &Track {
        &self.track
    }

    pub fn config(&self) -> &DrillConfig {
        &self.config
    }

    pub fn debug_enabled(&self) -> bool {
        self.debug
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot::capture(&self.state)
    }

    /// Diagnostic totals, only when the session was created in debug mode.
    pub fn debug_overlay(&self) -> Option<DebugOverlay> {
        self.debug
            .then(|| DebugOverlay::capture(&self.state, self.config.tick_period_ms))
    }

    pub fn begin(&mut self) -> Result<(), SessionError> {
        machine::begin_in_place(&mut self.state)
    }

    pub fn tick(&mut self) -> Result<TickReport, SessionError> {
        machine::tick_in_place(&mut self.state, &self.track, &self.config, &mut self.rng)
    }

    pub fn select_fault(&mut self, fault: FaultId) -> Result<(), SessionError> {
        machine::select_in_place(&mut self.state, fault)
    }

    /// Applies `action` to the currently selected fault.
    pub fn apply_action(&mut self, action: ActionId) -> Result<ActionOutcome, SessionError> {
        let input = ActionInput::new(self.state.selected(), action);
        machine::action_in_place(&mut self.state, input, &self.config)
    }

    pub fn apply_action_to(
        &mut self,
        fault: FaultId,
        action: ActionId,
    ) -> Result<ActionOutcome, SessionError> {
        machine::action_in_place(&mut self.state, ActionInput::new(Some(fault), action), &self.config)
    }

    pub fn completion(&self) -> Option<Completion> {
        Completion::from_state(&self.state)
    }

    /// Consumes a terminal session, yielding its completion signal.
    pub fn finish(self) -> Result<Completion, SessionError> {
        self.completion().ok_or(SessionError::NotTerminal {
            phase: self.state.phase(),
        })
    }

    /// Abandons the session from any phase. Aborts carry no score.
    pub fn abort(self) -> Exit {
        info!(
            target: "drill::session",
            phase = %self.state.phase(),
            tick = self.state.tick(),
            "session.aborted"
        );
        match self.completion() {
            Some(completion) => Exit::Completed(completion),
            None => Exit::Aborted,
        }
    }

    /// Replaces a terminal state with a brand-new BRIEFING state on the same
    /// track, config and random stream.
    pub fn reset(&mut self) -> Result<(), SessionError> {
        if !self.state.phase().is_terminal() {
            return Err(SessionError::NotTerminal {
                phase: self.state.phase(),
            });
        }
        self.state = SessionState::new(self.track.id(), &self.config);
        info!(
            target: "drill::session",
            track = %self.track.id(),
            "session.reset"
        );
        Ok(())
    }
}

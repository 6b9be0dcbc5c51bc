use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::{
    catalog::{FaultKind, TrackId},
    config::DrillConfig,
    fault::{ActiveFault, FaultId},
    log::{LogLevel, SessionLog},
};

pub const MAX_HEALTH: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    Briefing,
    Running,
    Failed,
    Succeeded,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Briefing => "BRIEFING",
            Phase::Running => "RUNNING",
            Phase::Failed => "FAILED",
            Phase::Succeeded => "SUCCEEDED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Phase::Failed | Phase::Succeeded)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Host-level misuse of the session commands. Player mistakes are never
/// reported through this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("session must be in BRIEFING to begin (currently {phase})")]
    NotInBriefing { phase: Phase },
    #[error("session is not running (currently {phase})")]
    NotRunning { phase: Phase },
    #[error("session has not reached a terminal phase (currently {phase})")]
    NotTerminal { phase: Phase },
}

/// The single versioned record a simulation run mutates.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    pub(crate) version: u64,
    pub(crate) phase: Phase,
    pub(crate) track: TrackId,
    pub(crate) health: f64,
    pub(crate) time_remaining: u32,
    pub(crate) tick: u64,
    pub(crate) faults: Vec<ActiveFault>,
    pub(crate) log: SessionLog,
    pub(crate) selected: Option<FaultId>,
    pub(crate) next_fault_id: u32,
}

impl SessionState {
    pub fn new(track: TrackId, config: &DrillConfig) -> Self {
        Self {
            version: 0,
            phase: Phase::Briefing,
            track,
            health: config.starting_health.clamp(0.0, MAX_HEALTH),
            time_remaining: config.tick_budget,
            tick: 0,
            faults: Vec::new(),
            log: SessionLog::booted(config.log_capacity),
            selected: None,
            next_fault_id: 1,
        }
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn track(&self) -> TrackId {
        self.track
    }

    pub fn health(&self) -> f64 {
        self.health
    }

    pub fn time_remaining(&self) -> u32 {
        self.time_remaining
    }

    /// Number of ticks run so far.
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Every fault spawned this session, resolved or not, in spawn order.
    pub fn faults(&self) -> &[ActiveFault] {
        &self.faults
    }

    pub fn unresolved(&self) -> impl Iterator<Item = &ActiveFault> {
        self.faults.iter().filter(|fault| fault.is_active())
    }

    pub fn unresolved_count(&self) -> usize {
        self.unresolved().count()
    }

    pub fn resolved_count(&self) -> usize {
        self.faults.iter().filter(|fault| fault.resolved).count()
    }

    pub fn has_unresolved(&self, kind: FaultKind) -> bool {
        self.unresolved().any(|fault| fault.kind == kind)
    }

    pub fn fault(&self, id: FaultId) -> Option<&ActiveFault> {
        self.faults.iter().find(|fault| fault.id == id)
    }

    pub fn selected(&self) -> Option<FaultId> {
        self.selected
    }

    pub fn log(&self) -> &SessionLog {
        &self.log
    }

    pub(crate) fn set_health(&mut self, health: f64) {
        self.health = if health.is_nan() {
            0.0
        } else {
            health.clamp(0.0, MAX_HEALTH)
        };
    }

    pub(crate) fn record(&mut self, level: LogLevel, message: impl Into<String>) {
        self.log.push(self.tick, level, message);
    }

    pub(crate) fn bump_version(&mut self) {
        self.version = self.version.wrapping_add(1);
    }

    pub(crate) fn allocate_fault_id(&mut self) -> FaultId {
        let id = FaultId(self.next_fault_id);
        self.next_fault_id = self.next_fault_id.wrapping_add(1);
        id
    }

    /// Checks the observable-boundary invariants against `concurrency_cap`.
    pub fn check_invariants(&self, concurrency_cap: usize) -> Result<(), InvariantViolation> {
        if !(0.0..=MAX_HEALTH).contains(&self.health) {
            return Err(InvariantViolation::HealthOutOfRange(self.health));
        }
        let active = self.unresolved_count();
        if active > concurrency_cap {
            return Err(InvariantViolation::CapacityExceeded {
                active,
                cap: concurrency_cap,
            });
        }
        let mut seen = Vec::with_capacity(active);
        for fault in self.unresolved() {
            if seen.contains(&fault.kind) {
                return Err(InvariantViolation::DuplicateKind(fault.kind));
            }
            seen.push(fault.kind);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum InvariantViolation {
    #[error("health {0} outside [0, 100]")]
    HealthOutOfRange(f64),
    #[error("{active} unresolved faults exceed cap {cap}")]
    CapacityExceeded { active: usize, cap: usize },
    #[error("more than one unresolved {0} fault")]
    DuplicateKind(FaultKind),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_session_starts_in_briefing_with_full_budget() {
        let config = DrillConfig::default();
        let state = SessionState::new(TrackId::Sovereign, &config);
        assert_eq!(state.phase(), Phase::Briefing);
        assert_eq!(state.health(), 100.0);
        assert_eq!(state.time_remaining(), 60);
        assert_eq!(state.version(), 0);
        assert_eq!(state.log().len(), 1);
        assert!(state.faults().is_empty());
        assert!(state.check_invariants(config.concurrency_cap).is_ok());
    }

    #[test]
    fn health_is_clamped_on_every_write() {
        let mut state = SessionState::new(TrackId::default(), &DrillConfig::default());
        state.set_health(140.0);
        assert_eq!(state.health(), 100.0);
        state.set_health(-3.5);
        assert_eq!(state.health(), 0.0);
        state.set_health(f64::NAN);
        assert_eq!(state.health(), 0.0);
    }

    #[test]
    fn fault_ids_are_never_reused() {
        let mut state = SessionState::new(TrackId::default(), &DrillConfig::default());
        let first = state.allocate_fault_id();
        let second = state.allocate_fault_id();
        assert_ne!(first, second);
        assert!(second > first);
    }

    #[test]
    fn only_failed_and_succeeded_are_terminal() {
        assert!(!Phase::Briefing.is_terminal());
        assert!(!Phase::Running.is_terminal());
        assert!(Phase::Failed.is_terminal());
        assert!(Phase::Succeeded.is_terminal());
    }
}

use serde::Serialize;

use crate::{
    catalog::TrackId,
    session::{Phase, SessionState},
};

/// Final accounting for a terminal session, handed to the host's
/// completion callback as `(success, final_health)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Completion {
    pub success: bool,
    pub final_health: f64,
    pub faults_resolved: usize,
    pub ticks_elapsed: u64,
}

impl Completion {
    /// `None` until the session reaches FAILED or SUCCEEDED.
    pub fn from_state(state: &SessionState) -> Option<Self> {
        let success = match state.phase() {
            Phase::Succeeded => true,
            Phase::Failed => false,
            Phase::Briefing | Phase::Running => return None,
        };
        Some(Self {
            success,
            final_health: if success { state.health() } else { 0.0 },
            faults_resolved: state.resolved_count(),
            ticks_elapsed: state.tick(),
        })
    }

    pub fn signal(&self) -> (bool, f64) {
        (self.success, self.final_health)
    }

    pub fn proof(&self, track: TrackId, session_id: impl Into<String>) -> SessionProof {
        SessionProof {
            track,
            session_id: session_id.into(),
            uptime: self.final_health,
            failures_resolved: self.faults_resolved,
            competence_verified: self.success,
        }
    }
}

/// Shareable record of a finished stress test.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionProof {
    pub track: TrackId,
    pub session_id: String,
    pub uptime: f64,
    pub failures_resolved: usize,
    pub competence_verified: bool,
}

/// How a session left the host's hands.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum Exit {
    /// Abandoned before a terminal phase; carries no score.
    Aborted,
    Completed(Completion),
}

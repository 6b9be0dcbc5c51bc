use serde::Serialize;

use crate::{
    catalog::TrackId,
    fault::{ActiveFault, FaultId},
    session::{Phase, SessionState},
};

/// Serializable read-only view of a session for presentation layers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub version: u64,
    pub phase: Phase,
    pub track: TrackId,
    pub health: f64,
    pub time_remaining: u32,
    pub tick: u64,
    pub selected: Option<FaultId>,
    pub active_faults: Vec<ActiveFault>,
    pub threats_neutralized: usize,
    pub log: Vec<String>,
}

impl SessionSnapshot {
    pub fn capture(state: &SessionState) -> Self {
        Self {
            version: state.version(),
            phase: state.phase(),
            track: state.track(),
            health: state.health(),
            time_remaining: state.time_remaining(),
            tick: state.tick(),
            selected: state.selected(),
            active_faults: state.unresolved().cloned().collect(),
            threats_neutralized: state.resolved_count(),
            log: state.log().lines(),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

impl From<&SessionState> for SessionSnapshot {
    fn from(state: &SessionState) -> Self {
        Self::capture(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DrillConfig;

    #[test]
    fn briefing_snapshot_serializes() {
        let state = SessionState::new(TrackId::Sovereign, &DrillConfig::default());
        let json = SessionSnapshot::capture(&state).to_json().expect("serializes");
        insta::assert_snapshot!(
            json,
            @r#"{"version":0,"phase":"BRIEFING","track":"SOVEREIGN","health":100.0,"time_remaining":60,"tick":0,"selected":null,"active_faults":[],"threats_neutralized":0,"log":["> T+000 [INFO] System initialized. Monitoring daemon active..."]}"#
        );
    }
}

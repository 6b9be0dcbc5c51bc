use serde::Serialize;

use crate::{
    catalog::FaultKind,
    decay::total_decay,
    fault::FaultId,
    resolution::{resolution, ActionId},
    session::SessionState,
};

/// Read-only diagnostic view of the engine's per-tick totals. Never feeds
/// back into resolution.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DebugOverlay {
    pub total_decay: f64,
    pub tick_period_ms: u64,
    pub entries: Vec<DebugEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DebugEntry {
    pub fault: FaultId,
    pub kind: FaultKind,
    pub recommended: Option<ActionId>,
}

impl DebugOverlay {
    pub fn capture(state: &SessionState, tick_period_ms: u64) -> Self {
        Self {
            total_decay: total_decay(state),
            tick_period_ms,
            entries: state
                .unresolved()
                .map(|fault| DebugEntry {
                    fault: fault.id,
                    kind: fault.kind,
                    recommended: resolution(fault.kind).recommended(),
                })
                .collect(),
        }
    }
}

use std::fmt;

use serde::Serialize;

use crate::catalog::{FaultKind, FaultTemplate, Severity};

/// Session-scoped fault identifier. Allocated monotonically, never reused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct FaultId(pub u32);

impl fmt::Display for FaultId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "evt-{:04}", self.0)
    }
}

impl std::str::FromStr for FaultId {
    type Err = std::num::ParseIntError;

    /// Accepts both the display form (`evt-0003`) and a bare number.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed
            .strip_prefix("evt-")
            .or_else(|| trimmed.strip_prefix('#'))
            .unwrap_or(trimmed);
        digits.parse().map(FaultId)
    }
}

/// Runtime incident instance owned by a session. Only ever marked resolved,
/// never removed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActiveFault {
    pub id: FaultId,
    pub kind: FaultKind,
    pub title: &'static str,
    pub symptom: &'static str,
    pub root_cause: &'static str,
    pub severity: Severity,
    pub decay_rate: f64,
    pub resolved: bool,
    /// Tick index at which the fault was detected.
    pub spawned_at: u64,
}

impl ActiveFault {
    pub fn from_template(id: FaultId, template: &FaultTemplate, spawned_at: u64) -> Self {
        Self {
            id,
            kind: template.kind,
            title: template.title,
            symptom: template.symptom,
            root_cause: template.root_cause,
            severity: template.severity,
            decay_rate: template.decay_rate,
            resolved: false,
            spawned_at,
        }
    }

    pub fn is_active(&self) -> bool {
        !self.resolved
    }
}

use serde::Serialize;
use tracing::{info, warn};

use crate::{
    catalog::FaultKind,
    config::DrillConfig,
    fault::FaultId,
    log::LogLevel,
    resolution::{resolution, ActionId, Verdict},
    session::SessionState,
};

pub const NO_TARGET_MESSAGE: &str = "Select a threat from the left panel to target.";

/// A player command: apply `action` to `fault`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionInput {
    pub fault: Option<FaultId>,
    pub action: ActionId,
}

impl ActionInput {
    pub fn new(fault: Option<FaultId>, action: ActionId) -> Self {
        Self { fault, action }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum ActionOutcome {
    /// No fault was targeted.
    NoTarget,
    /// The target does not exist or was already resolved.
    StaleTarget { fault: FaultId },
    Resolved { fault: FaultId, health_delta: f64 },
    Worsened { fault: FaultId, health_delta: f64 },
    Ineffective { fault: FaultId, health_delta: f64 },
}

impl ActionOutcome {
    pub fn changed_health(&self) -> bool {
        match self {
            ActionOutcome::NoTarget | ActionOutcome::StaleTarget { .. } => false,
            ActionOutcome::Resolved { health_delta, .. }
            | ActionOutcome::Worsened { health_delta, .. }
            | ActionOutcome::Ineffective { health_delta, .. } => *health_delta != 0.0,
        }
    }
}

/// Signed health change for applying `action` to a fault of `kind`, before
/// clamping to the health range.
pub fn health_delta(kind: FaultKind, action: ActionId, config: &DrillConfig) -> f64 {
    match resolution(kind).classify(action) {
        Verdict::Resolves => config.resolve_bonus,
        Verdict::Fatal => -config.fatal_penalty,
        Verdict::Ineffective => -config.ineffective_penalty,
    }
}

/// Applies one player action in place. User mistakes degrade to a logged
/// no-op; they never surface as errors.
pub fn resolve_action(
    state: &mut SessionState,
    input: ActionInput,
    config: &DrillConfig,
) -> ActionOutcome {
    let Some(target) = input.fault else {
        state.record(LogLevel::Error, NO_TARGET_MESSAGE);
        warn!(target: "drill::resolver", action = %input.action, "action.rejected=no_target");
        return ActionOutcome::NoTarget;
    };

    let Some(index) = state
        .faults
        .iter()
        .position(|fault| fault.id == target && fault.is_active())
    else {
        state.record(
            LogLevel::Error,
            format!("Target {target} is not an active threat."),
        );
        warn!(
            target: "drill::resolver",
            fault = %target,
            action = %input.action,
            "action.rejected=stale_target"
        );
        return ActionOutcome::StaleTarget { fault: target };
    };

    let (kind, title) = {
        let fault = &state.faults[index];
        (fault.kind, fault.title)
    };
    let action = input.action;
    let delta = health_delta(kind, action, config);
    let before = state.health();

    let outcome = match resolution(kind).classify(action) {
        Verdict::Resolves => {
            state.faults[index].resolved = true;
            state.set_health(before + delta);
            state.record(
                LogLevel::Success,
                format!("MITIGATED: {title} resolved via {action}."),
            );
            if state.selected == Some(target) {
                state.selected = None;
            }
            ActionOutcome::Resolved {
                fault: target,
                health_delta: state.health() - before,
            }
        }
        Verdict::Fatal => {
            state.set_health(before + delta);
            state.record(
                LogLevel::Error,
                format!("CRITICAL ERROR: {action} exacerbated {title}."),
            );
            ActionOutcome::Worsened {
                fault: target,
                health_delta: state.health() - before,
            }
        }
        Verdict::Ineffective => {
            state.set_health(before + delta);
            state.record(
                LogLevel::Info,
                format!("INEFFECTIVE: {action} has no effect on {title}."),
            );
            ActionOutcome::Ineffective {
                fault: target,
                health_delta: state.health() - before,
            }
        }
    };

    info!(
        target: "drill::resolver",
        fault = %target,
        kind = %kind,
        action = %action,
        outcome = ?outcome,
        health = state.health(),
        "action.resolved"
    );
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        catalog::{templates_for_track, TrackId},
        spawner::materialize,
    };

    fn breach_session(health: f64) -> (SessionState, FaultId) {
        let config = DrillConfig {
            starting_health: health,
            ..DrillConfig::default()
        };
        let mut state = SessionState::new(TrackId::LightningOperator, &config);
        let breach = &templates_for_track(TrackId::LightningOperator)[0];
        let id = materialize(&mut state, breach, config.concurrency_cap).expect("spawned");
        (state, id)
    }

    #[test]
    fn valid_action_resolves_and_caps_health() {
        let (mut state, id) = breach_session(94.0);
        state.selected = Some(id);
        let outcome = resolve_action(
            &mut state,
            ActionInput::new(Some(id), ActionId::JusticeTx),
            &DrillConfig::default(),
        );
        assert_eq!(
            outcome,
            ActionOutcome::Resolved {
                fault: id,
                health_delta: 6.0
            }
        );
        assert_eq!(state.health(), 100.0);
        assert!(state.fault(id).map(|f| f.resolved).unwrap_or(false));
        assert_eq!(state.selected(), None);
    }

    #[test]
    fn fatal_action_leaves_fault_active() {
        let (mut state, id) = breach_session(94.0);
        state.selected = Some(id);
        let outcome = resolve_action(
            &mut state,
            ActionInput::new(Some(id), ActionId::Wait),
            &DrillConfig::default(),
        );
        assert!(matches!(outcome, ActionOutcome::Worsened { .. }));
        assert_eq!(state.health(), 74.0);
        assert!(state.fault(id).map(|f| f.is_active()).unwrap_or(false));
        assert_eq!(state.selected(), Some(id));
        assert!(state
            .log()
            .latest()
            .map(|e| e.message == "CRITICAL ERROR: WAIT exacerbated HTLC Breach Attempt.")
            .unwrap_or(false));
    }

    #[test]
    fn unclassified_action_costs_a_little() {
        let (mut state, id) = breach_session(3.0);
        let outcome = resolve_action(
            &mut state,
            ActionInput::new(Some(id), ActionId::MixCoins),
            &DrillConfig::default(),
        );
        assert!(matches!(outcome, ActionOutcome::Ineffective { .. }));
        assert_eq!(state.health(), 0.0);
        assert_eq!(state.log().latest().map(|e| e.level), Some(LogLevel::Info));
    }

    #[test]
    fn missing_target_only_logs() {
        let (mut state, _) = breach_session(50.0);
        let outcome = resolve_action(
            &mut state,
            ActionInput::new(None, ActionId::JusticeTx),
            &DrillConfig::default(),
        );
        assert_eq!(outcome, ActionOutcome::NoTarget);
        assert_eq!(state.health(), 50.0);
        assert_eq!(
            state.log().latest().map(|e| e.message.as_str()),
            Some(NO_TARGET_MESSAGE)
        );
    }

    #[test]
    fn resolved_target_is_a_no_op() {
        let (mut state, id) = breach_session(80.0);
        let config = DrillConfig::default();
        resolve_action(&mut state, ActionInput::new(Some(id), ActionId::JusticeTx), &config);
        let health = state.health();
        let faults = state.faults().to_vec();

        let outcome =
            resolve_action(&mut state, ActionInput::new(Some(id), ActionId::Wait), &config);
        assert_eq!(outcome, ActionOutcome::StaleTarget { fault: id });
        assert!(!outcome.changed_health());
        assert_eq!(state.health(), health);
        assert_eq!(state.faults(), faults.as_slice());
    }

    #[test]
    fn delta_is_a_function_of_kind_and_action() {
        let config = DrillConfig::default();
        for kind in FaultKind::ALL {
            for action in ActionId::ALL {
                let first = health_delta(kind, action, &config);
                let second = health_delta(kind, action, &config);
                assert_eq!(first, second);
                assert!([10.0, -20.0, -5.0].contains(&first));
            }
        }
    }
}

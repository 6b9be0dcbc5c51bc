use rand::Rng;
use serde::Serialize;
use tracing::info;

use crate::{
    catalog::Track,
    config::DrillConfig,
    decay,
    fault::FaultId,
    log::LogLevel,
    resolver::{self, ActionInput, ActionOutcome},
    session::{Phase, SessionError, SessionState},
    spawner,
};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TickReport {
    pub tick: u64,
    pub spawned: Option<FaultId>,
    pub decay: f64,
    pub transition: Option<Phase>,
}

pub fn begin(state: &SessionState) -> Result<SessionState, SessionError> {
    let mut next = state.clone();
    begin_in_place(&mut next)?;
    Ok(next)
}

pub fn step_tick<R: Rng + ?Sized>(
    state: &SessionState,
    track: &Track,
    config: &DrillConfig,
    rng: &mut R,
) -> Result<SessionState, SessionError> {
    let mut next = state.clone();
    tick_in_place(&mut next, track, config, rng)?;
    Ok(next)
}

pub fn step_select(state: &SessionState, fault: FaultId) -> Result<SessionState, SessionError> {
    let mut next = state.clone();
    select_in_place(&mut next, fault)?;
    Ok(next)
}

pub fn step_action(
    state: &SessionState,
    input: ActionInput,
    config: &DrillConfig,
) -> Result<SessionState, SessionError> {
    let mut next = state.clone();
    action_in_place(&mut next, input, config)?;
    Ok(next)
}

pub(crate) fn begin_in_place(state: &mut SessionState) -> Result<(), SessionError> {
    if state.phase != Phase::Briefing {
        return Err(SessionError::NotInBriefing { phase: state.phase });
    }
    state.phase = Phase::Running;
    state.record(
        LogLevel::Info,
        format!("Stress test engaged on track {}.", state.track),
    );
    state.bump_version();
    info!(
        target: "drill::session",
        track = %state.track,
        budget = state.time_remaining,
        "session.phase=running"
    );
    Ok(())
}

pub(crate) fn tick_in_place<R: Rng + ?Sized>(
    state: &mut SessionState,
    track: &Track,
    config: &DrillConfig,
    rng: &mut R,
) -> Result<TickReport, SessionError> {
    ensure_running(state)?;
    advance_clock(state);
    let spawned = spawner::spawn_threat(state, track.templates(), config, rng);
    let decay = decay::apply_decay(state);
    let transition = evaluate_termination(state);
    Ok(TickReport {
        tick: state.tick,
        spawned,
        decay,
        transition,
    })
}

pub(crate) fn advance_clock(state: &mut SessionState) {
    state.time_remaining = state.time_remaining.saturating_sub(1);
    state.tick += 1;
    state.bump_version();
}

/// Applies at most one terminal transition. Health exhaustion wins when both
/// conditions hold in the same tick.
pub(crate) fn evaluate_termination(state: &mut SessionState) -> Option<Phase> {
    if state.phase != Phase::Running {
        return None;
    }
    let next = if state.health <= 0.0 {
        let unresolved = state.unresolved_count();
        state.record(
            LogLevel::Error,
            format!("SYSTEM OFFLINE: uptime reached 0% with {unresolved} unresolved threat(s)."),
        );
        Phase::Failed
    } else if state.time_remaining == 0 {
        state.record(
            LogLevel::Success,
            format!(
                "Survival confirmed: system stabilized at {:.0}% uptime.",
                state.health
            ),
        );
        Phase::Succeeded
    } else {
        return None;
    };

    state.phase = next;
    info!(
        target: "drill::session",
        phase = %next,
        tick = state.tick,
        health = state.health,
        resolved = state.resolved_count(),
        "session.phase=terminal"
    );
    Some(next)
}

pub(crate) fn select_in_place(state: &mut SessionState, fault: FaultId) -> Result<(), SessionError> {
    ensure_running(state)?;
    if state.fault(fault).map(|f| f.is_active()).unwrap_or(false) {
        state.selected = Some(fault);
    } else {
        state.record(
            LogLevel::Error,
            format!("Target {fault} is not an active threat."),
        );
    }
    state.bump_version();
    Ok(())
}

pub(crate) fn action_in_place(
    state: &mut SessionState,
    input: ActionInput,
    config: &DrillConfig,
) -> Result<ActionOutcome, SessionError> {
    ensure_running(state)?;
    let outcome = resolver::resolve_action(state, input, config);
    state.bump_version();
    Ok(outcome)
}

fn ensure_running(state: &SessionState) -> Result<(), SessionError> {
    if state.phase == Phase::Running {
        Ok(())
    } else {
        Err(SessionError::NotRunning { phase: state.phase })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        catalog::{templates_for_track, TrackId},
        resolution::ActionId,
        spawner::materialize,
    };
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn quiet_config() -> DrillConfig {
        DrillConfig {
            spawn_chance_high: 0.0,
            spawn_chance_low: 0.0,
            ..DrillConfig::default()
        }
    }

    #[test]
    fn begin_only_from_briefing() {
        let config = DrillConfig::default();
        let state = SessionState::new(TrackId::default(), &config);
        let running = begin(&state).expect("begin from briefing");
        assert_eq!(running.phase(), Phase::Running);
        assert_eq!(running.version(), state.version() + 1);
        assert_eq!(
            begin(&running),
            Err(SessionError::NotInBriefing {
                phase: Phase::Running
            })
        );
    }

    #[test]
    fn step_functions_leave_input_untouched() {
        let config = quiet_config();
        let track = Track::default();
        let state = begin(&SessionState::new(TrackId::default(), &config)).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let next = step_tick(&state, &track, &config, &mut rng).unwrap();
        assert_eq!(state.time_remaining(), 60);
        assert_eq!(next.time_remaining(), 59);
        assert_eq!(next.tick(), 1);
        assert!(next.version() > state.version());
    }

    #[test]
    fn ticks_rejected_outside_running() {
        let config = quiet_config();
        let state = SessionState::new(TrackId::default(), &config);
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        assert_eq!(
            step_tick(&state, &Track::default(), &config, &mut rng),
            Err(SessionError::NotRunning {
                phase: Phase::Briefing
            })
        );
        assert!(step_action(&state, ActionInput::new(None, ActionId::Wait), &config).is_err());
    }

    #[test]
    fn health_exhaustion_wins_tie_with_clock() {
        let config = DrillConfig {
            starting_health: 2.0,
            tick_budget: 1,
            ..quiet_config()
        };
        let track = Track::default();
        let mut state = begin(&SessionState::new(TrackId::default(), &config)).unwrap();
        materialize(&mut state, &templates_for_track(TrackId::default())[0], 4);
        let mut rng = ChaCha8Rng::seed_from_u64(9);

        let report = tick_in_place(&mut state, &track, &config, &mut rng).unwrap();
        assert_eq!(state.time_remaining(), 0);
        assert_eq!(state.health(), 0.0);
        assert_eq!(report.transition, Some(Phase::Failed));
        assert_eq!(state.phase(), Phase::Failed);
    }

    #[test]
    fn clock_expiry_succeeds_with_health_left() {
        let config = DrillConfig {
            tick_budget: 3,
            ..quiet_config()
        };
        let track = Track::default();
        let mut state = begin(&SessionState::new(TrackId::default(), &config)).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        for _ in 0..2 {
            let report = tick_in_place(&mut state, &track, &config, &mut rng).unwrap();
            assert_eq!(report.transition, None);
        }
        let report = tick_in_place(&mut state, &track, &config, &mut rng).unwrap();
        assert_eq!(report.transition, Some(Phase::Succeeded));
        assert!(tick_in_place(&mut state, &track, &config, &mut rng).is_err());
    }

    #[test]
    fn selecting_unknown_fault_logs_and_keeps_selection() {
        let config = quiet_config();
        let mut state = begin(&SessionState::new(TrackId::default(), &config)).unwrap();
        let id = materialize(&mut state, &templates_for_track(TrackId::default())[1], 4).unwrap();
        select_in_place(&mut state, id).unwrap();
        assert_eq!(state.selected(), Some(id));

        select_in_place(&mut state, FaultId(99)).unwrap();
        assert_eq!(state.selected(), Some(id));
        assert_eq!(
            state.log().latest().map(|e| e.message.as_str()),
            Some("Target evt-0099 is not an active threat.")
        );
    }
}

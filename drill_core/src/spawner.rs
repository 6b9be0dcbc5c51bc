use rand::{seq::SliceRandom, Rng};
use tracing::{debug, info};

use crate::{
    catalog::FaultTemplate,
    config::DrillConfig,
    fault::{ActiveFault, FaultId},
    log::LogLevel,
    session::SessionState,
};

/// Runs the spawner once. Returns the new fault's id when one was created.
pub fn spawn_threat<R: Rng + ?Sized>(
    state: &mut SessionState,
    templates: &[FaultTemplate],
    config: &DrillConfig,
    rng: &mut R,
) -> Option<FaultId> {
    let active = state.unresolved_count();
    if active >= config.concurrency_cap {
        debug!(
            target: "drill::spawner",
            tick = state.tick(),
            active,
            "fault.spawn.skipped=capacity"
        );
        return None;
    }

    let chance = config.spawn_chance(state.health());
    if !(chance > 0.0) || !rng.gen_bool(chance.min(1.0)) {
        return None;
    }

    let template = templates.choose(rng)?;
    if state.has_unresolved(template.kind) {
        debug!(
            target: "drill::spawner",
            tick = state.tick(),
            kind = %template.kind,
            "fault.spawn.discarded=duplicate"
        );
        return None;
    }

    materialize(state, template, config.concurrency_cap)
}

/// Instantiates `template` as an active fault, honouring the capacity cap and
/// the one-unresolved-fault-per-kind rule.
pub fn materialize(
    state: &mut SessionState,
    template: &FaultTemplate,
    concurrency_cap: usize,
) -> Option<FaultId> {
    if state.unresolved_count() >= concurrency_cap || state.has_unresolved(template.kind) {
        return None;
    }

    let id = state.allocate_fault_id();
    let fault = ActiveFault::from_template(id, template, state.tick());
    state.record(
        LogLevel::Error,
        format!("{} DETECTED: {}", fault.title, fault.symptom),
    );
    info!(
        target: "drill::spawner",
        tick = state.tick(),
        fault = %id,
        kind = %fault.kind,
        severity = %fault.severity,
        "fault.spawned"
    );
    state.faults.push(fault);
    Some(id)
}

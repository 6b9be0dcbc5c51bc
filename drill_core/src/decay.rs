use tracing::trace;

use crate::session::SessionState;

/// Aggregate per-tick health cost of every unresolved fault.
pub fn total_decay(state: &SessionState) -> f64 {
    state.unresolved().map(|fault| fault.decay_rate).sum()
}

/// Drains health by the current aggregate decay. Ambient decay is not logged
/// to the session log.
pub fn apply_decay(state: &mut SessionState) -> f64 {
    let decay = total_decay(state);
    if decay > 0.0 {
        state.set_health(state.health() - decay);
    }
    trace!(
        target: "drill::decay",
        tick = state.tick(),
        decay,
        health = state.health(),
        "health.decayed"
    );
    decay
}

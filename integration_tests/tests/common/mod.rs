#![allow(dead_code)]

use std::sync::Arc;

use drill_core::{
    templates_for_track, DrillConfig, DrillSession, FaultKind, Phase, Track, TrackId,
};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Builtin defaults with spawning pinned to always (`1.0`) or never (`0.0`).
pub fn config_with(spawn: f64, starting_health: f64, tick_budget: u32) -> Arc<DrillConfig> {
    Arc::new(DrillConfig {
        starting_health,
        tick_budget,
        spawn_chance_high: spawn,
        spawn_chance_low: spawn,
        ..DrillConfig::builtin().as_ref().clone()
    })
}

/// Track whose catalog holds only the HTLC breach (decay 2.0/tick).
pub fn breach_only_track() -> Track {
    let templates = templates_for_track(TrackId::LightningOperator);
    let index = templates
        .iter()
        .position(|template| template.kind == FaultKind::ChannelBreach)
        .expect("lightning catalog carries a channel breach");
    Track::with_templates(TrackId::LightningOperator, &templates[index..=index])
}

/// Running session that spawns a single CHANNEL_BREACH on its first tick and
/// never spawns anything else.
pub fn breach_session(starting_health: f64, tick_budget: u32) -> DrillSession {
    let mut session = DrillSession::new(
        breach_only_track(),
        config_with(1.0, starting_health, tick_budget),
        ChaCha8Rng::seed_from_u64(0xB4EAC4),
    );
    session.begin().expect("fresh session begins");
    session
}

pub fn run_to_terminal(session: &mut DrillSession) -> Phase {
    while session.phase() == Phase::Running {
        session.tick().expect("running session ticks");
    }
    session.phase()
}

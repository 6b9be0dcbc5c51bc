use std::sync::Arc;

use bevy_ecs::prelude::*;
use rand_chacha::ChaCha8Rng;

use crate::{
    catalog::Track,
    config::{DrillConfig, DrillConfigHandle},
    decay,
    machine::{self, TickReport},
    session::{Phase, SessionError, SessionState},
    spawner,
};

#[derive(Resource, Debug, Clone)]
pub struct SessionSlot(pub SessionState);

#[derive(Resource, Debug, Clone)]
pub struct SessionRng(pub ChaCha8Rng);

#[derive(Resource, Debug, Clone, Copy)]
pub struct ActiveTrack(pub Track);

/// Report assembled by the stages of the tick currently executing.
#[derive(Resource, Debug, Default)]
pub struct LastTick(pub Option<TickReport>);

/// Insert the session and its collaborators into a fresh world.
pub fn build_tick_world(
    state: SessionState,
    track: Track,
    config: Arc<DrillConfig>,
    rng: ChaCha8Rng,
) -> World {
    let mut world = World::new();
    world.insert_resource(SessionSlot(state));
    world.insert_resource(ActiveTrack(track));
    world.insert_resource(DrillConfigHandle::new(config));
    world.insert_resource(SessionRng(rng));
    world.insert_resource(LastTick::default());
    world
}

/// Clock, spawner, decay, termination; in that order.
pub fn build_tick_schedule() -> Schedule {
    let mut schedule = Schedule::default();
    schedule.add_systems(
        (
            advance_clock,
            spawn_threats,
            accumulate_decay,
            evaluate_termination,
        )
            .chain()
            // Evaluated once per run: a tick executes every stage or none.
            .run_if(session_running),
    );
    schedule
}

/// Execute one tick. Rejected outside RUNNING without touching the world.
pub fn run_tick(world: &mut World, schedule: &mut Schedule) -> Result<TickReport, SessionError> {
    let phase = world.resource::<SessionSlot>().0.phase();
    if phase != Phase::Running {
        return Err(SessionError::NotRunning { phase });
    }
    world.resource_mut::<LastTick>().0 = None;
    schedule.run(world);
    world
        .resource_mut::<LastTick>()
        .0
        .take()
        .ok_or(SessionError::NotRunning { phase })
}

pub fn session_state(world: &World) -> &SessionState {
    &world.resource::<SessionSlot>().0
}

fn session_running(slot: Res<SessionSlot>) -> bool {
    slot.0.phase() == Phase::Running
}

fn advance_clock(mut slot: ResMut<SessionSlot>, mut last: ResMut<LastTick>) {
    machine::advance_clock(&mut slot.0);
    last.0 = Some(TickReport {
        tick: slot.0.tick(),
        spawned: None,
        decay: 0.0,
        transition: None,
    });
}

fn spawn_threats(
    mut slot: ResMut<SessionSlot>,
    mut rng: ResMut<SessionRng>,
    track: Res<ActiveTrack>,
    config: Res<DrillConfigHandle>,
    mut last: ResMut<LastTick>,
) {
    let spawned = spawner::spawn_threat(&mut slot.0, track.0.templates(), config.config(), &mut rng.0);
    if let Some(report) = last.0.as_mut() {
        report.spawned = spawned;
    }
}

fn accumulate_decay(mut slot: ResMut<SessionSlot>, mut last: ResMut<LastTick>) {
    let decay = decay::apply_decay(&mut slot.0);
    if let Some(report) = last.0.as_mut() {
        report.decay = decay;
    }
}

fn evaluate_termination(mut slot: ResMut<SessionSlot>, mut last: ResMut<LastTick>) {
    let transition = machine::evaluate_termination(&mut slot.0);
    if let Some(report) = last.0.as_mut() {
        report.transition = transition;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{catalog::TrackId, machine::begin};
    use rand::SeedableRng;

    fn running(config: &DrillConfig, track: TrackId) -> SessionState {
        begin(&SessionState::new(track, config)).expect("begin")
    }

    #[test]
    fn schedule_matches_step_tick_for_same_seed() {
        let config = Arc::new(DrillConfig::default());
        let track = Track::new(TrackId::Sovereign);
        let start = running(&config, TrackId::Sovereign);

        let mut world = build_tick_world(
            start.clone(),
            track,
            Arc::clone(&config),
            ChaCha8Rng::seed_from_u64(77),
        );
        let mut schedule = build_tick_schedule();

        let mut expected = start;
        let mut rng = ChaCha8Rng::seed_from_u64(77);
        while expected.phase() == Phase::Running {
            expected = machine::step_tick(&expected, &track, &config, &mut rng).unwrap();
            run_tick(&mut world, &mut schedule).unwrap();
            assert_eq!(session_state(&world), &expected);
        }
        assert!(run_tick(&mut world, &mut schedule).is_err());
    }

    #[test]
    fn gate_blocks_ticks_outside_running() {
        let config = Arc::new(DrillConfig::default());
        let briefing = SessionState::new(TrackId::default(), &config);
        let mut world = build_tick_world(
            briefing.clone(),
            Track::default(),
            config,
            ChaCha8Rng::seed_from_u64(1),
        );
        let mut schedule = build_tick_schedule();

        assert_eq!(
            run_tick(&mut world, &mut schedule),
            Err(SessionError::NotRunning {
                phase: Phase::Briefing
            })
        );
        schedule.run(&mut world);
        assert_eq!(session_state(&world), &briefing);
    }

    #[test]
    fn report_carries_every_stage() {
        let config = Arc::new(DrillConfig {
            spawn_chance_high: 1.0,
            spawn_chance_low: 1.0,
            ..DrillConfig::default()
        });
        let mut world = build_tick_world(
            running(&config, TrackId::default()),
            Track::default(),
            config,
            ChaCha8Rng::seed_from_u64(3),
        );
        let mut schedule = build_tick_schedule();
        let report = run_tick(&mut world, &mut schedule).unwrap();
        assert_eq!(report.tick, 1);
        assert!(report.spawned.is_some());
        assert!(report.decay > 0.0);
        assert_eq!(report.transition, None);
    }
}

use std::sync::Arc;

use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use drill_core::{
    build_tick_schedule, build_tick_world, run_tick, DrillConfig, DrillSession, Phase, Track,
    TrackId,
};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

fn config(budget: u32) -> Arc<DrillConfig> {
    Arc::new(DrillConfig {
        tick_budget: budget,
        ..DrillConfig::builtin().as_ref().clone()
    })
}

fn run_session(session: &mut DrillSession) {
    session.begin().expect("begin");
    while session.phase() == Phase::Running {
        session.tick().expect("tick");
    }
}

fn bench_session(c: &mut Criterion) {
    let mut group = c.benchmark_group("drill_session");

    for budget in [60u32, 600] {
        for track in [TrackId::LightningOperator, TrackId::WalletMastery] {
            group.bench_with_input(
                BenchmarkId::new(format!("host/{}", track.as_str()), budget),
                &budget,
                |b, &budget| {
                    b.iter_batched(
                        || DrillSession::seeded(track, config(budget), 0xD511),
                        |mut session| run_session(&mut session),
                        BatchSize::SmallInput,
                    );
                },
            );
        }

        group.bench_with_input(
            BenchmarkId::new("schedule", budget),
            &budget,
            |b, &budget| {
                b.iter_batched(
                    || {
                        let config = config(budget);
                        let state = drill_core::begin(&drill_core::SessionState::new(
                            TrackId::LightningOperator,
                            &config,
                        ))
                        .expect("begin");
                        let world = build_tick_world(
                            state,
                            Track::new(TrackId::LightningOperator),
                            config,
                            ChaCha8Rng::seed_from_u64(0xD511),
                        );
                        (world, build_tick_schedule())
                    },
                    |(mut world, mut schedule)| {
                        while run_tick(&mut world, &mut schedule).is_ok() {}
                    },
                    BatchSize::SmallInput,
                );
            },
        );
    }

    group.finish();
}

criterion_group!(tick_benches, bench_session);
criterion_main!(tick_benches);

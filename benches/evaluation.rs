//! Benchmarks for timetable decoding, energy simulation and breeding.

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

use regen_timetable::{
    compute::{EnergySimulator, Timetable, evolution::Solver},
    schema::{ReuseRule, ScheduleParams, SolverConfig, TimetableConfig},
};

fn bench_decode(c: &mut Criterion) {
    let params = ScheduleParams::default();
    let config = TimetableConfig::from_params(&params);

    c.bench_function("decode_default", |b| {
        b.iter(|| Timetable::decode(black_box(&config), black_box(&params)));
    });
}

fn bench_reuse_ratio(c: &mut Criterion) {
    let mut group = c.benchmark_group("reuse_ratio");
    let params = ScheduleParams::default();
    let config = TimetableConfig::from_params(&params);
    let timetable = Timetable::decode(&config, &params);

    for rule in [ReuseRule::Absorbed, ReuseRule::Surplus] {
        let mut simulator = EnergySimulator::new(&params, rule);
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{:?}", rule)),
            &rule,
            |b, _| {
                b.iter(|| simulator.reuse_ratio(black_box(&timetable)));
            },
        );
    }

    group.finish();
}

fn bench_generation(c: &mut Criterion) {
    let mut group = c.benchmark_group("generation");
    group.sample_size(10);

    for threads in [1, 4] {
        let config = SolverConfig {
            population_size: 32,
            threads: Some(threads),
            random_seed: Some(42),
            ..Default::default()
        };
        let mut solver = match Solver::new(ScheduleParams::default(), config) {
            Ok(solver) => solver,
            Err(e) => panic!("invalid bench configuration: {e}"),
        };
        solver.initialize();

        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}_threads", threads)),
            &threads,
            |b, _| {
                b.iter(|| solver.step_generation());
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_decode, bench_reuse_ratio, bench_generation);
criterion_main!(benches);

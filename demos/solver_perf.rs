//! Quick solver performance test

use regen_timetable::{
    Solver,
    schema::{ScheduleParams, SolverConfig},
};
use std::time::Instant;

fn main() {
    println!("=== Solver Performance Test ===\n");

    // Test different worker counts
    for threads in [1, 2, 4, 8] {
        println!("Workers: {}", threads);

        let config = SolverConfig {
            generations: 10,
            population_size: 40,
            threads: Some(threads),
            random_seed: Some(42),
            ..Default::default()
        };

        let start = Instant::now();
        let mut solver = match Solver::new(ScheduleParams::default(), config) {
            Ok(solver) => solver,
            Err(e) => {
                eprintln!("Invalid configuration: {}", e);
                return;
            }
        };
        let result = solver.run();
        let elapsed = start.elapsed();

        let total_evals = result.stats.total_evaluations;
        let evals_per_sec = total_evals as f64 / elapsed.as_secs_f64();

        println!("  Generations:    {}", result.stats.generations);
        println!("  Evaluations:    {}", total_evals);
        println!("  Elapsed:        {:.2}s", elapsed.as_secs_f64());
        println!("  Evals/sec:      {:.1}", evals_per_sec);
        println!("  Best fitness:   {:.6}", result.stats.best_fitness);
        println!();
    }
}

//! Evolutionary search over timetable configurations.
//!
//! # Overview
//!
//! - **Genome Operations** (`genome`): initial perturbation, crossover and mutation
//! - **Selection** (`selection`): rank-weighted parent draws
//! - **Fitness** (`fitness`): decode and score a configuration
//! - **Search** (`search`): the generational solver with parallel breeding
//! - **Random Walk** (`random_walk`): mutation-only baseline
//! - **Reports** (`report`): JSON and CSV exports
//!
//! # Example
//!
//! ```rust,no_run
//! use regen_timetable::schema::{ScheduleParams, SolverConfig};
//! use regen_timetable::compute::evolution::Solver;
//!
//! let mut solver = Solver::new(ScheduleParams::default(), SolverConfig::default()).unwrap();
//! let result = solver.run_with_callback(|progress| {
//!     println!("Generation {}: best fitness = {:.4}",
//!         progress.generation, progress.best_fitness);
//! });
//!
//! if let (Some(before), Some(after)) = (&result.before, &result.after) {
//!     println!("Reuse ratio {:.4} -> {:.4}", before.fitness, after.fitness);
//! }
//! ```
//!
//! # Breeding
//!
//! Each generation the ranked population is split into near-equal shards,
//! one per worker. A worker draws two parents from a geometric weight ladder,
//! recombines them with probability `crossover_rate` (otherwise the fitter
//! parent stands in), mutates the child with probability `mutation_rate` and
//! scores it with its own evaluator. Shards are concatenated and re-ranked.

mod fitness;
mod genome;
mod random_walk;
mod report;
mod search;
mod selection;

pub use fitness::{FitnessEvaluator, Individual};
pub use genome::{Mutation, TimetableRng};
pub use random_walk::RandomWalk;
pub use report::ReportWriter;
pub use search::{ProgressCallback, Solver};
pub use selection::WeightLadder;

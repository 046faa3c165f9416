//! Genetic search over timetable configurations.

use std::sync::Arc;
use std::time::Instant;

use rayon::prelude::*;

use crate::schema::{
    Direction, EvolutionHistory, GenerationStats, IndividualSnapshot, ScheduleParams, SolverConfig,
    SolverConfigError, SolverPhase, SolverProgress, SolverResult, SolverStats, TimetableConfig,
};

use super::fitness::{FitnessEvaluator, Individual};
use super::genome::TimetableRng;
use super::selection::WeightLadder;

/// Progress callback type.
pub type ProgressCallback = Box<dyn Fn(&SolverProgress) + Send + Sync>;

/// One breeding thread: a private random source and a private evaluator.
struct BreedWorker {
    rng: TimetableRng,
    evaluator: FitnessEvaluator,
}

impl BreedWorker {
    /// Produce `count` children from the ranked `population`.
    fn breed(
        &mut self,
        population: &[Individual],
        ladder: &WeightLadder,
        count: usize,
        config: &SolverConfig,
    ) -> Vec<Individual> {
        (0..count)
            .map(|_| {
                let father = &population[ladder.select(&mut self.rng)];
                let mother = &population[ladder.select(&mut self.rng)];

                let crossed = self.rng.chance(config.crossover_rate);
                let mutated = self.rng.chance(config.mutation_rate);
                let fitter = if father.fitness() >= mother.fitness() {
                    father
                } else {
                    mother
                };

                if !crossed && !mutated {
                    return fitter.clone();
                }

                let mut child = if crossed {
                    self.rng.crossover(father.config(), mother.config())
                } else {
                    fitter.config().clone()
                };
                if mutated {
                    self.rng.mutate(&mut child, self.evaluator.params());
                }
                Individual::new(child, &mut self.evaluator)
            })
            .collect()
    }
}

/// Children per worker: `n / t` each, the last worker taking the remainder.
fn shard_sizes(n: usize, t: usize) -> Vec<usize> {
    let t = t.max(1);
    let mut sizes = vec![n / t; t];
    if let Some(last) = sizes.last_mut() {
        *last += n % t;
    }
    sizes
}

/// Genetic search engine.
pub struct Solver {
    params: Arc<ScheduleParams>,
    config: SolverConfig,
    rng: TimetableRng,
    evaluator: FitnessEvaluator,
    workers: Vec<BreedWorker>,
    ladder: WeightLadder,
    population: Vec<Individual>,
    initial_best: Option<Individual>,
    history: EvolutionHistory,
    generation: usize,
    phase: SolverPhase,
}

impl Solver {
    /// Create a new solver. Parameters and settings are validated here.
    pub fn new(params: ScheduleParams, config: SolverConfig) -> Result<Self, SolverConfigError> {
        params.validate()?;
        config.validate()?;

        let params = Arc::new(params);
        let mut rng = match config.random_seed {
            Some(seed) => TimetableRng::new(seed),
            None => TimetableRng::from_entropy(),
        };
        let workers = (0..config.worker_count())
            .map(|_| BreedWorker {
                rng: TimetableRng::new(rng.next_seed()),
                evaluator: FitnessEvaluator::new(Arc::clone(&params), config.reuse_rule),
            })
            .collect();

        Ok(Self {
            evaluator: FitnessEvaluator::new(Arc::clone(&params), config.reuse_rule),
            ladder: WeightLadder::geometric(config.population_size, config.alpha),
            params,
            config,
            rng,
            workers,
            population: Vec::new(),
            initial_best: None,
            history: EvolutionHistory::default(),
            generation: 0,
            phase: SolverPhase::Initialized,
        })
    }

    pub fn params(&self) -> &ScheduleParams {
        &self.params
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Current population, best first.
    pub fn population(&self) -> &[Individual] {
        &self.population
    }

    pub fn history(&self) -> &EvolutionHistory {
        &self.history
    }

    pub fn generation(&self) -> usize {
        self.generation
    }

    pub fn phase(&self) -> SolverPhase {
        self.phase
    }

    /// Best individual of the initial population.
    pub fn best_before(&self) -> Option<&Individual> {
        self.initial_best.as_ref()
    }

    /// Best individual of the current population.
    pub fn best(&self) -> Option<&Individual> {
        self.population.first()
    }

    /// Fitness evaluations performed across all evaluators.
    pub fn total_evaluations(&self) -> u64 {
        self.evaluator.evaluations()
            + self
                .workers
                .iter()
                .map(|w| w.evaluator.evaluations())
                .sum::<u64>()
    }

    /// Build and score the initial population from the standard
    /// configuration.
    pub fn initialize(&mut self) {
        let base = TimetableConfig::from_params(&self.params);
        self.population.clear();
        self.history = EvolutionHistory::default();
        self.generation = 0;

        for _ in 0..self.config.population_size {
            let mut config = base.clone();
            if self.config.perturb_initial {
                self.rng.perturb(&mut config, &self.params);
            }
            self.population
                .push(Individual::new(config, &mut self.evaluator));
        }
        self.rank();

        self.initial_best = self.population.first().cloned();
        self.phase = SolverPhase::Initialized;
        log::info!(
            "Initialized {} individuals ({} down / {} up runs), best fitness {:.6}",
            self.population.len(),
            base.run_count(Direction::Down),
            base.run_count(Direction::Up),
            self.initial_best.as_ref().map_or(0.0, Individual::fitness)
        );
    }

    fn rank(&mut self) {
        self.population
            .sort_by(|a, b| b.fitness().total_cmp(&a.fitness()));
    }

    /// Run a single generation: parallel breeding, then ranking.
    pub fn step_generation(&mut self) {
        if self.population.is_empty() {
            return;
        }
        self.phase = SolverPhase::Breeding;

        let sizes = shard_sizes(self.population.len(), self.workers.len());
        log::debug!(
            "Generation {}: breeding shards {:?}",
            self.generation + 1,
            sizes
        );

        let population = &self.population;
        let ladder = &self.ladder;
        let config = &self.config;
        let shards: Vec<Vec<Individual>> = self
            .workers
            .par_iter_mut()
            .zip(sizes.into_par_iter())
            .map(|(worker, count)| worker.breed(population, ladder, count, config))
            .collect();

        self.population = shards.into_iter().flatten().collect();
        self.rank();
        self.generation += 1;
        self.phase = SolverPhase::Ranked;

        let stats = self.generation_stats();
        log::info!(
            "Generation {}/{}: best {:.6} worst {:.6} avg {:.6}",
            stats.generation,
            self.config.generations,
            stats.best_fitness,
            stats.worst_fitness,
            stats.avg_fitness
        );
        self.history.generations.push(stats);
    }

    fn generation_stats(&self) -> GenerationStats {
        let n = self.population.len().max(1) as f64;
        GenerationStats {
            generation: self.generation,
            best_fitness: self.population.first().map_or(0.0, Individual::fitness),
            worst_fitness: self.population.last().map_or(0.0, Individual::fitness),
            avg_fitness: self.population.iter().map(Individual::fitness).sum::<f64>() / n,
        }
    }

    /// Get current progress.
    pub fn progress(&self) -> SolverProgress {
        let stats = self.generation_stats();
        SolverProgress {
            generation: self.generation,
            total_generations: self.config.generations,
            best_fitness: stats.best_fitness,
            worst_fitness: stats.worst_fitness,
            avg_fitness: stats.avg_fitness,
            phase: self.phase,
        }
    }

    /// Exportable view of an individual.
    pub fn snapshot(&mut self, individual: &Individual) -> IndividualSnapshot {
        self.evaluator.snapshot(individual)
    }

    /// Run the search with a progress callback.
    pub fn run_with_callback<F>(&mut self, callback: F) -> SolverResult
    where
        F: Fn(&SolverProgress),
    {
        let start_time = Instant::now();

        self.initialize();
        callback(&self.progress());

        while self.generation < self.config.generations && !self.population.is_empty() {
            self.step_generation();
            callback(&self.progress());
        }
        self.phase = SolverPhase::Converged;
        callback(&self.progress());

        let elapsed = start_time.elapsed().as_secs_f64();
        let total_evaluations = self.total_evaluations();
        let final_stats = self.generation_stats();

        let before = self.initial_best.clone();
        let after = self.population.first().cloned();
        let before = before.map(|i| self.snapshot(&i));
        let after = after.map(|i| self.snapshot(&i));

        log::info!(
            "Search finished after {} generations: {:.6} -> {:.6} ({} evaluations, {:.2}s)",
            self.generation,
            before.as_ref().map_or(0.0, |s| s.fitness),
            final_stats.best_fitness,
            total_evaluations,
            elapsed
        );

        SolverResult {
            before,
            after,
            stats: SolverStats {
                generations: self.generation,
                total_evaluations,
                best_fitness: final_stats.best_fitness,
                final_avg_fitness: final_stats.avg_fitness,
                elapsed_seconds: elapsed,
                evaluations_per_second: if elapsed > 0.0 {
                    total_evaluations as f64 / elapsed
                } else {
                    0.0
                },
            },
            history: self.history.clone(),
        }
    }

    /// Run the search (blocking).
    pub fn run(&mut self) -> SolverResult {
        self.run_with_callback(|_| {})
    }
}

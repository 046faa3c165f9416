//! Random-walk baseline: repeated local mutation without selection.

use std::sync::Arc;

use rayon::prelude::*;

use crate::schema::{
    RandomWalkConfig, RandomWalkResult, ScheduleParams, SolverConfigError, TimetableConfig,
};

use super::fitness::{FitnessEvaluator, Individual};
use super::genome::TimetableRng;

/// Trace and best point of one walker.
struct Walk {
    trace: Vec<f64>,
    best: Individual,
}

/// Independent walkers that mutate and always accept.
pub struct RandomWalk {
    params: Arc<ScheduleParams>,
    config: RandomWalkConfig,
    rng: TimetableRng,
}

impl RandomWalk {
    pub fn new(
        params: ScheduleParams,
        config: RandomWalkConfig,
    ) -> Result<Self, SolverConfigError> {
        params.validate()?;
        let rng = match config.random_seed {
            Some(seed) => TimetableRng::new(seed),
            None => TimetableRng::from_entropy(),
        };
        Ok(Self {
            params: Arc::new(params),
            config,
            rng,
        })
    }

    pub fn config(&self) -> &RandomWalkConfig {
        &self.config
    }

    /// Run every walker in parallel.
    pub fn run(&mut self) -> RandomWalkResult {
        let seeds: Vec<u64> = (0..self.config.walkers)
            .map(|_| self.rng.next_seed())
            .collect();
        log::info!(
            "Random walk: {} walkers x {} steps",
            self.config.walkers,
            self.config.steps
        );

        let params = &self.params;
        let config = &self.config;
        let walks: Vec<Walk> = seeds
            .into_par_iter()
            .map_init(
                || FitnessEvaluator::new(Arc::clone(params), config.reuse_rule),
                |evaluator, seed| walk(evaluator, TimetableRng::new(seed), config),
            )
            .collect();

        let mut evaluator = FitnessEvaluator::new(Arc::clone(&self.params), self.config.reuse_rule);
        let best = walks
            .iter()
            .map(|w| &w.best)
            .max_by(|a, b| a.fitness().total_cmp(&b.fitness()))
            .map(|b| evaluator.snapshot(b));

        if let Some(best) = &best {
            log::info!("Random walk best fitness {:.6}", best.fitness);
        }

        RandomWalkResult {
            traces: walks.into_iter().map(|w| w.trace).collect(),
            best,
        }
    }
}

fn walk(
    evaluator: &mut FitnessEvaluator,
    mut rng: TimetableRng,
    config: &RandomWalkConfig,
) -> Walk {
    let mut start = TimetableConfig::from_params(evaluator.params());
    if config.perturb_initial {
        rng.perturb(&mut start, evaluator.params());
    }

    let mut current = Individual::new(start, evaluator);
    let mut best = current.clone();
    let mut trace = Vec::with_capacity(config.steps + 1);
    trace.push(current.fitness());

    for _ in 0..config.steps {
        let mut next = current.into_config();
        rng.mutate(&mut next, evaluator.params());
        current = Individual::new(next, evaluator);
        trace.push(current.fitness());
        if current.fitness() > best.fitness() {
            best = current.clone();
        }
    }

    log::debug!(
        "Walker finished: start {:.6} end {:.6} best {:.6}",
        trace[0],
        current.fitness(),
        best.fitness()
    );
    Walk { trace, best }
}

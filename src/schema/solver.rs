//! Search configuration and result types.
//!
//! This module provides the types that configure the genetic search and the
//! random-walk baseline, plus the progress, history and result types the
//! engines report back for export.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{ArmId, ParamsError, ScheduleParams, TimetableConfig};

/// Complete document loaded by the command line tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunConfig {
    /// Corridor facts.
    #[serde(default)]
    pub params: ScheduleParams,
    /// Genetic search settings.
    #[serde(default)]
    pub solver: SolverConfig,
    /// Baseline comparison, skipped when absent.
    #[serde(default)]
    pub random_walk: Option<RandomWalkConfig>,
}

/// How reusable energy is counted at each second of a supply arm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ReuseRule {
    /// `min(produced, consumed)`: braking energy absorbed by concurrent traction.
    #[default]
    Absorbed,
    /// `max(produced - consumed, 0)`: braking energy left over after traction.
    Surplus,
}

impl ReuseRule {
    /// Reusable energy for one second of one arm.
    #[inline]
    pub fn reusable(self, produced: f64, consumed: f64) -> f64 {
        match self {
            ReuseRule::Absorbed => produced.min(consumed),
            ReuseRule::Surplus => (produced - consumed).max(0.0),
        }
    }
}

/// Genetic algorithm configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolverConfig {
    /// Number of generations to run.
    #[serde(default = "default_generations")]
    pub generations: usize,
    /// Individuals per generation.
    #[serde(default = "default_population_size")]
    pub population_size: usize,
    /// Probability that a parent pair is recombined (0.0-1.0).
    #[serde(default = "default_crossover_rate")]
    pub crossover_rate: f64,
    /// Probability that a child is mutated (0.0-1.0).
    #[serde(default = "default_mutation_rate")]
    pub mutation_rate: f64,
    /// Geometric selection weight: rank `i` gets `alpha * (1 - alpha)^i`.
    #[serde(default = "default_alpha")]
    pub alpha: f64,
    /// Breeding workers. Uses the rayon pool size when unset.
    #[serde(default)]
    pub threads: Option<usize>,
    /// Re-draw the initial population within headway and dwell bounds.
    #[serde(default = "default_perturb_initial")]
    pub perturb_initial: bool,
    /// Fitness reduction rule.
    #[serde(default)]
    pub reuse_rule: ReuseRule,
    /// Random seed for reproducibility.
    #[serde(default)]
    pub random_seed: Option<u64>,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            generations: default_generations(),
            population_size: default_population_size(),
            crossover_rate: default_crossover_rate(),
            mutation_rate: default_mutation_rate(),
            alpha: default_alpha(),
            threads: None,
            perturb_initial: default_perturb_initial(),
            reuse_rule: ReuseRule::default(),
            random_seed: None,
        }
    }
}

fn default_generations() -> usize {
    200
}
fn default_population_size() -> usize {
    50
}
fn default_crossover_rate() -> f64 {
    0.8
}
fn default_mutation_rate() -> f64 {
    0.05
}
fn default_alpha() -> f64 {
    0.015
}
fn default_perturb_initial() -> bool {
    true
}

impl SolverConfig {
    /// Effective number of breeding workers.
    pub fn worker_count(&self) -> usize {
        self.threads
            .unwrap_or_else(rayon::current_num_threads)
            .max(1)
    }

    /// Validate solver settings.
    pub fn validate(&self) -> Result<(), SolverConfigError> {
        let check_probability = |p: f64, name: &str| {
            if (0.0..=1.0).contains(&p) {
                Ok(())
            } else {
                Err(SolverConfigError::InvalidProbability(format!(
                    "{} ({}) must lie in [0, 1]",
                    name, p
                )))
            }
        };
        check_probability(self.crossover_rate, "crossover_rate")?;
        check_probability(self.mutation_rate, "mutation_rate")?;

        if !(self.alpha > 0.0 && self.alpha <= 1.0) {
            return Err(SolverConfigError::InvalidAlpha(self.alpha));
        }
        if self.threads == Some(0) {
            return Err(SolverConfigError::NoWorkers);
        }
        Ok(())
    }
}

/// Random-walk baseline configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomWalkConfig {
    /// Independent walkers.
    #[serde(default = "default_walkers")]
    pub walkers: usize,
    /// Mutation steps per walker.
    #[serde(default = "default_steps")]
    pub steps: usize,
    /// Re-draw each starting point within headway and dwell bounds.
    #[serde(default = "default_perturb_initial")]
    pub perturb_initial: bool,
    /// Fitness reduction rule.
    #[serde(default)]
    pub reuse_rule: ReuseRule,
    /// Random seed for reproducibility.
    #[serde(default)]
    pub random_seed: Option<u64>,
}

impl Default for RandomWalkConfig {
    fn default() -> Self {
        Self {
            walkers: default_walkers(),
            steps: default_steps(),
            perturb_initial: default_perturb_initial(),
            reuse_rule: ReuseRule::default(),
            random_seed: None,
        }
    }
}

fn default_walkers() -> usize {
    50
}
fn default_steps() -> usize {
    200
}

/// Solver configuration validation errors.
#[derive(Debug, thiserror::Error)]
pub enum SolverConfigError {
    #[error("Invalid probability: {0}")]
    InvalidProbability(String),
    #[error("Selection alpha must lie in (0, 1], got {0}")]
    InvalidAlpha(f64),
    #[error("At least one breeding worker is required")]
    NoWorkers,
    #[error("Schedule parameters invalid: {0}")]
    Params(#[from] ParamsError),
}

// ============================================================================
// Progress and Result Types
// ============================================================================

/// Phase of the genetic search.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum SolverPhase {
    /// Population built and scored.
    #[default]
    Initialized,
    /// Workers are selecting, recombining and mutating offspring.
    Breeding,
    /// New population sorted and recorded.
    Ranked,
    /// Generation budget spent.
    Converged,
}

/// Fitness summary of one generation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationStats {
    /// 1-based generation number.
    pub generation: usize,
    pub best_fitness: f64,
    pub worst_fitness: f64,
    pub avg_fitness: f64,
}

/// Per-generation fitness series.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct EvolutionHistory {
    pub generations: Vec<GenerationStats>,
}

impl EvolutionHistory {
    pub fn len(&self) -> usize {
        self.generations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.generations.is_empty()
    }

    pub fn best_fitness(&self) -> Vec<f64> {
        self.generations.iter().map(|g| g.best_fitness).collect()
    }

    pub fn worst_fitness(&self) -> Vec<f64> {
        self.generations.iter().map(|g| g.worst_fitness).collect()
    }

    pub fn avg_fitness(&self) -> Vec<f64> {
        self.generations.iter().map(|g| g.avg_fitness).collect()
    }
}

/// Progress update passed to callbacks after every generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolverProgress {
    /// Generations completed.
    pub generation: usize,
    /// Generation budget.
    pub total_generations: usize,
    pub best_fitness: f64,
    pub worst_fitness: f64,
    pub avg_fitness: f64,
    pub phase: SolverPhase,
}

/// Exportable view of one individual.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndividualSnapshot {
    /// Total reuse ratio.
    pub fitness: f64,
    /// Reuse ratio per supply arm.
    pub arm_ratios: BTreeMap<ArmId, f64>,
    /// Decision variables.
    pub config: TimetableConfig,
}

/// Final result of a solver run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolverResult {
    /// Best individual of the initial population.
    pub before: Option<IndividualSnapshot>,
    /// Best individual of the final population.
    pub after: Option<IndividualSnapshot>,
    /// Statistics from the run.
    pub stats: SolverStats,
    /// Full history for analysis.
    pub history: EvolutionHistory,
}

/// Statistics from a solver run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolverStats {
    /// Generations run.
    pub generations: usize,
    /// Fitness evaluations performed, initial population included.
    pub total_evaluations: u64,
    /// Best fitness in the final population.
    pub best_fitness: f64,
    /// Average fitness of the final population.
    pub final_avg_fitness: f64,
    /// Time taken (in seconds).
    pub elapsed_seconds: f64,
    /// Evaluations per second.
    pub evaluations_per_second: f64,
}

/// Final result of a random walk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomWalkResult {
    /// Fitness after every step, one trace per walker (starting point first).
    pub traces: Vec<Vec<f64>>,
    /// Best configuration visited by any walker.
    pub best: Option<IndividualSnapshot>,
}

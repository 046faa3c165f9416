//! Fitness evaluation: decode a configuration and score its energy reuse.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::compute::{EnergySimulator, Timetable};
use crate::schema::{ArmId, IndividualSnapshot, ReuseRule, ScheduleParams, TimetableConfig};

/// Decodes configurations and scores them with a private energy simulator.
///
/// Each evaluator owns its series buffers, so one evaluator per thread.
pub struct FitnessEvaluator {
    params: Arc<ScheduleParams>,
    simulator: EnergySimulator,
    evaluations: u64,
}

impl FitnessEvaluator {
    /// Create a new fitness evaluator.
    pub fn new(params: Arc<ScheduleParams>, rule: ReuseRule) -> Self {
        let simulator = EnergySimulator::new(&params, rule);
        Self {
            params,
            simulator,
            evaluations: 0,
        }
    }

    pub fn params(&self) -> &ScheduleParams {
        &self.params
    }

    /// Evaluations performed so far.
    pub fn evaluations(&self) -> u64 {
        self.evaluations
    }

    /// Total reuse ratio of a configuration.
    pub fn evaluate(&mut self, config: &TimetableConfig) -> f64 {
        self.evaluations += 1;
        let timetable = Timetable::decode(config, &self.params);
        self.simulator.reuse_ratio(&timetable)
    }

    /// Reuse ratio per supply arm.
    pub fn arm_ratios(&mut self, config: &TimetableConfig) -> BTreeMap<ArmId, f64> {
        let timetable = Timetable::decode(config, &self.params);
        self.simulator.arm_ratios(&timetable)
    }

    /// Exportable view of an individual.
    pub fn snapshot(&mut self, individual: &Individual) -> IndividualSnapshot {
        IndividualSnapshot {
            fitness: individual.fitness,
            arm_ratios: self.arm_ratios(&individual.config),
            config: individual.config.clone(),
        }
    }
}

/// A configuration paired with its reuse ratio.
///
/// The fields are private: the only way to obtain an `Individual` is to
/// score a configuration, so the cached fitness always matches it.
#[derive(Debug, Clone, PartialEq)]
pub struct Individual {
    config: TimetableConfig,
    fitness: f64,
}

impl Individual {
    /// Score `config` and wrap it.
    pub fn new(config: TimetableConfig, evaluator: &mut FitnessEvaluator) -> Self {
        let fitness = evaluator.evaluate(&config);
        Self { config, fitness }
    }

    pub fn config(&self) -> &TimetableConfig {
        &self.config
    }

    pub fn fitness(&self) -> f64 {
        self.fitness
    }

    pub fn into_config(self) -> TimetableConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn evaluator() -> FitnessEvaluator {
        FitnessEvaluator::new(Arc::new(ScheduleParams::default()), ReuseRule::Absorbed)
    }

    #[test]
    fn test_fitness_evaluator() {
        let mut evaluator = evaluator();
        let config = TimetableConfig::from_params(evaluator.params());

        let fitness = evaluator.evaluate(&config);
        assert!(fitness > 0.0 && fitness < 1.0);
        assert_eq!(evaluator.evaluate(&config), fitness);
        assert_eq!(evaluator.evaluations(), 2);
    }

    #[test]
    fn test_individual_caches_fitness() {
        let mut evaluator = evaluator();
        let config = TimetableConfig::from_params(evaluator.params());
        let expected = evaluator.evaluate(&config);

        let individual = Individual::new(config.clone(), &mut evaluator);
        assert_eq!(individual.fitness(), expected);
        assert_eq!(individual.config(), &config);
        assert_eq!(individual.into_config(), config);
    }

    #[test]
    fn test_snapshot() {
        let mut evaluator = evaluator();
        let config = TimetableConfig::from_params(evaluator.params());
        let individual = Individual::new(config, &mut evaluator);

        let snapshot = evaluator.snapshot(&individual);
        assert_eq!(snapshot.fitness, individual.fitness());
        assert_eq!(snapshot.arm_ratios.len(), 4);
        assert!(snapshot.arm_ratios.values().all(|r| (0.0..=1.0).contains(r)));
    }

    #[test]
    fn test_evaluators_agree() {
        let params = Arc::new(ScheduleParams::default());
        let config = TimetableConfig::from_params(&params);
        let mut a = FitnessEvaluator::new(Arc::clone(&params), ReuseRule::Absorbed);
        let mut b = FitnessEvaluator::new(params, ReuseRule::Absorbed);
        assert_eq!(a.evaluate(&config), b.evaluate(&config));
    }
}

//! Chromosome operators: initial perturbation, crossover and mutation.
//!
//! All randomness flows through [`TimetableRng`], which each breeding worker
//! owns privately. Seeding it makes every operator reproducible.

use rand::prelude::*;

use crate::schema::{Direction, ScheduleParams, Second, StationId, TimetableConfig};

/// Random number generator wrapper for chromosome operations.
pub struct TimetableRng {
    rng: StdRng,
}

/// Genes touched by one [`TimetableRng::mutate`] call, indexed by direction
/// (`0` = down, `1` = up).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Mutation {
    /// Run whose first departure was re-drawn.
    pub departures: [Option<usize>; 2],
    /// `(run, station)` whose dwell was re-drawn.
    pub dwells: [Option<(usize, StationId)>; 2],
}

impl Mutation {
    pub fn is_empty(&self) -> bool {
        self.departures.iter().all(Option::is_none) && self.dwells.iter().all(Option::is_none)
    }
}

impl TimetableRng {
    /// Create from seed.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Create with random seed.
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Generate next u64 for seeding child RNGs.
    pub fn next_seed(&mut self) -> u64 {
        self.rng.r#gen()
    }

    /// `true` with probability `p`.
    pub fn chance(&mut self, p: f64) -> bool {
        self.rng.r#gen::<f64>() < p
    }

    /// Uniform real in `[0, upper)`.
    pub fn unit_scaled(&mut self, upper: f64) -> f64 {
        self.rng.r#gen::<f64>() * upper
    }

    /// Uniform integer in `[lo, hi]`.
    fn uniform(&mut self, lo: Second, hi: Second) -> Second {
        if lo >= hi {
            lo
        } else {
            self.rng.gen_range(lo..=hi)
        }
    }

    /// Departure following `previous`, drawn within the headway band active
    /// at `previous`.
    fn follow(&mut self, previous: Second, params: &ScheduleParams) -> Second {
        let band = params.headway_at(previous);
        previous + self.uniform(band.min, band.max)
    }

    /// Re-draw a configuration within its bounds.
    ///
    /// Departures after the first are re-drawn in order, each relative to
    /// its (already re-drawn) predecessor. Every non-terminal dwell is drawn
    /// uniformly within its bounds.
    pub fn perturb(&mut self, config: &mut TimetableConfig, params: &ScheduleParams) {
        for direction in Direction::ALL {
            let departures = config.departures_mut(direction);
            for i in 1..departures.len() {
                departures[i] = self.follow(departures[i - 1], params);
            }

            for map in config.dwells_mut(direction).iter_mut() {
                for (&station, dwell) in map.iter_mut() {
                    let bounds = params.dwell_bounds(station);
                    *dwell = self.uniform(bounds.min, bounds.max);
                }
            }
        }
    }

    /// Single-point crossover with an independent cut for each of the four
    /// sequences. The child takes `father[..cut]` and `mother[cut..]`.
    ///
    /// # Panics
    ///
    /// Panics if the parents differ in run count in either direction.
    pub fn crossover(
        &mut self,
        father: &TimetableConfig,
        mother: &TimetableConfig,
    ) -> TimetableConfig {
        TimetableConfig {
            down_departures: self.splice(&father.down_departures, &mother.down_departures),
            up_departures: self.splice(&father.up_departures, &mother.up_departures),
            down_dwells: self.splice(&father.down_dwells, &mother.down_dwells),
            up_dwells: self.splice(&father.up_dwells, &mother.up_dwells),
        }
    }

    fn splice<T: Clone>(&mut self, father: &[T], mother: &[T]) -> Vec<T> {
        assert_eq!(
            father.len(),
            mother.len(),
            "crossover parents differ in run count"
        );
        let cut = self.rng.gen_range(0..=father.len());
        father[..cut].iter().chain(&mother[cut..]).cloned().collect()
    }

    /// Local mutation. In each direction one run's first departure is
    /// re-drawn within the headway band of its predecessor, and one run's
    /// dwell at one non-terminal station is re-drawn within its bounds.
    ///
    /// The first run of a direction has no predecessor and keeps its
    /// departure.
    pub fn mutate(&mut self, config: &mut TimetableConfig, params: &ScheduleParams) -> Mutation {
        let mut report = Mutation::default();
        let stations = params.non_terminal_stations();

        for (d, direction) in Direction::ALL.into_iter().enumerate() {
            let departures = config.departures_mut(direction);
            if departures.len() > 1 {
                let run = self.rng.gen_range(1..departures.len());
                departures[run] = self.follow(departures[run - 1], params);
                report.departures[d] = Some(run);
            }

            let dwells = config.dwells_mut(direction);
            if !dwells.is_empty() && !stations.is_empty() {
                let run = self.rng.gen_range(0..dwells.len());
                let station = stations[self.rng.gen_range(0..stations.len())];
                let bounds = params.dwell_bounds(station);
                let value = self.uniform(bounds.min, bounds.max);
                dwells[run].insert(station, value);
                report.dwells[d] = Some((run, station));
            }
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_config() -> (ScheduleParams, TimetableConfig) {
        let params = ScheduleParams::default();
        let config = TimetableConfig::from_params(&params);
        (params, config)
    }

    fn assert_within_bounds(config: &TimetableConfig, params: &ScheduleParams) {
        for direction in Direction::ALL {
            let departures = config.departures(direction);
            for w in departures.windows(2) {
                let band = params.headway_at(w[0]);
                let gap = w[1] - w[0];
                assert!(gap >= band.min && gap <= band.max, "gap {gap} outside band");
            }
            for map in config.dwells(direction) {
                for (&station, &dwell) in map {
                    let bounds = params.dwell_bounds(station);
                    assert!(dwell >= bounds.min && dwell <= bounds.max);
                }
            }
        }
    }

    #[test]
    fn test_seeded_rng_reproducible() {
        let mut a = TimetableRng::new(42);
        let mut b = TimetableRng::new(42);
        assert_eq!(a.next_seed(), b.next_seed());
        assert_eq!(a.chance(0.5), b.chance(0.5));
    }

    #[test]
    fn test_chance_extremes() {
        let mut rng = TimetableRng::new(42);
        for _ in 0..100 {
            assert!(!rng.chance(0.0));
            assert!(rng.chance(1.0));
        }
    }

    #[test]
    fn test_perturb_within_bounds() {
        let (params, mut config) = default_config();
        let first = config.down_departures[0];
        let mut rng = TimetableRng::new(42);
        rng.perturb(&mut config, &params);

        assert_eq!(config.down_departures[0], first);
        assert_eq!(config.run_count(Direction::Down), 60);
        assert!(config.validate(&params).is_ok());
        assert_within_bounds(&config, &params);
    }

    #[test]
    fn test_crossover_with_self_is_identity() {
        let (params, mut config) = default_config();
        let mut rng = TimetableRng::new(42);
        rng.perturb(&mut config, &params);

        for _ in 0..20 {
            assert_eq!(rng.crossover(&config, &config), config);
        }
    }

    #[test]
    fn test_crossover_takes_prefix_and_suffix() {
        let (params, father) = default_config();
        let mut mother = father.clone();
        let mut rng = TimetableRng::new(42);
        rng.perturb(&mut mother, &params);

        let child = rng.crossover(&father, &mother);
        assert_eq!(child.down_departures.len(), father.down_departures.len());
        assert_eq!(child.up_dwells.len(), father.up_dwells.len());

        // Every gene comes from one parent at the same position.
        let cut = child
            .down_departures
            .iter()
            .zip(&father.down_departures)
            .take_while(|(c, f)| c == f)
            .count();
        assert_eq!(child.down_departures[cut..], mother.down_departures[cut..]);
        for (k, map) in child.up_dwells.iter().enumerate() {
            assert!(map == &father.up_dwells[k] || map == &mother.up_dwells[k]);
        }
    }

    #[test]
    #[should_panic(expected = "differ in run count")]
    fn test_crossover_length_mismatch_panics() {
        let (_, father) = default_config();
        let mut mother = father.clone();
        mother.up_departures.pop();
        let mut rng = TimetableRng::new(42);
        rng.crossover(&father, &mother);
    }

    #[test]
    fn test_mutation_is_local() {
        let (params, original) = default_config();
        let mut rng = TimetableRng::new(42);

        for _ in 0..50 {
            let mut config = original.clone();
            let report = rng.mutate(&mut config, &params);
            assert!(!report.is_empty());

            for (d, direction) in Direction::ALL.into_iter().enumerate() {
                let before = original.departures(direction);
                let after = config.departures(direction);
                for i in 0..before.len() {
                    if report.departures[d] != Some(i) {
                        assert_eq!(before[i], after[i]);
                    }
                }

                for (run, map) in config.dwells(direction).iter().enumerate() {
                    for (&station, &dwell) in map {
                        if report.dwells[d] != Some((run, station)) {
                            assert_eq!(dwell, original.dwells(direction)[run][&station]);
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_mutation_respects_bounds() {
        let (params, mut config) = default_config();
        let mut rng = TimetableRng::new(7);
        for _ in 0..200 {
            let report = rng.mutate(&mut config, &params);
            if let Some(run) = report.departures[0] {
                let band = params.headway_at(config.down_departures[run - 1]);
                let gap = config.down_departures[run] - config.down_departures[run - 1];
                assert!(gap >= band.min && gap <= band.max);
            }
            if let Some((run, station)) = report.dwells[1] {
                let bounds = params.dwell_bounds(station);
                let dwell = config.up_dwells[run][&station];
                assert!(dwell >= bounds.min && dwell <= bounds.max);
            }
        }
        assert!(config.validate(&params).is_ok());
    }

    #[test]
    fn test_mutation_single_run_keeps_departure() {
        let (params, mut config) = default_config();
        for direction in Direction::ALL {
            config.departures_mut(direction).truncate(1);
            config.dwells_mut(direction).truncate(1);
        }
        let mut rng = TimetableRng::new(42);
        let report = rng.mutate(&mut config, &params);
        assert_eq!(report.departures, [None, None]);
        assert!(report.dwells[0].is_some());
        assert_eq!(config.down_departures, vec![61_200]);
    }
}

//! Timetable configuration: the decision variables of one candidate timetable.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{ScheduleParams, Second, StationId};

/// Dwell time per non-terminal station for one run.
pub type DwellMap = BTreeMap<StationId, Second>;

/// Travel direction along the corridor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Station list walked forward.
    Down,
    /// Station list walked in reverse.
    Up,
}

impl Direction {
    pub const ALL: [Direction; 2] = [Direction::Down, Direction::Up];

    #[inline]
    pub fn is_down(self) -> bool {
        self == Direction::Down
    }
}

/// First departures and per-run dwell maps for both directions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimetableConfig {
    /// First-station departure of each down run.
    pub down_departures: Vec<Second>,
    /// First-station departure of each up run.
    pub up_departures: Vec<Second>,
    /// Dwell map of each down run.
    pub down_dwells: Vec<DwellMap>,
    /// Dwell map of each up run.
    pub up_dwells: Vec<DwellMap>,
}

impl TimetableConfig {
    /// Build the standard configuration: departures every standard headway
    /// from `first_train_time` up to (excluding) `last_train_time`, each run
    /// with default dwells.
    pub fn from_params(params: &ScheduleParams) -> Self {
        let departures = params.standard_departures();
        let dwell: DwellMap = params
            .non_terminal_stations()
            .iter()
            .map(|&s| (s, params.dwell_bounds(s).default))
            .collect();
        let dwells = vec![dwell; departures.len()];

        Self {
            down_departures: departures.clone(),
            up_departures: departures,
            down_dwells: dwells.clone(),
            up_dwells: dwells,
        }
    }

    #[inline]
    pub fn departures(&self, direction: Direction) -> &[Second] {
        match direction {
            Direction::Down => &self.down_departures,
            Direction::Up => &self.up_departures,
        }
    }

    #[inline]
    pub fn departures_mut(&mut self, direction: Direction) -> &mut Vec<Second> {
        match direction {
            Direction::Down => &mut self.down_departures,
            Direction::Up => &mut self.up_departures,
        }
    }

    #[inline]
    pub fn dwells(&self, direction: Direction) -> &[DwellMap] {
        match direction {
            Direction::Down => &self.down_dwells,
            Direction::Up => &self.up_dwells,
        }
    }

    #[inline]
    pub fn dwells_mut(&mut self, direction: Direction) -> &mut Vec<DwellMap> {
        match direction {
            Direction::Down => &mut self.down_dwells,
            Direction::Up => &mut self.up_dwells,
        }
    }

    /// Number of runs in one direction.
    #[inline]
    pub fn run_count(&self, direction: Direction) -> usize {
        self.departures(direction).len()
    }

    /// Total number of runs.
    pub fn total_runs(&self) -> usize {
        self.down_departures.len() + self.up_departures.len()
    }

    /// Whether both directions pair every departure with exactly one dwell map.
    pub fn is_consistent(&self) -> bool {
        Direction::ALL
            .iter()
            .all(|&d| self.departures(d).len() == self.dwells(d).len())
    }

    /// Check the configuration against the parameters it will be decoded with.
    pub fn validate(&self, params: &ScheduleParams) -> Result<(), TimetableError> {
        for direction in Direction::ALL {
            let departures = self.departures(direction).len();
            let dwells = self.dwells(direction).len();
            if departures != dwells {
                return Err(TimetableError::RunCountMismatch {
                    direction,
                    departures,
                    dwells,
                });
            }
            for (run, map) in self.dwells(direction).iter().enumerate() {
                for &station in params.non_terminal_stations() {
                    if !map.contains_key(&station) {
                        return Err(TimetableError::MissingDwell {
                            direction,
                            run,
                            station,
                        });
                    }
                }
                if let Some(&station) = map.keys().find(|s| params.is_terminal(**s)) {
                    return Err(TimetableError::TerminalDwell {
                        direction,
                        run,
                        station,
                    });
                }
            }
        }
        Ok(())
    }
}

/// Timetable configuration errors.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TimetableError {
    #[error("{direction:?}: {departures} departures but {dwells} dwell maps")]
    RunCountMismatch {
        direction: Direction,
        departures: usize,
        dwells: usize,
    },
    #[error("{direction:?} run {run} has no dwell for station {station}")]
    MissingDwell {
        direction: Direction,
        run: usize,
        station: StationId,
    },
    #[error("{direction:?} run {run} sets a dwell for terminal station {station}")]
    TerminalDwell {
        direction: Direction,
        run: usize,
        station: StationId,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_shape() {
        let params = ScheduleParams::default();
        let config = TimetableConfig::from_params(&params);

        // [17:00, 19:00) at 120 s
        assert_eq!(config.run_count(Direction::Down), 60);
        assert_eq!(config.run_count(Direction::Up), 60);
        assert_eq!(config.down_dwells.len(), config.down_departures.len());
        assert_eq!(config.up_dwells.len(), config.up_departures.len());
        assert_eq!(config.down_departures[0], 61_200);
        assert_eq!(config.down_departures[1], 61_320);
        assert!(config.validate(&params).is_ok());
    }

    #[test]
    fn test_default_departures_follow_bands() {
        let mut params = ScheduleParams::default();
        params.first_train_time = 68_160;
        params.last_train_time = 69_000;
        let config = TimetableConfig::from_params(&params);
        assert_eq!(
            config.down_departures,
            vec![68_160, 68_280, 68_400, 68_640, 68_880]
        );
    }

    #[test]
    fn test_dwell_maps_exclude_terminals() {
        let params = ScheduleParams::default();
        let config = TimetableConfig::from_params(&params);
        let map = &config.up_dwells[0];
        assert!(!map.contains_key(&0));
        assert!(!map.contains_key(&15));
        assert_eq!(map[&1], 30);
        assert_eq!(map[&4], 45);
    }

    #[test]
    fn test_validate_mismatch() {
        let params = ScheduleParams::default();
        let mut config = TimetableConfig::from_params(&params);
        config.up_dwells.pop();
        assert_eq!(
            config.validate(&params),
            Err(TimetableError::RunCountMismatch {
                direction: Direction::Up,
                departures: 60,
                dwells: 59,
            })
        );
    }

    #[test]
    fn test_validate_missing_dwell() {
        let params = ScheduleParams::default();
        let mut config = TimetableConfig::from_params(&params);
        config.down_dwells[3].remove(&7);
        assert_eq!(
            config.validate(&params),
            Err(TimetableError::MissingDwell {
                direction: Direction::Down,
                run: 3,
                station: 7,
            })
        );
    }
}

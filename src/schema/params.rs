//! Schedule parameters: the immutable network facts of one corridor.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// Seconds since midnight (may exceed 86400 for overnight runs).
pub type Second = i32;
/// Station identifier.
pub type StationId = i32;
/// Supply arm identifier.
pub type ArmId = i32;
/// Energy in kilojoules.
pub type KiloJoule = f64;

fn default_day_span() -> Second {
    129_600
}

/// Network facts shared by every timetable of one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleParams {
    /// Station sequence in down direction. First and last are terminals.
    pub stations: Vec<StationId>,
    /// Supply arm feeding each station.
    pub supply_arms: BTreeMap<StationId, ArmId>,
    /// Directed inter-station run times (both directions present).
    pub travel_times: Vec<TravelTime>,
    /// Dwell bounds per station (terminals are 0/0/0).
    pub dwell: BTreeMap<StationId, DwellBounds>,
    /// Headway bands partitioning the operating window.
    pub headways: Vec<HeadwayBand>,
    /// Length of the regenerative braking window before arrival.
    pub produce_duration: Second,
    /// Length of the traction window after departure.
    pub consume_duration: Second,
    /// Traction energy per elapsed second of the consume window (kJ).
    pub consume_curve: Vec<KiloJoule>,
    /// Braking energy per elapsed second of the produce window (kJ).
    pub produce_curve: Vec<KiloJoule>,
    /// First departure of the day (inclusive).
    pub first_train_time: Second,
    /// Last departure of the day (exclusive).
    pub last_train_time: Second,
    /// Length of the simulated energy series in seconds.
    #[serde(default = "default_day_span")]
    pub day_span: Second,
}

/// Directed run time between two adjacent stations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TravelTime {
    pub from: StationId,
    pub to: StationId,
    pub seconds: Second,
}

/// Minimum, standard and maximum dwell at a station.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DwellBounds {
    pub min: Second,
    pub default: Second,
    pub max: Second,
}

impl DwellBounds {
    pub const fn new(min: Second, default: Second, max: Second) -> Self {
        Self { min, default, max }
    }

    /// Bounds of a terminal station.
    pub const fn terminal() -> Self {
        Self::new(0, 0, 0)
    }
}

/// Time-of-day band `[start, end)` with its headway triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadwayBand {
    pub start: Second,
    pub end: Second,
    pub min: Second,
    pub default: Second,
    pub max: Second,
}

impl HeadwayBand {
    #[inline]
    pub fn contains(&self, t: Second) -> bool {
        t >= self.start && t < self.end
    }
}

impl Default for ScheduleParams {
    fn default() -> Self {
        let stations: Vec<StationId> = (0..16).collect();
        let supply_arms = stations.iter().map(|&s| (s, s / 4)).collect();

        let legs: [Second; 15] = [
            185, 136, 127, 145, 150, 119, 105, 134, 143, 136, 167, 157, 172, 181, 185,
        ];
        let travel_times = legs
            .iter()
            .enumerate()
            .flat_map(|(i, &seconds)| {
                let a = i as StationId;
                let b = a + 1;
                [
                    TravelTime { from: a, to: b, seconds },
                    TravelTime { from: b, to: a, seconds },
                ]
            })
            .collect();

        let dwell = stations
            .iter()
            .map(|&s| {
                let bounds = match s {
                    0 | 15 => DwellBounds::terminal(),
                    4..=9 => DwellBounds::new(40, 45, 50),
                    _ => DwellBounds::new(25, 30, 35),
                };
                (s, bounds)
            })
            .collect();

        // (start, end, standard) per band; min/max are standard -/+ 30 s.
        let bands: [(Second, Second, Second); 9] = [
            (19_800, 25_200, 600), // 05:30-07:00
            (25_200, 28_800, 240), // 07:00-08:00
            (28_800, 36_000, 120), // 08:00-10:00
            (36_000, 39_600, 240), // 10:00-11:00
            (39_600, 57_600, 600), // 11:00-16:00
            (57_600, 61_200, 240), // 16:00-17:00
            (61_200, 68_400, 120), // 17:00-19:00
            (68_400, 72_000, 240), // 19:00-20:00
            (72_000, 84_600, 600), // 20:00-23:30
        ];
        let headways = bands
            .iter()
            .map(|&(start, end, default)| HeadwayBand {
                start,
                end,
                min: default - 30,
                default,
                max: default + 30,
            })
            .collect();

        let mut consume_curve = vec![
            202.544, 607.53, 1012.21, 1416.8, 1820.87, 2224.65, 2627.32, 3029.41, 3430.61,
            3676.98,
        ];
        consume_curve.resize(30, 3680.0);

        let produce_curve = vec![
            4499.74, 4189.41, 3879.09, 3568.76, 3258.44, 2948.11, 2637.79, 2327.47, 2017.14,
            1706.97, 1396.46, 1086.14, 671.127, 0.0, 0.0,
        ];

        Self {
            stations,
            supply_arms,
            travel_times,
            dwell,
            headways,
            produce_duration: 15,
            consume_duration: 30,
            consume_curve,
            produce_curve,
            // Evening peak only.
            first_train_time: 61_200,
            last_train_time: 68_400,
            day_span: default_day_span(),
        }
    }
}

impl ScheduleParams {
    /// Whether `station` is the first or last station of the corridor.
    #[inline]
    pub fn is_terminal(&self, station: StationId) -> bool {
        self.stations.first() == Some(&station) || self.stations.last() == Some(&station)
    }

    /// Stations whose dwell is a decision variable.
    pub fn non_terminal_stations(&self) -> &[StationId] {
        match self.stations.len() {
            0..=2 => &[],
            n => &self.stations[1..n - 1],
        }
    }

    /// Supply arm of a station.
    ///
    /// # Panics
    ///
    /// Panics if the station has no arm; `validate` rules this out.
    #[inline]
    pub fn arm_of(&self, station: StationId) -> ArmId {
        match self.supply_arms.get(&station) {
            Some(&arm) => arm,
            None => panic!("station {station} has no supply arm"),
        }
    }

    /// Distinct supply arms, ascending.
    pub fn arm_ids(&self) -> Vec<ArmId> {
        self.supply_arms
            .values()
            .copied()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Directed run time between two stations, if defined.
    pub fn travel_time(&self, from: StationId, to: StationId) -> Option<Second> {
        self.travel_times
            .iter()
            .find(|t| t.from == from && t.to == to)
            .map(|t| t.seconds)
    }

    /// Dwell bounds of a station (terminal bounds when missing).
    pub fn dwell_bounds(&self, station: StationId) -> DwellBounds {
        self.dwell
            .get(&station)
            .copied()
            .unwrap_or(DwellBounds::terminal())
    }

    /// Headway band covering `t`. Instants before the first band resolve to
    /// the first band, instants after the last band to the last band.
    ///
    /// # Panics
    ///
    /// Panics if there are no bands; `validate` rules this out.
    pub fn headway_at(&self, t: Second) -> &HeadwayBand {
        if let Some(band) = self.headways.iter().find(|b| b.contains(t)) {
            return band;
        }
        let earliest = self.headways.iter().min_by_key(|b| b.start);
        let latest = self.headways.iter().max_by_key(|b| b.end);
        match (earliest, latest) {
            (Some(first), _) if t < first.start => first,
            (_, Some(last)) => last,
            _ => panic!("no headway bands defined"),
        }
    }

    /// Standard departures: walk the headway bands from the first to the
    /// last train time at each band's default headway.
    pub fn standard_departures(&self) -> Vec<Second> {
        let mut departures = Vec::new();
        let mut t = self.first_train_time;
        while t < self.last_train_time {
            departures.push(t);
            t += self.headway_at(t).default.max(1);
        }
        departures
    }

    /// Longest end-to-end running time of either direction, every dwell at
    /// its maximum.
    pub fn max_trip_duration(&self) -> Second {
        let dwell: Second = self
            .stations
            .iter()
            .map(|&s| self.dwell_bounds(s).max)
            .sum();
        let leg = |from, to| self.travel_time(from, to).unwrap_or(0);
        let (down, up) = self
            .stations
            .windows(2)
            .fold((0, 0), |(down, up), w| {
                (down + leg(w[0], w[1]), up + leg(w[1], w[0]))
            });
        down.max(up) + dwell
    }

    /// Latest second any energy window can reach. Departure `i` never lies
    /// more than `i` widest headways after the first train, so the bound
    /// holds for every perturbed, crossed or mutated configuration.
    pub fn energy_horizon(&self) -> Second {
        let runs = self.standard_departures().len() as Second;
        let widest = self.headways.iter().map(|b| b.max).max().unwrap_or(0);
        let latest_departure = self.first_train_time + (runs - 1).max(0) * widest;
        latest_departure
            + self.max_trip_duration()
            + self.produce_duration.max(self.consume_duration)
    }

    /// Validate parameters.
    pub fn validate(&self) -> Result<(), ParamsError> {
        if self.stations.len() < 2 {
            return Err(ParamsError::TooFewStations(self.stations.len()));
        }
        let mut seen = BTreeSet::new();
        for &s in &self.stations {
            if !seen.insert(s) {
                return Err(ParamsError::DuplicateStation(s));
            }
            if !self.supply_arms.contains_key(&s) {
                return Err(ParamsError::MissingSupplyArm(s));
            }
        }
        for w in self.stations.windows(2) {
            for (from, to) in [(w[0], w[1]), (w[1], w[0])] {
                match self.travel_time(from, to) {
                    Some(t) if t > 0 => {}
                    _ => return Err(ParamsError::MissingTravelTime { from, to }),
                }
            }
        }
        for &s in &self.stations {
            let bounds = self.dwell_bounds(s);
            if self.is_terminal(s) {
                if bounds != DwellBounds::terminal() {
                    return Err(ParamsError::TerminalDwell(s));
                }
                continue;
            }
            if !self.dwell.contains_key(&s) {
                return Err(ParamsError::MissingDwell(s));
            }
            if !(0 <= bounds.min && bounds.min <= bounds.default && bounds.default <= bounds.max) {
                return Err(ParamsError::InvalidDwellBounds(s));
            }
        }

        if self.first_train_time >= self.last_train_time {
            return Err(ParamsError::EmptyOperatingWindow);
        }
        if self.headways.is_empty() {
            return Err(ParamsError::NoHeadwayBands);
        }
        for band in &self.headways {
            if band.start >= band.end {
                return Err(ParamsError::EmptyHeadwayBand(band.start));
            }
            if !(0 < band.min && band.min <= band.default && band.default <= band.max) {
                return Err(ParamsError::InvalidHeadwayBounds(band.start));
            }
        }
        let mut sorted: Vec<&HeadwayBand> = self.headways.iter().collect();
        sorted.sort_by_key(|b| b.start);
        for pair in sorted.windows(2) {
            if pair[1].start < pair[0].end {
                return Err(ParamsError::OverlappingHeadwayBands(pair[1].start));
            }
        }
        let mut t = self.first_train_time;
        while t < self.last_train_time {
            match sorted.iter().find(|b| b.contains(t)) {
                Some(band) => t = band.end,
                None => return Err(ParamsError::HeadwayGap(t)),
            }
        }

        if self.produce_duration <= 0 || self.consume_duration <= 0 {
            return Err(ParamsError::InvalidExchangeDuration);
        }
        if self.consume_curve.is_empty() || self.produce_curve.is_empty() {
            return Err(ParamsError::EmptyCurve);
        }
        let required = self.energy_horizon();
        if self.day_span < required {
            return Err(ParamsError::DaySpanTooShort {
                day_span: self.day_span,
                required,
            });
        }
        Ok(())
    }
}

/// Schedule parameter validation errors.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ParamsError {
    #[error("At least two stations are required, got {0}")]
    TooFewStations(usize),
    #[error("Station {0} appears more than once")]
    DuplicateStation(StationId),
    #[error("Station {0} has no supply arm")]
    MissingSupplyArm(StationId),
    #[error("No positive travel time from station {from} to station {to}")]
    MissingTravelTime { from: StationId, to: StationId },
    #[error("Station {0} has no dwell bounds")]
    MissingDwell(StationId),
    #[error("Dwell bounds of station {0} must satisfy 0 <= min <= default <= max")]
    InvalidDwellBounds(StationId),
    #[error("Terminal station {0} must have zero dwell")]
    TerminalDwell(StationId),
    #[error("First train time must precede last train time")]
    EmptyOperatingWindow,
    #[error("No headway bands defined")]
    NoHeadwayBands,
    #[error("Headway band starting at {0} is empty")]
    EmptyHeadwayBand(Second),
    #[error("Headway band starting at {0} must satisfy 0 < min <= default <= max")]
    InvalidHeadwayBounds(Second),
    #[error("Headway band starting at {0} overlaps its predecessor")]
    OverlappingHeadwayBands(Second),
    #[error("No headway band covers t={0}")]
    HeadwayGap(Second),
    #[error("Produce and consume durations must be positive")]
    InvalidExchangeDuration,
    #[error("Energy curves must be non-empty")]
    EmptyCurve,
    #[error("Day span {day_span} is shorter than required {required}")]
    DaySpanTooShort { day_span: Second, required: Second },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_params_valid() {
        let params = ScheduleParams::default();
        assert_eq!(params.validate(), Ok(()));
        assert_eq!(params.stations.len(), 16);
        assert_eq!(params.arm_ids(), vec![0, 1, 2, 3]);
        assert_eq!(params.non_terminal_stations().len(), 14);
    }

    #[test]
    fn test_headway_lookup() {
        let params = ScheduleParams::default();
        assert_eq!(params.headway_at(61_200).default, 120);
        assert_eq!(params.headway_at(68_399).default, 120);
        assert_eq!(params.headway_at(68_400).default, 240);
        // Outside every band
        assert_eq!(params.headway_at(0).start, 19_800);
        assert_eq!(params.headway_at(90_000).end, 84_600);
    }

    #[test]
    fn test_travel_time_symmetric() {
        let params = ScheduleParams::default();
        assert_eq!(params.travel_time(0, 1), Some(185));
        assert_eq!(params.travel_time(1, 0), Some(185));
        assert_eq!(params.travel_time(0, 2), None);
    }

    #[test]
    fn test_headway_gap_detected() {
        let mut params = ScheduleParams::default();
        params.headways.retain(|b| b.start != 61_200);
        assert_eq!(params.validate(), Err(ParamsError::HeadwayGap(61_200)));
    }

    #[test]
    fn test_bad_dwell_bounds() {
        let mut params = ScheduleParams::default();
        params.dwell.insert(3, DwellBounds::new(40, 30, 50));
        assert_eq!(params.validate(), Err(ParamsError::InvalidDwellBounds(3)));
    }

    #[test]
    fn test_missing_travel_time() {
        let mut params = ScheduleParams::default();
        params.travel_times.retain(|t| !(t.from == 7 && t.to == 6));
        assert_eq!(
            params.validate(),
            Err(ParamsError::MissingTravelTime { from: 7, to: 6 })
        );
    }

    #[test]
    fn test_trip_and_horizon() {
        let params = ScheduleParams::default();
        // 2242 s of travel plus 6 x 50 s and 8 x 35 s of maximum dwell.
        assert_eq!(params.max_trip_duration(), 2_822);
        assert_eq!(params.standard_departures().len(), 60);
        assert_eq!(params.energy_horizon(), 61_200 + 59 * 630 + 2_822 + 30);
    }

    #[test]
    fn test_day_span_must_cover_last_trip() {
        let mut params = ScheduleParams::default();
        params.day_span = params.last_train_time + 30;
        let required = params.energy_horizon();
        assert_eq!(
            params.validate(),
            Err(ParamsError::DaySpanTooShort {
                day_span: params.last_train_time + 30,
                required,
            })
        );

        params.day_span = required;
        assert_eq!(params.validate(), Ok(()));
    }

    #[test]
    fn test_serialization() {
        let params = ScheduleParams::default();
        let json = serde_json::to_string(&params).unwrap();
        let parsed: ScheduleParams = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.stations, params.stations);
        assert_eq!(parsed.supply_arms, params.supply_arms);
        assert_eq!(parsed.headways, params.headways);
    }
}

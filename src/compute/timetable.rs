//! Schedule decoder: turns a configuration into concrete train runs.
//!
//! Each run (mission) walks the station list forward (down) or in reverse
//! (up). At every station the arrival, departure and the two energy-exchange
//! windows are derived:
//!
//! ```text
//!   produce_begin      arrival        departure        consume_end
//!        |--- braking ----|---- dwell ----|--- traction ---|
//! ```
//!
//! Consecutive stations are joined by an [`Interval`] that carries the
//! departing station's traction window and the arriving station's braking
//! window, each tagged with the supply arm it draws from or feeds.

use serde::{Deserialize, Serialize};

use crate::schema::{
    ArmId, Direction, DwellMap, ScheduleParams, Second, StationId, TimetableConfig,
};

/// One station visit of a mission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Station {
    pub station_id: StationId,
    pub supply_arm: ArmId,
    /// Start of the braking window (`arrival - produce_duration`).
    pub produce_begin: Second,
    pub arrival: Second,
    pub departure: Second,
    /// End of the traction window (`departure + consume_duration`).
    pub consume_end: Second,
    pub dwell: Second,
}

impl Station {
    #[inline]
    pub fn consume_begin(&self) -> Second {
        self.departure
    }

    #[inline]
    pub fn produce_end(&self) -> Second {
        self.arrival
    }
}

/// Run between two adjacent stations of a mission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interval {
    pub from: StationId,
    pub to: StationId,
    /// Arm of the departing station.
    pub consume_arm: ArmId,
    pub consume_begin: Second,
    pub consume_end: Second,
    /// Arm of the arriving station.
    pub produce_arm: ArmId,
    pub produce_begin: Second,
    pub produce_end: Second,
}

impl Interval {
    /// Join two consecutive station visits.
    pub fn between(departing: &Station, arriving: &Station) -> Self {
        Self {
            from: departing.station_id,
            to: arriving.station_id,
            consume_arm: departing.supply_arm,
            consume_begin: departing.consume_begin(),
            consume_end: departing.consume_end,
            produce_arm: arriving.supply_arm,
            produce_begin: arriving.produce_begin,
            produce_end: arriving.produce_end(),
        }
    }

    /// Whether traction and braking happen on different supply arms.
    #[inline]
    pub fn crosses_arm(&self) -> bool {
        self.consume_arm != self.produce_arm
    }
}

/// One decoded train run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mission {
    pub id: usize,
    pub direction: Direction,
    pub stations: Vec<Station>,
    pub intervals: Vec<Interval>,
}

impl Mission {
    fn new(id: usize, direction: Direction, stations: Vec<Station>) -> Self {
        let intervals = stations
            .windows(2)
            .map(|w| Interval::between(&w[0], &w[1]))
            .collect();
        Self {
            id,
            direction,
            stations,
            intervals,
        }
    }

    /// `(station, time)` points at arrival and departure of every station.
    pub fn plot_points(&self) -> Vec<(StationId, Second)> {
        self.stations
            .iter()
            .flat_map(|s| [(s.station_id, s.arrival), (s.station_id, s.departure)])
            .collect()
    }
}

/// A fully decoded timetable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timetable {
    /// Down runs first, then up runs; ids are sequential.
    pub missions: Vec<Mission>,
}

impl Timetable {
    /// Decode a configuration.
    ///
    /// # Panics
    ///
    /// Panics if a direction's departure and dwell sequences differ in length,
    /// a dwell map lacks a non-terminal station, or the parameters lack a
    /// supply arm or travel time the walk needs. `TimetableConfig::validate`
    /// and `ScheduleParams::validate` rule these out.
    pub fn decode(config: &TimetableConfig, params: &ScheduleParams) -> Self {
        let mut missions = Vec::with_capacity(config.total_runs());

        for direction in Direction::ALL {
            let departures = config.departures(direction);
            let dwells = config.dwells(direction);
            assert_eq!(
                departures.len(),
                dwells.len(),
                "{direction:?}: departure and dwell sequences differ in length"
            );

            let route = Route::new(params, direction);
            for (run, (&departure, dwell)) in departures.iter().zip(dwells).enumerate() {
                let stations = route.walk(departure, dwell, run);
                missions.push(Mission::new(missions.len(), direction, stations));
            }
        }

        Self { missions }
    }

    /// Missions of one direction.
    pub fn missions_in(&self, direction: Direction) -> impl Iterator<Item = &Mission> {
        self.missions.iter().filter(move |m| m.direction == direction)
    }

    /// All intervals of all missions.
    pub fn intervals(&self) -> impl Iterator<Item = &Interval> {
        self.missions.iter().flat_map(|m| m.intervals.iter())
    }

    /// Plot points of every mission.
    pub fn plot_data(&self) -> Vec<Vec<(StationId, Second)>> {
        self.missions.iter().map(Mission::plot_points).collect()
    }
}

/// Station order of one direction with the per-leg lookups resolved once.
struct Route<'a> {
    params: &'a ScheduleParams,
    order: Vec<StationId>,
    arms: Vec<ArmId>,
    /// `legs[k]` is the run time from `order[k]` to `order[k + 1]`.
    legs: Vec<Second>,
}

impl<'a> Route<'a> {
    fn new(params: &'a ScheduleParams, direction: Direction) -> Self {
        let mut order = params.stations.clone();
        if !direction.is_down() {
            order.reverse();
        }
        let arms = order.iter().map(|&s| params.arm_of(s)).collect();
        let legs = order
            .windows(2)
            .map(|w| match params.travel_time(w[0], w[1]) {
                Some(t) => t,
                None => panic!("no travel time from station {} to {}", w[0], w[1]),
            })
            .collect();
        Self {
            params,
            order,
            arms,
            legs,
        }
    }

    fn walk(&self, first_departure: Second, dwell: &DwellMap, run: usize) -> Vec<Station> {
        let produce = self.params.produce_duration;
        let consume = self.params.consume_duration;

        let mut stations = Vec::with_capacity(self.order.len());
        let mut arrival = first_departure;
        for (k, &station_id) in self.order.iter().enumerate() {
            let stop = if self.params.is_terminal(station_id) {
                0
            } else {
                match dwell.get(&station_id) {
                    Some(&d) => d,
                    None => panic!("run {run} has no dwell for station {station_id}"),
                }
            };
            let departure = arrival + stop;
            stations.push(Station {
                station_id,
                supply_arm: self.arms[k],
                produce_begin: arrival - produce,
                arrival,
                departure,
                consume_end: departure + consume,
                dwell: stop,
            });
            if let Some(&leg) = self.legs.get(k) {
                arrival = departure + leg;
            }
        }
        stations
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_timetable() -> (ScheduleParams, Timetable) {
        let params = ScheduleParams::default();
        let config = TimetableConfig::from_params(&params);
        let timetable = Timetable::decode(&config, &params);
        (params, timetable)
    }

    #[test]
    fn test_mission_shape() {
        let (params, timetable) = default_timetable();
        assert_eq!(timetable.missions.len(), 120);
        for mission in &timetable.missions {
            assert_eq!(mission.stations.len(), params.stations.len());
            assert_eq!(mission.intervals.len(), mission.stations.len() - 1);
        }
    }

    #[test]
    fn test_ids_and_directions() {
        let (_, timetable) = default_timetable();
        for (i, mission) in timetable.missions.iter().enumerate() {
            assert_eq!(mission.id, i);
        }
        assert_eq!(timetable.missions_in(Direction::Down).count(), 60);
        assert_eq!(timetable.missions_in(Direction::Up).count(), 60);
        assert!(timetable.missions[0].direction.is_down());
        assert_eq!(timetable.missions[60].direction, Direction::Up);
    }

    #[test]
    fn test_down_walk_times() {
        let (_, timetable) = default_timetable();
        let first = &timetable.missions[0];

        let origin = first.stations[0];
        assert_eq!(origin.station_id, 0);
        assert_eq!(origin.arrival, 61_200);
        assert_eq!(origin.departure, 61_200);
        assert_eq!(origin.dwell, 0);
        assert_eq!(origin.produce_begin, 61_185);
        assert_eq!(origin.consume_end, 61_230);

        let second = first.stations[1];
        assert_eq!(second.station_id, 1);
        assert_eq!(second.arrival, 61_200 + 185);
        assert_eq!(second.departure, 61_200 + 185 + 30);
        assert_eq!(second.supply_arm, 0);

        let terminus = first.stations.last().unwrap();
        assert_eq!(terminus.station_id, 15);
        assert_eq!(terminus.dwell, 0);
        assert_eq!(terminus.departure, terminus.arrival);
        // 2242 s travel + 510 s of dwell
        assert_eq!(terminus.arrival, 61_200 + 2_242 + 510);
    }

    #[test]
    fn test_up_walk_reversed() {
        let (_, timetable) = default_timetable();
        let up = timetable.missions_in(Direction::Up).next().unwrap();
        assert_eq!(up.stations[0].station_id, 15);
        assert_eq!(up.stations[1].station_id, 14);
        assert_eq!(up.stations[1].arrival, 61_200 + 185);
        assert_eq!(up.stations.last().unwrap().station_id, 0);
    }

    #[test]
    fn test_interval_matches_departing_station() {
        let (_, timetable) = default_timetable();
        for mission in &timetable.missions {
            for (k, interval) in mission.intervals.iter().enumerate() {
                let departing = &mission.stations[k];
                let arriving = &mission.stations[k + 1];
                assert_eq!(interval.from, departing.station_id);
                assert_eq!(interval.to, arriving.station_id);
                assert_eq!(interval.consume_arm, departing.supply_arm);
                assert_eq!(interval.consume_begin, departing.departure);
                assert_eq!(interval.consume_end, departing.consume_end);
                assert_eq!(interval.produce_arm, arriving.supply_arm);
                assert_eq!(interval.produce_begin, arriving.produce_begin);
                assert_eq!(interval.produce_end, arriving.arrival);
            }
        }
    }

    #[test]
    fn test_arm_crossings() {
        let (_, timetable) = default_timetable();
        let crossings = timetable.missions[0]
            .intervals
            .iter()
            .filter(|i| i.crosses_arm())
            .count();
        assert_eq!(crossings, 3);
    }

    #[test]
    fn test_plot_points() {
        let (_, timetable) = default_timetable();
        let points = timetable.missions[0].plot_points();
        assert_eq!(points.len(), 32);
        assert_eq!(points[0], (0, 61_200));
        assert_eq!(points[2], (1, 61_385));
        assert_eq!(points[3], (1, 61_415));
        assert_eq!(timetable.plot_data().len(), 120);
    }

    #[test]
    #[should_panic(expected = "no dwell for station")]
    fn test_missing_dwell_panics() {
        let params = ScheduleParams::default();
        let mut config = TimetableConfig::from_params(&params);
        config.down_dwells[0].remove(&5);
        Timetable::decode(&config, &params);
    }

    #[test]
    #[should_panic(expected = "differ in length")]
    fn test_length_mismatch_panics() {
        let params = ScheduleParams::default();
        let mut config = TimetableConfig::from_params(&params);
        config.down_departures.push(70_000);
        Timetable::decode(&config, &params);
    }
}

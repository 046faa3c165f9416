//! Regen Timetable - Timetable optimization for regenerative braking energy reuse.
//!
//! A rail corridor's traction power network is split into supply arms. A
//! braking train feeds energy back into its arm; that energy is only useful
//! if another train on the same arm is drawing traction power at the same
//! moment. This crate searches over first-departure times and dwell times
//! for the timetable that maximizes the fraction of braking energy reused.
//!
//! # Architecture
//!
//! The crate is split into two main modules:
//!
//! - `schema`: Corridor parameters, timetable configurations, solver settings
//!   and result types
//! - `compute`: Schedule decoding, energy simulation and the genetic search
//!
//! # Example
//!
//! ```rust,no_run
//! use regen_timetable::{
//!     schema::{ReuseRule, ScheduleParams, TimetableConfig},
//!     compute::{EnergySimulator, Timetable},
//! };
//!
//! let params = ScheduleParams::default();
//! let config = TimetableConfig::from_params(&params);
//!
//! // Decode into train runs and score energy reuse
//! let timetable = Timetable::decode(&config, &params);
//! let mut simulator = EnergySimulator::new(&params, ReuseRule::Absorbed);
//!
//! println!("Reuse ratio: {:.4}", simulator.reuse_ratio(&timetable));
//! ```

pub mod compute;
pub mod schema;

// Re-export commonly used types
pub use compute::evolution::{RandomWalk, ReportWriter, Solver};
pub use compute::{EnergySimulator, Timetable};
pub use schema::{RunConfig, ScheduleParams, SolverConfig, TimetableConfig};

//! Compute module - Schedule decoding, energy simulation and search.

mod energy;
mod timetable;

pub mod evolution;

pub use energy::*;
pub use timetable::*;

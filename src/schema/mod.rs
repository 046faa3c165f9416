//! Schema module - Parameter, configuration and result types.

mod params;
mod solver;
mod timetable_config;

pub use params::*;
pub use solver::*;
pub use timetable_config::*;

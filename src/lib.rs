// Library exports for testing
pub mod certs;
pub mod cli;
pub mod config;
pub mod duration;
pub mod error;
pub mod models;
pub mod report;

pub use error::{Result, ScheduleError};

/// Exit status after a completed simulation. The historical rotation check
/// exited with 1 here and scripts depend on it.
pub const SIMULATION_COMPLETE_EXIT_CODE: i32 = 1;

/// Exit status when the schedule cannot be parsed or fails validation.
pub const CONFIG_ERROR_EXIT_CODE: i32 = 2;

pub mod schedule;

pub use schedule::{DEFAULT_ITERATIONS, HoursSummary, RawSchedule, ScheduleConfig};

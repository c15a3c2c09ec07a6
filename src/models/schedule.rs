use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::duration::{as_hours, parse_duration};
use crate::error::{Result, ScheduleError};

pub const DEFAULT_CA_DURATION: &str = "1095d";
pub const DEFAULT_CA_EXPIRY: &str = "28d";
pub const DEFAULT_NODE_DURATION: &str = "365d";
pub const DEFAULT_NODE_EXPIRY: &str = "7d";
pub const DEFAULT_CLIENT_DURATION: &str = "30d";
pub const DEFAULT_CLIENT_EXPIRY: &str = "2d";
pub const DEFAULT_MIN_CERT_DURATION: &str = "27d";
pub const DEFAULT_ITERATIONS: usize = 29;

/// Unparsed schedule settings, as they appear in a config file or on the
/// command line. Missing values fall back to the defaults above.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawSchedule {
    pub ca_duration: Option<String>,
    pub ca_expiry: Option<String>,
    pub node_duration: Option<String>,
    pub node_expiry: Option<String>,
    pub client_duration: Option<String>,
    pub client_expiry: Option<String>,
    pub min_cert_duration: Option<String>,
    pub iterations: Option<usize>,
}

impl RawSchedule {
    /// Layer `overrides` on top of `self`; any value set in `overrides` wins.
    pub fn merge(self, overrides: RawSchedule) -> RawSchedule {
        RawSchedule {
            ca_duration: overrides.ca_duration.or(self.ca_duration),
            ca_expiry: overrides.ca_expiry.or(self.ca_expiry),
            node_duration: overrides.node_duration.or(self.node_duration),
            node_expiry: overrides.node_expiry.or(self.node_expiry),
            client_duration: overrides.client_duration.or(self.client_duration),
            client_expiry: overrides.client_expiry.or(self.client_expiry),
            min_cert_duration: overrides.min_cert_duration.or(self.min_cert_duration),
            iterations: overrides.iterations.or(self.iterations),
        }
    }

    /// Parse every duration, filling gaps with defaults.
    pub fn resolve(&self) -> Result<ScheduleConfig> {
        fn field(name: &str, value: &Option<String>, default: &str) -> Result<Duration> {
            parse_duration(name, value.as_deref().unwrap_or(default))
        }

        Ok(ScheduleConfig {
            ca_duration: field("ca-duration", &self.ca_duration, DEFAULT_CA_DURATION)?,
            ca_expiry_window: field("ca-expiry", &self.ca_expiry, DEFAULT_CA_EXPIRY)?,
            node_duration: field("node-duration", &self.node_duration, DEFAULT_NODE_DURATION)?,
            node_expiry_window: field("node-expiry", &self.node_expiry, DEFAULT_NODE_EXPIRY)?,
            client_duration: field(
                "client-duration",
                &self.client_duration,
                DEFAULT_CLIENT_DURATION,
            )?,
            client_expiry_window: field(
                "client-expiry",
                &self.client_expiry,
                DEFAULT_CLIENT_EXPIRY,
            )?,
            min_cert_duration: field(
                "min-cert-duration",
                &self.min_cert_duration,
                DEFAULT_MIN_CERT_DURATION,
            )?,
        })
    }

    pub fn iterations(&self) -> Result<usize> {
        match self.iterations.unwrap_or(DEFAULT_ITERATIONS) {
            0 => Err(ScheduleError::NoIterations),
            n => Ok(n),
        }
    }
}

/// The seven durations that define a rotation schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleConfig {
    pub ca_duration: Duration,
    pub ca_expiry_window: Duration,
    pub node_duration: Duration,
    pub node_expiry_window: Duration,
    pub client_duration: Duration,
    pub client_expiry_window: Duration,
    /// Rotation cron interval; also the simulator's tick spacing.
    pub min_cert_duration: Duration,
}

/// The schedule in hours, for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HoursSummary {
    pub ca_duration: f64,
    pub ca_expiry: f64,
    pub node_duration: f64,
    pub node_expiry: f64,
    pub client_duration: f64,
    pub client_expiry: f64,
    pub min_cert_duration: f64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            ca_duration: Duration::days(1095),
            ca_expiry_window: Duration::days(28),
            node_duration: Duration::days(365),
            node_expiry_window: Duration::days(7),
            client_duration: Duration::days(30),
            client_expiry_window: Duration::days(2),
            min_cert_duration: Duration::days(27),
        }
    }
}

impl ScheduleConfig {
    /// Check that every certificate type can be rotated at least once per
    /// `min_cert_duration` cycle without lapsing.
    ///
    /// The CA bounds are inclusive, the node and client bounds exclusive.
    /// The first violated check is returned.
    pub fn validate(&self) -> Result<()> {
        let min = self.min_cert_duration.num_seconds();
        if min <= 0 {
            return Err(ScheduleError::ZeroInterval(format!(
                "{}h",
                as_hours(self.min_cert_duration)
            )));
        }

        let ca_duration = self.ca_duration.num_seconds();
        let ca_expiry = self.ca_expiry_window.num_seconds();
        if ca_duration - ca_expiry < min {
            return Err(ScheduleError::CaLifetimeTooShort {
                ca_duration: as_hours(self.ca_duration),
                ca_expiry: as_hours(self.ca_expiry_window),
                min: as_hours(self.min_cert_duration),
            });
        }

        if ca_expiry < min {
            return Err(ScheduleError::CaExpiryWindowTooShort {
                ca_expiry: as_hours(self.ca_expiry_window),
                min: as_hours(self.min_cert_duration),
            });
        }

        if self.node_duration.num_seconds() - self.node_expiry_window.num_seconds() <= min {
            return Err(ScheduleError::NodeLifetimeTooShort {
                node_duration: as_hours(self.node_duration),
                node_expiry: as_hours(self.node_expiry_window),
                min: as_hours(self.min_cert_duration),
            });
        }

        if self.client_duration.num_seconds() - self.client_expiry_window.num_seconds() <= min {
            return Err(ScheduleError::ClientLifetimeTooShort {
                client_duration: as_hours(self.client_duration),
                client_expiry: as_hours(self.client_expiry_window),
                min: as_hours(self.min_cert_duration),
            });
        }

        Ok(())
    }

    /// How long a CA certificate stays in service before its renewal is due.
    pub fn ca_rotation_interval(&self) -> Duration {
        self.ca_duration - self.ca_expiry_window
    }

    pub fn hours_summary(&self) -> HoursSummary {
        HoursSummary {
            ca_duration: as_hours(self.ca_duration),
            ca_expiry: as_hours(self.ca_expiry_window),
            node_duration: as_hours(self.node_duration),
            node_expiry: as_hours(self.node_expiry_window),
            client_duration: as_hours(self.client_duration),
            client_expiry: as_hours(self.client_expiry_window),
            min_cert_duration: as_hours(self.min_cert_duration),
        }
    }
}

use clap::Parser;
use std::path::PathBuf;

use crate::models::RawSchedule;
use crate::report::OutputFormat;

/// Validate a CA/node/client certificate rotation schedule and simulate its
/// cron cycles before applying it to a real CA.
///
/// Durations accept s/m/h suffixes (e.g. `36h`, `1h30m`) or whole days (`27d`).
#[derive(Parser, Debug)]
#[command(name = "cert-rotation-check", version)]
pub struct Cli {
    /// Total CA certificate lifetime [default: 1095d]
    #[arg(long, env = "CERT_ROTATION_CA_DURATION")]
    pub ca_duration: Option<String>,

    /// CA renewal window before hard expiry [default: 28d]
    #[arg(long, env = "CERT_ROTATION_CA_EXPIRY")]
    pub ca_expiry: Option<String>,

    /// Total node certificate lifetime [default: 365d]
    #[arg(long, env = "CERT_ROTATION_NODE_DURATION")]
    pub node_duration: Option<String>,

    /// Node renewal window [default: 7d]
    #[arg(long, env = "CERT_ROTATION_NODE_EXPIRY")]
    pub node_expiry: Option<String>,

    /// Total client certificate lifetime [default: 30d]
    #[arg(long, env = "CERT_ROTATION_CLIENT_DURATION")]
    pub client_duration: Option<String>,

    /// Client renewal window [default: 2d]
    #[arg(long, env = "CERT_ROTATION_CLIENT_EXPIRY")]
    pub client_expiry: Option<String>,

    /// Rotation cron interval [default: 27d]
    #[arg(long, env = "CERT_ROTATION_MIN_CERT_DURATION")]
    pub min_cert_duration: Option<String>,

    /// Number of cron ticks to simulate [default: 29]
    #[arg(long)]
    pub iterations: Option<usize>,

    /// YAML file with schedule settings; flags override its values
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,

    /// Output format for tick reports
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

impl Cli {
    /// Settings given on the command line, without defaults applied.
    pub fn schedule_overrides(&self) -> RawSchedule {
        RawSchedule {
            ca_duration: self.ca_duration.clone(),
            ca_expiry: self.ca_expiry.clone(),
            node_duration: self.node_duration.clone(),
            node_expiry: self.node_expiry.clone(),
            client_duration: self.client_duration.clone(),
            client_expiry: self.client_expiry.clone(),
            min_cert_duration: self.min_cert_duration.clone(),
            iterations: self.iterations,
        }
    }
}

use thiserror::Error;

/// Errors that stop a schedule from being simulated.
///
/// Every variant is a startup precondition: the operator has to fix the
/// configuration and rerun. The simulator itself never fails.
#[derive(Error, Debug)]
pub enum ScheduleError {
    #[error("failed to parse {field} duration '{value}'")]
    InvalidDuration { field: String, value: String },

    #[error(
        "CA cert details do not meet the min-cert-duration criteria: \
         ca-duration ({ca_duration}h) - ca-expiry ({ca_expiry}h) must be >= min-cert-duration ({min}h)"
    )]
    CaLifetimeTooShort {
        ca_duration: f64,
        ca_expiry: f64,
        min: f64,
    },

    #[error(
        "ca-expiry does not meet the min-cert-duration criteria: \
         ca-expiry ({ca_expiry}h) must be >= min-cert-duration ({min}h)"
    )]
    CaExpiryWindowTooShort { ca_expiry: f64, min: f64 },

    #[error(
        "Node cert details do not meet the min-cert-duration criteria: \
         node-duration ({node_duration}h) - node-expiry ({node_expiry}h) must be > min-cert-duration ({min}h)"
    )]
    NodeLifetimeTooShort {
        node_duration: f64,
        node_expiry: f64,
        min: f64,
    },

    #[error(
        "Client cert details do not meet the min-cert-duration criteria: \
         client-duration ({client_duration}h) - client-expiry ({client_expiry}h) must be > min-cert-duration ({min}h)"
    )]
    ClientLifetimeTooShort {
        client_duration: f64,
        client_expiry: f64,
        min: f64,
    },

    #[error("min-cert-duration must be positive, got '{0}'")]
    ZeroInterval(String),

    #[error("iterations must be at least 1")]
    NoIterations,

    #[error("{0} ends past the latest representable date")]
    DateOverflow(String),

    #[error("failed to read config file '{path}': {source}")]
    ConfigRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse YAML config '{path}': {source}")]
    ConfigParse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("failed to write report: {0}")]
    Output(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ScheduleError>;

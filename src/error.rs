use crate::recorder::RelayRecorder;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MetricsError {
    #[error("invalid relay configuration: {0}")]
    Configuration(String),
    #[error("invalid metric: {0}")]
    InvalidMetric(String),
    #[error("metric {key} has non-finite value {value}")]
    NonFiniteValue { key: String, value: f64 },
    #[error("IO error sending metric: {0}")]
    Io(#[from] std::io::Error),
    #[error("couldnt serialize metric: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("datagram truncated: wrote {written} of {len} bytes")]
    Truncated { written: usize, len: usize },
    #[error("timer misuse: {0}")]
    TimerUsage(#[from] TimerUsageError),
    #[error("metric {name} is a {found}, expected a {expected}")]
    TypeMismatch {
        name: String,
        expected: &'static str,
        found: &'static str,
    },
    #[error("failed to set RelayRecorder: {0}")]
    Recorder(#[from] metrics::SetRecorderError<RelayRecorder>),
}

/// Misuse of a timer's start/stop pairing.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TimerUsageError {
    #[error("timer already started")]
    AlreadyStarted,
    #[error("timer stopped without being started")]
    NotStarted,
    #[error("timer {0} is no longer registered")]
    NotRegistered(String),
}

/// A single metric that could not be handed to the collector.
#[derive(Error, Debug)]
#[error("failed to send metric {metric}: {source}")]
pub struct SendFailure {
    pub metric: String,
    #[source]
    pub source: MetricsError,
}

impl SendFailure {
    pub(crate) fn new(metric: impl Into<String>, source: MetricsError) -> Self {
        Self {
            metric: metric.into(),
            source,
        }
    }
}

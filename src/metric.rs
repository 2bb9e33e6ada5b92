mod counter;
mod timer;

pub use counter::Counter;
pub use timer::{Timer, TimerSpan};

use crate::{
    error::MetricsError,
    events::{MetricRecord, MetricType},
};

/// Rejects names that are empty or only whitespace.
pub(crate) fn check_name(name: &str) -> Result<(), MetricsError> {
    if name.trim().is_empty() {
        return Err(MetricsError::InvalidMetric(
            "metric name must not be empty".into(),
        ));
    }
    Ok(())
}

/// A metric stored in the relay registry.
#[derive(Debug, Clone, PartialEq)]
pub enum Metric {
    Counter(Counter),
    Timer(Timer),
}

impl Metric {
    pub fn name(&self) -> &str {
        match self {
            Self::Counter(counter) => counter.name(),
            Self::Timer(timer) => timer.name(),
        }
    }

    pub fn service(&self) -> &str {
        match self {
            Self::Counter(counter) => counter.service(),
            Self::Timer(timer) => timer.service(),
        }
    }

    /// Checks that the metric has both a name and a service.
    ///
    /// # Errors
    /// Returns [`MetricsError::InvalidMetric`] if either is empty.
    pub fn validate(&self) -> Result<(), MetricsError> {
        check_name(self.name())?;
        if self.service().trim().is_empty() {
            return Err(MetricsError::InvalidMetric(format!(
                "metric {} has no service",
                self.name()
            )));
        }
        Ok(())
    }

    pub const fn metric_type(&self) -> MetricType {
        match self {
            Self::Counter(_) => MetricType::Counter,
            Self::Timer(_) => MetricType::Timer,
        }
    }

    /// The current value as it goes on the wire. Timers report seconds.
    pub fn value(&self) -> f64 {
        match self {
            Self::Counter(counter) => counter.value(),
            Self::Timer(timer) => timer.value().as_secs_f64(),
        }
    }

    pub fn to_record(&self) -> MetricRecord {
        match self {
            Self::Counter(counter) => counter.to_record(),
            Self::Timer(timer) => timer.to_record(),
        }
    }

    pub const fn as_counter(&self) -> Option<&Counter> {
        match self {
            Self::Counter(counter) => Some(counter),
            Self::Timer(_) => None,
        }
    }

    pub const fn as_timer(&self) -> Option<&Timer> {
        match self {
            Self::Timer(timer) => Some(timer),
            Self::Counter(_) => None,
        }
    }
}

impl From<Counter> for Metric {
    fn from(counter: Counter) -> Self {
        Self::Counter(counter)
    }
}

impl From<Timer> for Metric {
    fn from(timer: Timer) -> Self {
        Self::Timer(timer)
    }
}

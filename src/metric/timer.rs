use crate::{
    error::TimerUsageError,
    events::{Attributes, MetricRecord, MetricType},
};
use std::time::{Duration, Instant};

/// Measures the wall-clock duration of a span of work.
///
/// The last measured duration is kept as the timer's value until the timer
/// is run again. Values are sent to the collector in seconds.
#[derive(Debug, Clone, PartialEq)]
pub struct Timer {
    name: String,
    service: String,
    attributes: Attributes,
    tags: Vec<String>,
    value: Duration,
    start_time: Option<Instant>,
}

impl Timer {
    pub fn new(name: impl Into<String>, service: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            service: service.into(),
            attributes: Attributes::new(),
            tags: Vec::new(),
            value: Duration::ZERO,
            start_time: None,
        }
    }

    #[must_use]
    pub fn with_attributes(mut self, attributes: Attributes) -> Self {
        self.attributes = attributes;
        self
    }

    #[must_use]
    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    /// Records the current instant as the start of the span.
    ///
    /// # Errors
    /// Returns [`TimerUsageError::AlreadyStarted`] if the timer is running.
    pub fn start(&mut self) -> Result<(), TimerUsageError> {
        if self.start_time.is_some() {
            return Err(TimerUsageError::AlreadyStarted);
        }
        self.start_time = Some(Instant::now());
        Ok(())
    }

    /// Stores the time elapsed since [`Timer::start`] as the value.
    ///
    /// # Errors
    /// Returns [`TimerUsageError::NotStarted`] if the timer is not running.
    pub fn stop(&mut self) -> Result<Duration, TimerUsageError> {
        let started = self.start_time.take().ok_or(TimerUsageError::NotStarted)?;
        self.value = started.elapsed();
        Ok(self.value)
    }

    /// Starts the timer and returns a guard that stops it when dropped.
    ///
    /// # Errors
    /// Returns [`TimerUsageError::AlreadyStarted`] if the timer is running.
    pub fn span(&mut self) -> Result<TimerSpan<'_>, TimerUsageError> {
        self.start()?;
        Ok(TimerSpan { timer: self })
    }

    /// Overwrites the measured value without running the timer.
    pub const fn record(&mut self, value: Duration) {
        self.value = value;
    }

    pub const fn is_running(&self) -> bool {
        self.start_time.is_some()
    }

    pub const fn value(&self) -> Duration {
        self.value
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    pub const fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn to_record(&self) -> MetricRecord {
        MetricRecord::new(
            &self.name,
            &self.service,
            &self.attributes,
            self.value.as_secs_f64(),
            MetricType::Timer,
            &self.tags,
        )
    }
}

/// Scope guard for a locally owned [`Timer`].
#[derive(Debug)]
pub struct TimerSpan<'a> {
    timer: &'a mut Timer,
}

impl Drop for TimerSpan<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.timer.stop() {
            log::warn!("timer {} span ended without a running timer: {e}", self.timer.name);
        }
    }
}

use super::registry::Registry;
use crate::{error::MetricsError, metric::Timer};
use std::{future::Future, time::Duration};

/// A timer registered in a relay, returned by [`MetricRelay::timer`].
///
/// The handle does not own the timer; every call acts on whatever timer
/// is currently registered under the handle's name.
///
/// [`MetricRelay::timer`]: crate::MetricRelay::timer
#[derive(Debug, Clone)]
pub struct TimerHandle {
    name: String,
    registry: Registry,
}

impl TimerHandle {
    pub(crate) const fn new(name: String, registry: Registry) -> Self {
        Self { name, registry }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// # Errors
    /// Returns [`MetricsError::TimerUsage`] if the timer is already running
    /// or was removed from the registry.
    pub fn start(&self) -> Result<(), MetricsError> {
        self.registry
            .with_timer(&self.name, None, Timer::start)?
            .map_err(Into::into)
    }

    /// # Errors
    /// Returns [`MetricsError::TimerUsage`] if the timer is not running.
    pub fn stop(&self) -> Result<Duration, MetricsError> {
        self.registry
            .with_timer(&self.name, None, Timer::stop)?
            .map_err(Into::into)
    }

    /// Starts the timer and returns a guard that stops it when dropped,
    /// whether the enclosing scope returns, bails out with `?` or panics.
    ///
    /// # Example
    /// ```
    /// # fn main() -> Result<(), ffwd_relay::MetricsError> {
    /// let relay = ffwd_relay::MetricRelay::new("my-service")?;
    /// let timer = relay.timer("db-query")?;
    /// {
    ///     let _span = timer.span()?;
    ///     // timed work
    /// }
    /// assert!(timer.value().is_some());
    /// # Ok(())
    /// # }
    /// ```
    ///
    /// # Errors
    /// Same as [`TimerHandle::start`].
    pub fn span(&self) -> Result<TimerGuard<'_>, MetricsError> {
        self.start()?;
        Ok(TimerGuard { handle: self })
    }

    /// Times `fut` to completion. Dropping the returned future early still
    /// records the time spent so far.
    ///
    /// # Errors
    /// Same as [`TimerHandle::start`].
    pub async fn time<F: Future>(&self, fut: F) -> Result<F::Output, MetricsError> {
        let _span = self.span()?;
        Ok(fut.await)
    }

    /// Last measured duration, or `None` if the name no longer holds a timer.
    pub fn value(&self) -> Option<Duration> {
        self.registry
            .with_timer(&self.name, None, |timer| timer.value())
            .ok()
    }
}

/// Scope guard for a registered timer; see [`TimerHandle::span`].
#[derive(Debug)]
pub struct TimerGuard<'a> {
    handle: &'a TimerHandle,
}

impl Drop for TimerGuard<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.handle.stop() {
            log::warn!("timer {} span ended without stopping: {e}", self.handle.name);
        }
    }
}

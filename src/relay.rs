mod builder;
mod handle;
pub(crate) mod registry;

pub use builder::MetricRelayBuilder;
pub use handle::{TimerGuard, TimerHandle};

use crate::{
    error::{MetricsError, SendFailure},
    events::{Attributes, MetricRecord, MetricType},
    metric::{Counter, Metric, Timer, check_name},
    recorder::RelayRecorder,
    transport::{Transport, UdpTransport},
};
use registry::Registry;
use std::{sync::Arc, time::Duration};
use tokio::{task::JoinHandle, time::MissedTickBehavior};

/// Outcome of a [`MetricRelay::flush`].
#[derive(Debug, Default)]
pub struct FlushReport {
    /// Number of registry entries a send was attempted for.
    pub attempted: usize,
    pub failures: Vec<SendFailure>,
}

impl FlushReport {
    pub fn sent(&self) -> usize {
        self.attempted - self.failures.len()
    }

    pub fn is_ok(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Holds named counters and timers for a service and sends them to an
/// ffwd agent.
///
/// Recording is synchronous and in-memory; only [`MetricRelay::flush`] and
/// [`MetricRelay::emit`] touch the network. The relay is cheap to clone and
/// every clone shares the same registry and socket.
///
/// Names are unique: registering a metric under a name that is already in
/// use replaces the previous metric, whatever its kind, without merging
/// attributes. Callers are responsible for keeping names distinct.
#[derive(Debug)]
pub struct MetricRelay<T: Transport = UdpTransport> {
    registry: Registry,
    ffwd_address: Arc<(String, u16)>,
    transport: Arc<T>,
}

impl<T: Transport> Clone for MetricRelay<T> {
    fn clone(&self) -> Self {
        Self {
            registry: self.registry.clone(),
            ffwd_address: Arc::clone(&self.ffwd_address),
            transport: Arc::clone(&self.transport),
        }
    }
}

impl MetricRelay {
    /// Creates a relay sending to the default ffwd agent on `127.0.0.1:19000`.
    ///
    /// # Errors
    /// Returns [`MetricsError::Configuration`] if `service_name` is empty.
    pub fn new(service_name: &str) -> Result<Self, MetricsError> {
        Self::builder(service_name).build()
    }

    pub fn builder(service_name: &str) -> MetricRelayBuilder {
        MetricRelayBuilder::new(service_name)
    }
}

impl<T: Transport> MetricRelay<T> {
    pub(crate) fn from_parts(
        registry: Registry,
        ffwd_address: (String, u16),
        transport: T,
    ) -> Self {
        Self {
            registry,
            ffwd_address: Arc::new(ffwd_address),
            transport: Arc::new(transport),
        }
    }

    pub fn service_name(&self) -> &str {
        self.registry.service()
    }

    pub fn ffwd_address(&self) -> (&str, u16) {
        (&self.ffwd_address.0, self.ffwd_address.1)
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Adds `delta` to the counter `name`, creating it at zero first.
    ///
    /// # Errors
    /// Returns [`MetricsError::TypeMismatch`] if `name` holds a timer and
    /// [`MetricsError::InvalidMetric`] if `name` is empty.
    pub fn incr(&self, name: &str, delta: f64) -> Result<f64, MetricsError> {
        self.incr_with(name, delta, Attributes::new())
    }

    /// Like [`MetricRelay::incr`]; `attributes` only apply when the counter
    /// is created by this call.
    ///
    /// # Errors
    /// Same as [`MetricRelay::incr`].
    pub fn incr_with(
        &self,
        name: &str,
        delta: f64,
        attributes: Attributes,
    ) -> Result<f64, MetricsError> {
        self.registry.incr(name, delta, attributes)
    }

    /// Stores `counter` under `name`, returning the metric it replaced.
    ///
    /// # Errors
    /// Returns [`MetricsError::InvalidMetric`] if `name`, the counter's own
    /// name or its service is empty. Nothing is stored in that case.
    pub fn set_counter(
        &self,
        name: &str,
        counter: Counter,
    ) -> Result<Option<Metric>, MetricsError> {
        self.registry.insert(name, counter.into())
    }

    /// Stores `timer` under `name`, returning the metric it replaced.
    ///
    /// # Errors
    /// Same as [`MetricRelay::set_counter`].
    pub fn set_timer(&self, name: &str, timer: Timer) -> Result<Option<Metric>, MetricsError> {
        self.registry.insert(name, timer.into())
    }

    /// Registers a fresh timer under `name`, replacing any metric already
    /// there, and returns a handle for timing spans with it.
    ///
    /// # Errors
    /// Returns [`MetricsError::InvalidMetric`] if `name` is empty.
    pub fn timer(&self, name: &str) -> Result<TimerHandle, MetricsError> {
        self.timer_with(name, Attributes::new())
    }

    /// # Errors
    /// Same as [`MetricRelay::timer`].
    pub fn timer_with(
        &self,
        name: &str,
        attributes: Attributes,
    ) -> Result<TimerHandle, MetricsError> {
        let timer = self.registry.new_timer(name, attributes);
        self.registry.insert(name, timer.into())?;
        Ok(TimerHandle::new(name.to_owned(), self.registry.clone()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.registry.contains(name)
    }

    /// A copy of the metric stored under `name`.
    pub fn get(&self, name: &str) -> Option<Metric> {
        self.registry.get(name)
    }

    pub fn names(&self) -> Vec<String> {
        self.registry.names()
    }

    pub fn len(&self) -> usize {
        self.registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sends a one-off event without storing it.
    ///
    /// # Errors
    /// Returns a [`SendFailure`] if `name` is empty or the event could not
    /// be serialized or sent.
    pub async fn emit(&self, name: &str, value: f64) -> Result<(), SendFailure> {
        self.emit_with(name, value, Attributes::new()).await
    }

    /// # Errors
    /// Same as [`MetricRelay::emit`].
    pub async fn emit_with(
        &self,
        name: &str,
        value: f64,
        attributes: Attributes,
    ) -> Result<(), SendFailure> {
        check_name(name).map_err(|e| SendFailure::new(name, e))?;
        let record = MetricRecord::new(
            name,
            self.registry.service(),
            &attributes,
            value,
            MetricType::Event,
            self.registry.tags(),
        );
        self.send_record(name, &record).await.inspect_err(|e| {
            log::warn!("{e}");
        })
    }

    /// Sends every registered metric to the collector.
    ///
    /// The registry is left untouched. A metric that fails to send is
    /// logged and reported without stopping the remaining sends.
    pub async fn flush(&self) -> FlushReport {
        let records = self.registry.records();
        let mut report = FlushReport {
            attempted: records.len(),
            failures: Vec::new(),
        };
        for (name, record) in &records {
            if let Err(e) = self.send_record(name, record).await {
                log::warn!("{e}");
                report.failures.push(e);
            }
        }
        log::debug!(
            "flushed {} of {} metrics for {}",
            report.sent(),
            report.attempted,
            self.service_name()
        );
        report
    }

    async fn send_record(&self, name: &str, record: &MetricRecord) -> Result<(), SendFailure> {
        let payload: Vec<u8> = record
            .try_into()
            .map_err(|e| SendFailure::new(name, e))?;
        log::trace!("sending {} bytes for metric {name}", payload.len());
        self.transport
            .send(payload)
            .await
            .map_err(|e| SendFailure::new(name, e))
    }

    /// Spawns a task that flushes the relay every `period` until the
    /// returned handle is aborted. The first flush happens after one period.
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Errors
    /// Returns [`MetricsError::Configuration`] if `period` is zero.
    pub fn spawn_flusher(&self, period: Duration) -> Result<JoinHandle<()>, MetricsError> {
        if period.is_zero() {
            return Err(MetricsError::Configuration(
                "flush period must be greater than zero".into(),
            ));
        }
        let relay = self.clone();
        Ok(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let report = relay.flush().await;
                if !report.is_ok() {
                    log::error!(
                        "periodic flush for {} failed for {} of {} metrics",
                        relay.service_name(),
                        report.failures.len(),
                        report.attempted
                    );
                }
            }
        }))
    }

    /// A [`metrics::Recorder`] that records into this relay's registry.
    pub fn recorder(&self) -> RelayRecorder {
        RelayRecorder::new(self.registry.clone())
    }

    /// Installs [`MetricRelay::recorder`] as the global `metrics` recorder,
    /// so `metrics::counter!` and friends feed this relay.
    ///
    /// # Errors
    /// Returns [`MetricsError::Recorder`] if a global recorder is already set.
    pub fn install_recorder(&self) -> Result<(), MetricsError> {
        metrics::set_global_recorder(self.recorder()).map_err(Into::into)
    }
}

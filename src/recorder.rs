use crate::{error::MetricsError, events::Attributes, relay::registry::Registry};
use std::{sync::Arc, time::Duration};

fn attributes_of(key: &metrics::Key) -> Attributes {
    key.labels()
        .map(|label| (label.key().to_owned(), label.value().to_owned()))
        .collect()
}

fn report(key: &metrics::Key, result: Result<impl Sized, MetricsError>) {
    if let Err(e) = result {
        log::warn!("dropping update for metric {}: {e}", key.name());
    }
}

#[derive(Debug)]
struct Handle {
    key: metrics::Key,
    registry: Registry,
}

impl Handle {
    const fn new(key: metrics::Key, registry: Registry) -> Self {
        Self { key, registry }
    }

    fn add(&self, delta: f64) {
        let result = self
            .registry
            .incr(self.key.name(), delta, attributes_of(&self.key));
        report(&self.key, result);
    }

    fn store(&self, value: f64) {
        let result = self
            .registry
            .set_value(self.key.name(), value, attributes_of(&self.key));
        report(&self.key, result);
    }
}

#[allow(clippy::cast_precision_loss)]
impl metrics::CounterFn for Handle {
    fn increment(&self, value: u64) {
        self.add(value as f64);
    }

    fn absolute(&self, value: u64) {
        self.store(value as f64);
    }
}

impl metrics::GaugeFn for Handle {
    fn increment(&self, value: f64) {
        self.add(value);
    }

    fn decrement(&self, value: f64) {
        self.add(-value);
    }

    fn set(&self, value: f64) {
        self.store(value);
    }
}

impl metrics::HistogramFn for Handle {
    /// Histogram samples are taken as durations in seconds; the timer keeps
    /// the latest one.
    fn record(&self, value: f64) {
        let Ok(duration) = Duration::try_from_secs_f64(value) else {
            log::warn!(
                "dropping sample {value} for timer {}: not a duration",
                self.key.name()
            );
            return;
        };
        let result = self.registry.with_timer(
            self.key.name(),
            Some(attributes_of(&self.key)),
            |timer| timer.record(duration),
        );
        report(&self.key, result);
    }
}

/// A [`metrics::Recorder`] that records into a relay's registry.
///
/// Counters and gauges become relay counters, histograms become relay
/// timers. Labels are used as attributes when a metric is first created.
/// Obtained from [`MetricRelay::recorder`](crate::MetricRelay::recorder).
#[derive(Debug, Clone)]
pub struct RelayRecorder {
    registry: Registry,
}

impl RelayRecorder {
    pub(crate) const fn new(registry: Registry) -> Self {
        Self { registry }
    }

    fn handle(&self, key: &metrics::Key) -> Arc<Handle> {
        Arc::new(Handle::new(key.clone(), self.registry.clone()))
    }
}

impl metrics::Recorder for RelayRecorder {
    fn describe_counter(
        &self,
        key_name: metrics::KeyName,
        _unit: Option<metrics::Unit>,
        _description: metrics::SharedString,
    ) {
        log::trace!("ignoring description of counter {}", key_name.as_str());
    }

    fn describe_gauge(
        &self,
        key_name: metrics::KeyName,
        _unit: Option<metrics::Unit>,
        _description: metrics::SharedString,
    ) {
        log::trace!("ignoring description of gauge {}", key_name.as_str());
    }

    fn describe_histogram(
        &self,
        key_name: metrics::KeyName,
        _unit: Option<metrics::Unit>,
        _description: metrics::SharedString,
    ) {
        log::trace!("ignoring description of histogram {}", key_name.as_str());
    }

    fn register_counter(
        &self,
        key: &metrics::Key,
        _meta: &metrics::Metadata<'_>,
    ) -> metrics::Counter {
        metrics::Counter::from_arc(self.handle(key))
    }

    fn register_gauge(&self, key: &metrics::Key, _meta: &metrics::Metadata<'_>) -> metrics::Gauge {
        metrics::Gauge::from_arc(self.handle(key))
    }

    fn register_histogram(
        &self,
        key: &metrics::Key,
        _meta: &metrics::Metadata<'_>,
    ) -> metrics::Histogram {
        metrics::Histogram::from_arc(self.handle(key))
    }
}

#[cfg(test)]
mod tests {
    use crate::{Metric, MetricRelay};
    use std::time::Duration;

    #[test]
    fn counters_feed_relay_registry() {
        let relay = MetricRelay::new("svc").unwrap();
        metrics::with_local_recorder(&relay.recorder(), || {
            metrics::counter!("requests", "route" => "/health").increment(2);
            metrics::counter!("requests", "route" => "/health").increment(3);
        });

        let counter = relay.get("requests").unwrap();
        let counter = counter.as_counter().unwrap();
        assert_eq!(counter.value(), 5.0);
        assert_eq!(counter.attributes()["route"], "/health");
    }

    #[test]
    fn gauges_set_and_adjust_counter_value() {
        let relay = MetricRelay::new("svc").unwrap();
        metrics::with_local_recorder(&relay.recorder(), || {
            let gauge = metrics::gauge!("queue_depth");
            gauge.set(10.0);
            gauge.decrement(4.0);
            gauge.increment(1.5);
        });

        assert_eq!(relay.get("queue_depth").unwrap().value(), 7.5);
    }

    #[test]
    fn histograms_record_latest_duration() {
        let relay = MetricRelay::new("svc").unwrap();
        metrics::with_local_recorder(&relay.recorder(), || {
            metrics::histogram!("latency").record(0.2);
            metrics::histogram!("latency").record(Duration::from_millis(40));
        });

        let Some(Metric::Timer(timer)) = relay.get("latency") else {
            panic!("expected a timer");
        };
        assert!((timer.value().as_secs_f64() - 0.04).abs() < 1e-9);
    }

    #[test]
    fn negative_histogram_sample_is_dropped() {
        let relay = MetricRelay::new("svc").unwrap();
        metrics::with_local_recorder(&relay.recorder(), || {
            metrics::histogram!("latency").record(-1.0);
        });

        assert!(!relay.contains("latency"));
    }

    #[test]
    fn counter_on_timer_name_is_ignored() {
        let relay = MetricRelay::new("svc").unwrap();
        relay.timer("work").unwrap();
        metrics::with_local_recorder(&relay.recorder(), || {
            metrics::counter!("work").increment(1);
        });

        assert!(relay.get("work").unwrap().as_timer().is_some());
    }
}

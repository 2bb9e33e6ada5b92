use crate::{
    error::{MetricsError, TimerUsageError},
    events::{Attributes, MetricRecord, MetricType},
    metric::{Counter, Metric, Timer, check_name},
};
use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

/// Named metrics shared between a relay, its timer handles and its
/// `metrics` recorder.
///
/// The lock is only taken inside synchronous methods, so it is never held
/// across an await point.
#[derive(Debug, Clone)]
pub(crate) struct Registry {
    service: Arc<str>,
    tags: Arc<[String]>,
    entries: Arc<Mutex<HashMap<String, Metric>>>,
}

impl Registry {
    pub(crate) fn new(service: &str, tags: Vec<String>) -> Self {
        Self {
            service: service.into(),
            tags: tags.into(),
            entries: Arc::default(),
        }
    }

    pub(crate) fn service(&self) -> &str {
        &self.service
    }

    pub(crate) fn tags(&self) -> &[String] {
        &self.tags
    }

    // Every mutation leaves the map consistent, so a poisoned lock is safe to reuse.
    fn lock(&self) -> MutexGuard<'_, HashMap<String, Metric>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn new_counter(&self, name: &str, attributes: Attributes) -> Counter {
        Counter::new(name, &*self.service)
            .with_attributes(attributes)
            .with_tags(self.tags.to_vec())
    }

    pub(crate) fn new_timer(&self, name: &str, attributes: Attributes) -> Timer {
        Timer::new(name, &*self.service)
            .with_attributes(attributes)
            .with_tags(self.tags.to_vec())
    }

    /// Applies `update` to the counter under `name`, creating a zeroed
    /// counter with `attributes` first if the name is unseen.
    fn update_counter(
        &self,
        name: &str,
        attributes: Attributes,
        update: impl FnOnce(&mut Counter),
    ) -> Result<f64, MetricsError> {
        check_name(name)?;
        let mut entries = self.lock();
        let metric = entries
            .entry(name.to_owned())
            .or_insert_with(|| self.new_counter(name, attributes).into());
        match metric {
            Metric::Counter(counter) => {
                update(counter);
                Ok(counter.value())
            }
            Metric::Timer(_) => Err(mismatch(name, MetricType::Counter, MetricType::Timer)),
        }
    }

    pub(crate) fn incr(
        &self,
        name: &str,
        delta: f64,
        attributes: Attributes,
    ) -> Result<f64, MetricsError> {
        self.update_counter(name, attributes, |counter| counter.increment(delta))
    }

    pub(crate) fn set_value(
        &self,
        name: &str,
        value: f64,
        attributes: Attributes,
    ) -> Result<f64, MetricsError> {
        self.update_counter(name, attributes, |counter| counter.set(value))
    }

    /// Runs `f` against the timer under `name`, creating one when
    /// `create_with` is given and the name is unseen.
    pub(crate) fn with_timer<R>(
        &self,
        name: &str,
        create_with: Option<Attributes>,
        f: impl FnOnce(&mut Timer) -> R,
    ) -> Result<R, MetricsError> {
        let mut entries = self.lock();
        if let Some(attributes) = create_with {
            check_name(name)?;
            entries
                .entry(name.to_owned())
                .or_insert_with(|| self.new_timer(name, attributes).into());
        }
        match entries.get_mut(name) {
            Some(Metric::Timer(timer)) => Ok(f(timer)),
            Some(Metric::Counter(_)) => {
                Err(mismatch(name, MetricType::Timer, MetricType::Counter))
            }
            None => Err(TimerUsageError::NotRegistered(name.to_owned()).into()),
        }
    }

    /// Inserts `metric`, returning whatever was previously stored under `name`.
    pub(crate) fn insert(
        &self,
        name: &str,
        metric: Metric,
    ) -> Result<Option<Metric>, MetricsError> {
        check_name(name)?;
        metric.validate()?;
        Ok(self.lock().insert(name.to_owned(), metric))
    }

    pub(crate) fn get(&self, name: &str) -> Option<Metric> {
        self.lock().get(name).cloned()
    }

    pub(crate) fn contains(&self, name: &str) -> bool {
        self.lock().contains_key(name)
    }

    pub(crate) fn len(&self) -> usize {
        self.lock().len()
    }

    pub(crate) fn names(&self) -> Vec<String> {
        self.lock().keys().cloned().collect()
    }

    /// Wire records for every entry, keyed by registry name.
    pub(crate) fn records(&self) -> Vec<(String, MetricRecord)> {
        self.lock()
            .iter()
            .map(|(name, metric)| (name.clone(), metric.to_record()))
            .collect()
    }
}

fn mismatch(name: &str, expected: MetricType, found: MetricType) -> MetricsError {
    MetricsError::TypeMismatch {
        name: name.to_owned(),
        expected: expected.as_str(),
        found: found.as_str(),
    }
}

use crate::events::{Attributes, MetricRecord, MetricType};

/// A named value that accumulates through increments.
#[derive(Debug, Clone, PartialEq)]
pub struct Counter {
    name: String,
    service: String,
    attributes: Attributes,
    tags: Vec<String>,
    value: f64,
}

impl Counter {
    pub fn new(name: impl Into<String>, service: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            service: service.into(),
            attributes: Attributes::new(),
            tags: Vec::new(),
            value: 0.0,
        }
    }

    #[must_use]
    pub fn with_value(mut self, value: f64) -> Self {
        self.value = value;
        self
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

    /// Adds `delta` to the value. Negative deltas decrement.
    pub fn increment(&mut self, delta: f64) {
        self.value += delta;
    }

    pub const fn set(&mut self, value: f64) {
        self.value = value;
    }

    pub const fn value(&self) -> f64 {
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
            self.value,
            MetricType::Counter,
            &self.tags,
        )
    }
}

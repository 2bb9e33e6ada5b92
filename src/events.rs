use crate::error::MetricsError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Caller supplied attributes attached to a metric.
pub type Attributes = BTreeMap<String, String>;

/// Attribute key reserved for the service name of the relay.
pub const SERVICE_ATTRIBUTE: &str = "service";

/// The kind of metric being sent.
///
/// Used by the collector to distinguish registered counters and timers
/// from one-off emitted events.
///
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MetricType {
    Counter,
    Timer,
    Event,
}

impl MetricType {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Counter => "counter",
            Self::Timer => "timer",
            Self::Event => "event",
        }
    }
}

/// A single datagram sent to the ffwd agent.
///
/// `attributes` always carries the `service` key; a caller attribute with
/// the same name is replaced when the record is built.
///
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MetricRecord {
    pub key: String,
    pub attributes: Attributes,
    pub value: f64,
    #[serde(rename = "type")]
    pub metric_type: MetricType,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl MetricRecord {
    pub(crate) fn new(
        key: &str,
        service: &str,
        attributes: &Attributes,
        value: f64,
        metric_type: MetricType,
        tags: &[String],
    ) -> Self {
        let mut attributes = attributes.clone();
        let shadowed = attributes.insert(SERVICE_ATTRIBUTE.to_owned(), service.to_owned());
        if let Some(shadowed) = shadowed.filter(|shadowed| shadowed != service) {
            log::debug!("attribute `service={shadowed}` on metric {key} replaced by {service}");
        }
        Self {
            key: key.to_owned(),
            attributes,
            value,
            metric_type,
            tags: tags.to_vec(),
        }
    }
}

impl TryFrom<&[u8]> for MetricRecord {
    type Error = MetricsError;

    fn try_from(buffer: &[u8]) -> Result<Self, Self::Error> {
        serde_json::from_slice(buffer).map_err(MetricsError::from)
    }
}

impl TryFrom<&MetricRecord> for Vec<u8> {
    type Error = MetricsError;

    // serde_json writes NaN and infinities as `null`, which ffwd rejects.
    fn try_from(record: &MetricRecord) -> Result<Self, Self::Error> {
        if !record.value.is_finite() {
            return Err(MetricsError::NonFiniteValue {
                key: record.key.clone(),
                value: record.value,
            });
        }
        serde_json::to_vec(record).map_err(MetricsError::from)
    }
}

use super::{MetricRelay, registry::Registry};
use crate::{
    error::MetricsError,
    transport::{FFWD_IP, FFWD_PORT, Transport, UdpTransport},
};

/// Configures a [`MetricRelay`].
#[derive(Debug, Clone)]
pub struct MetricRelayBuilder {
    service_name: String,
    ffwd_ip: String,
    ffwd_port: u16,
    tags: Vec<String>,
}

impl MetricRelayBuilder {
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            ffwd_ip: FFWD_IP.into(),
            ffwd_port: FFWD_PORT,
            tags: Vec::new(),
        }
    }

    /// Sets the host of the ffwd agent. Hostnames are resolved on every send.
    #[must_use]
    pub fn ffwd_ip(mut self, ffwd_ip: &str) -> Self {
        self.ffwd_ip = ffwd_ip.to_string();
        self
    }

    /// Sets the UDP port of the ffwd agent.
    #[must_use]
    pub const fn ffwd_port(mut self, ffwd_port: u16) -> Self {
        self.ffwd_port = ffwd_port;
        self
    }

    /// Tags attached to every metric the relay creates itself: implicit
    /// counters, timers from [`MetricRelay::timer`] and emitted events.
    #[must_use]
    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    fn validate(&self) -> Result<(), MetricsError> {
        if self.service_name.trim().is_empty() {
            return Err(MetricsError::Configuration(
                "service name must not be empty".into(),
            ));
        }
        if self.ffwd_ip.trim().is_empty() {
            return Err(MetricsError::Configuration(
                "ffwd address must not be empty".into(),
            ));
        }
        if self.ffwd_port == 0 {
            return Err(MetricsError::Configuration(
                "ffwd port must not be 0".into(),
            ));
        }
        Ok(())
    }

    /// Builds a relay that sends to the configured ffwd agent over UDP.
    /// No socket is opened until the first metric is sent.
    ///
    /// # Example
    /// ```
    /// use ffwd_relay::MetricRelayBuilder;
    /// let relay = MetricRelayBuilder::new("my-service")
    ///     .ffwd_port(19001)
    ///     .build()
    ///     .unwrap();
    /// assert_eq!(relay.ffwd_address(), ("127.0.0.1", 19001));
    /// ```
    ///
    /// # Errors
    /// Returns [`MetricsError::Configuration`] if the service name or the
    /// ffwd host is empty, or the port is 0.
    pub fn build(self) -> Result<MetricRelay, MetricsError> {
        let transport = UdpTransport::new(self.ffwd_ip.clone(), self.ffwd_port);
        self.build_with_transport(transport)
    }

    /// Builds a relay that hands its records to `transport` instead of UDP.
    ///
    /// # Errors
    /// Same as [`MetricRelayBuilder::build`].
    pub fn build_with_transport<T: Transport>(
        self,
        transport: T,
    ) -> Result<MetricRelay<T>, MetricsError> {
        self.validate()?;
        Ok(MetricRelay::from_parts(
            Registry::new(&self.service_name, self.tags),
            (self.ffwd_ip, self.ffwd_port),
            transport,
        ))
    }
}

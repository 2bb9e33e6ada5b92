#![warn(clippy::pedantic, clippy::nursery, clippy::cargo, clippy::perf)]

//! # `ffwd_relay`
//!
//! An in-process metrics relay for the [ffwd](https://github.com/spotify/ffwd) agent.
//!
//! Counters and timers are recorded synchronously into an in-memory registry owned by a
//! [`MetricRelay`]. Awaiting [`MetricRelay::flush`] sends every registered metric to the agent
//! as one JSON datagram over UDP, suspending only the calling task. One-off events bypass the
//! registry through [`MetricRelay::emit`].
//!
//! ```no_run
//! # async fn run() -> Result<(), ffwd_relay::MetricsError> {
//! let relay = ffwd_relay::MetricRelay::new("my-service")?;
//! relay.incr("requests", 1.0)?;
//!
//! let timer = relay.timer("db-query")?;
//! {
//!     let _span = timer.span()?;
//!     // timed work
//! }
//!
//! let report = relay.flush().await;
//! assert!(report.is_ok());
//! # Ok(())
//! # }
//! ```
//!
//! Delivery is best effort: nothing is acknowledged or retried, and a failed send only affects
//! the metric it carried.
//!
//! Code instrumented with the `metrics` crate can feed the same registry through
//! [`MetricRelay::install_recorder`].

mod error;
mod events;
mod metric;
mod recorder;
mod relay;
mod transport;

pub use error::{MetricsError, SendFailure, TimerUsageError};
pub use events::{Attributes, MetricRecord, MetricType, SERVICE_ATTRIBUTE};
pub use metric::{Counter, Metric, Timer, TimerSpan};
pub use recorder::RelayRecorder;
pub use relay::{FlushReport, MetricRelay, MetricRelayBuilder, TimerGuard, TimerHandle};
pub use transport::{FFWD_IP, FFWD_PORT, Transport, UdpTransport};

//! This example records a few metrics into a `MetricRelay` and sends them to a local ffwd agent.
//!
//! Counters are bumped directly and through the `metrics` facade, a database call is timed with a
//! scoped span, and a one-off deploy event is emitted. A background task flushes the registry every
//! second; a final flush runs before exit.
//!
//! Run an ffwd agent (or `nc -ul 19000`) to see the datagrams.

use ffwd_relay::{Attributes, MetricRelay};
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let relay = MetricRelay::builder("demo-service").tags(["demo"]).build()?;
    relay.install_recorder()?;

    let flusher = relay.spawn_flusher(Duration::from_secs(1))?;

    let query_timer = relay.timer_with(
        "db-query",
        Attributes::from([("table".into(), "users".into())]),
    )?;
    for request in 0..5 {
        relay.incr("requests", 1.0)?;
        metrics::counter!("facade_requests", "kind" => "demo").increment(1);

        query_timer
            .time(tokio::time::sleep(Duration::from_millis(20 * request)))
            .await?;
        tokio::time::sleep(Duration::from_millis(400)).await;
    }

    if let Err(e) = relay.emit("deploy", 1.0).await {
        eprintln!("Failed to emit deploy event: {e}");
    }

    flusher.abort();
    let report = relay.flush().await;
    println!(
        "Sent {} of {} metrics to {:?}.",
        report.sent(),
        report.attempted,
        relay.ffwd_address()
    );
    Ok(())
}

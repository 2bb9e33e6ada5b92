use ffwd_relay::{Attributes, Counter, MetricRecord, MetricRelay, MetricType};
use std::time::Duration;
use tokio::{net::UdpSocket, time::timeout};

async fn collector() -> (UdpSocket, u16) {
    let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let port = socket.local_addr().unwrap().port();
    (socket, port)
}

async fn receive(socket: &UdpSocket) -> MetricRecord {
    let mut buf = vec![0u8; 65_536];
    let (len, _) = timeout(Duration::from_secs(2), socket.recv_from(&mut buf))
        .await
        .expect("datagram within timeout")
        .unwrap();
    MetricRecord::try_from(&buf[..len]).unwrap()
}

#[tokio::test]
async fn flush_delivers_one_datagram_per_metric() {
    let (socket, port) = collector().await;
    let relay = MetricRelay::builder("checkout")
        .ffwd_port(port)
        .tags(["canary"])
        .build()
        .unwrap();
    relay.incr("orders", 3.0).unwrap();
    relay
        .set_counter(
            "refunds",
            Counter::new("refunds", "checkout")
                .with_value(1.0)
                .with_attributes(Attributes::from([("currency".into(), "EUR".into())])),
        )
        .unwrap();
    let timer = relay.timer("payment").unwrap();
    drop(timer.span().unwrap());

    let report = relay.flush().await;
    assert!(report.is_ok());
    assert_eq!(report.attempted, 3);

    let mut records = vec![
        receive(&socket).await,
        receive(&socket).await,
        receive(&socket).await,
    ];
    records.sort_by(|a, b| a.key.cmp(&b.key));

    assert_eq!(records[0].key, "orders");
    assert_eq!(records[0].value, 3.0);
    assert_eq!(records[0].metric_type, MetricType::Counter);
    assert_eq!(records[0].tags, ["canary"]);

    assert_eq!(records[1].key, "payment");
    assert_eq!(records[1].metric_type, MetricType::Timer);
    assert!(records[1].value >= 0.0);

    assert_eq!(records[2].key, "refunds");
    assert_eq!(records[2].attributes["currency"], "EUR");
    assert!(records[2].tags.is_empty());

    for record in &records {
        assert_eq!(record.attributes["service"], "checkout");
    }
}

#[tokio::test]
async fn flush_twice_resends_accumulated_values() {
    let (socket, port) = collector().await;
    let relay = MetricRelay::builder("svc").ffwd_port(port).build().unwrap();

    relay.incr("hits", 1.0).unwrap();
    relay.flush().await;
    assert_eq!(receive(&socket).await.value, 1.0);

    relay.incr("hits", 1.0).unwrap();
    relay.flush().await;
    assert_eq!(receive(&socket).await.value, 2.0);
    assert!(relay.contains("hits"));
}

#[tokio::test]
async fn emit_sends_event_without_registering() {
    let (socket, port) = collector().await;
    let relay = MetricRelay::builder("svc").ffwd_port(port).build().unwrap();

    relay
        .emit_with(
            "deploy",
            42.0,
            Attributes::from([("attr1".into(), "val1".into())]),
        )
        .await
        .unwrap();

    let record = receive(&socket).await;
    assert_eq!(record.key, "deploy");
    assert_eq!(record.metric_type, MetricType::Event);
    assert_eq!(record.value, 42.0);
    assert_eq!(record.attributes["attr1"], "val1");
    assert!(relay.is_empty());
}

#[tokio::test]
async fn timer_span_over_await_is_sent_in_seconds() {
    let (socket, port) = collector().await;
    let relay = MetricRelay::builder("svc").ffwd_port(port).build().unwrap();
    let timer = relay.timer("span").unwrap();

    let outcome: Result<(), &str> = timer
        .time(async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            Err("downstream failed")
        })
        .await
        .unwrap();
    assert!(outcome.is_err());

    relay.flush().await;
    let record = receive(&socket).await;
    assert!((0.05..0.5).contains(&record.value), "sent {}", record.value);
}

#[tokio::test]
async fn unreachable_host_fails_every_metric_without_aborting() {
    let relay = MetricRelay::builder("svc")
        .ffwd_ip("collector.invalid")
        .build()
        .unwrap();
    for name in ["a", "b", "c"] {
        relay.incr(name, 1.0).unwrap();
    }

    let report = relay.flush().await;

    assert_eq!(report.attempted, 3);
    assert_eq!(report.failures.len(), 3);
    assert!(relay.emit("event", 1.0).await.is_err());
}

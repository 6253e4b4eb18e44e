//! End-to-end pipeline tests over the in-process broker

use std::sync::Arc;
use std::time::Duration;

use syspulse::actors::{PublisherHandle, SubscriberHandle};
use syspulse::collector::SnapshotCollector;
use syspulse::config::{Config, read_config_file};
use syspulse::journal::EventJournal;
use syspulse::transport::{Broker, LoopbackTransport, Transport};

use super::helpers::{encode, make_telemetry, wait_for_journal};

const TOPIC: &str = "syspulse/telemetry";

#[tokio::test]
async fn snapshot_flows_from_collector_to_journal() {
    let dir = tempfile::tempdir().unwrap();
    let journal_path = dir.path().join("events.log");

    let broker = Broker::new();
    let subscriber_transport = LoopbackTransport::connect("it-sub", &broker);
    let messages = subscriber_transport.subscribe(TOPIC).await.unwrap();
    let journal = EventJournal::open(&journal_path).await.unwrap();
    let (subscriber, subscriber_task) = SubscriberHandle::spawn(messages, journal, false);

    let config = Config {
        max_processes: 5,
        ..Config::default()
    };
    let collector = SnapshotCollector::new(&config);
    let publisher_transport: Arc<dyn Transport> =
        Arc::new(LoopbackTransport::connect("it-pub", &broker));
    let (publisher, publisher_task) = PublisherHandle::spawn(
        collector,
        publisher_transport,
        TOPIC.to_string(),
        Duration::from_secs(60),
    );

    publisher.publish_now().await.unwrap();

    let contents =
        wait_for_journal(&journal_path, |c| c.contains("--- snapshot from")).await;
    assert!(contents.contains("--- snapshot from"));
    assert!(contents.contains("gauges: cpu"));

    publisher.shutdown().await.unwrap();
    subscriber.shutdown().await.unwrap();
    publisher_task.await.unwrap();
    subscriber_task.await.unwrap();
}

#[tokio::test]
async fn snapshots_are_journaled_in_delivery_order() {
    let dir = tempfile::tempdir().unwrap();
    let journal_path = dir.path().join("events.log");

    let broker = Broker::new();
    let subscriber_transport = LoopbackTransport::connect("it-sub", &broker);
    let messages = subscriber_transport.subscribe(TOPIC).await.unwrap();
    let journal = EventJournal::open(&journal_path).await.unwrap();
    let (subscriber, subscriber_task) = SubscriberHandle::spawn(messages, journal, false);

    let publisher_transport = LoopbackTransport::connect("it-pub", &broker);
    publisher_transport
        .publish(TOPIC, encode(&make_telemetry("alpha")))
        .await
        .unwrap();
    publisher_transport
        .publish(TOPIC, encode(&make_telemetry("beta")))
        .await
        .unwrap();

    let contents = wait_for_journal(&journal_path, |c| c.contains("beta")).await;
    let alpha = contents.find("alpha").unwrap();
    let beta = contents.find("beta").unwrap();
    assert!(alpha < beta);

    subscriber.shutdown().await.unwrap();
    subscriber_task.await.unwrap();
}

#[tokio::test]
async fn duplicate_deliveries_append_duplicate_entries() {
    // at-least-once: duplicates from the transport are acceptable and
    // simply appear twice in the trail
    let dir = tempfile::tempdir().unwrap();
    let journal_path = dir.path().join("events.log");

    let broker = Broker::new();
    let subscriber_transport = LoopbackTransport::connect("it-sub", &broker);
    let messages = subscriber_transport.subscribe(TOPIC).await.unwrap();
    let journal = EventJournal::open(&journal_path).await.unwrap();
    let (subscriber, subscriber_task) = SubscriberHandle::spawn(messages, journal, false);

    let publisher_transport = LoopbackTransport::connect("it-pub", &broker);
    let payload = encode(&make_telemetry("twin"));
    publisher_transport.publish(TOPIC, payload.clone()).await.unwrap();
    publisher_transport.publish(TOPIC, payload).await.unwrap();

    let contents =
        wait_for_journal(&journal_path, |c| c.matches("--- snapshot from").count() == 2).await;
    assert_eq!(contents.matches("--- snapshot from twin").count(), 2);

    subscriber.shutdown().await.unwrap();
    subscriber_task.await.unwrap();
}

#[tokio::test]
async fn config_file_round_trips_through_loader() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(
        &path,
        r#"{"topic": "fleet/telemetry", "interval_secs": 5, "max_processes": 12}"#,
    )
    .unwrap();

    let config = read_config_file(path.to_str().unwrap()).unwrap();

    assert_eq!(config.topic, "fleet/telemetry");
    assert_eq!(config.interval(), Duration::from_secs(5));
    assert_eq!(config.max_processes(), 12);
}

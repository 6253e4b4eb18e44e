//! Failure-path tests: every failure below is survivable except the
//! initial transport connection.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use assert_matches::assert_matches;
use async_trait::async_trait;
use syspulse::actors::{PublisherHandle, SubscriberHandle};
use syspulse::collector::SnapshotCollector;
use syspulse::config::Config;
use syspulse::journal::EventJournal;
use syspulse::transport::{
    Broker, LoopbackTransport, MqttTransport, Transport, TransportError, TransportResult,
};
use tokio::sync::mpsc;

use super::helpers::{encode, make_telemetry, wait_for_journal};

const TOPIC: &str = "syspulse/telemetry";

/// Rejects the first `failures` publishes, then delegates to a loopback
/// connection.
struct FlakyTransport {
    inner: LoopbackTransport,
    failures: usize,
    attempts: AtomicUsize,
}

impl FlakyTransport {
    fn new(broker: &Broker, failures: usize) -> Self {
        Self {
            inner: LoopbackTransport::connect("flaky", broker),
            failures,
            attempts: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl Transport for FlakyTransport {
    async fn publish(&self, topic: &str, payload: Vec<u8>) -> TransportResult<()> {
        if self.attempts.fetch_add(1, Ordering::SeqCst) < self.failures {
            return Err(TransportError::PublishRejected(String::from(
                "broker unavailable",
            )));
        }
        self.inner.publish(topic, payload).await
    }

    async fn subscribe(&self, topic: &str) -> TransportResult<mpsc::Receiver<Vec<u8>>> {
        self.inner.subscribe(topic).await
    }

    async fn disconnect(&self, grace: Duration) -> TransportResult<()> {
        self.inner.disconnect(grace).await
    }
}

#[tokio::test]
async fn publisher_outlives_rejected_publishes() {
    let broker = Broker::new();
    let subscriber_transport = LoopbackTransport::connect("it-sub", &broker);
    let mut messages = subscriber_transport.subscribe(TOPIC).await.unwrap();

    let config = Config {
        max_processes: 2,
        ..Config::default()
    };
    let transport = Arc::new(FlakyTransport::new(&broker, 2));
    let (publisher, publisher_task) = PublisherHandle::spawn(
        SnapshotCollector::new(&config),
        transport,
        TOPIC.to_string(),
        Duration::from_secs(60),
    );

    // the first two cycles fail, the loop keeps going
    assert!(publisher.publish_now().await.is_err());
    assert!(publisher.publish_now().await.is_err());
    publisher.publish_now().await.unwrap();

    let payload = tokio::time::timeout(Duration::from_secs(1), messages.recv())
        .await
        .unwrap()
        .unwrap();
    assert!(!payload.is_empty());

    publisher.shutdown().await.unwrap();
    publisher_task.await.unwrap();
}

#[tokio::test]
async fn undecodable_message_does_not_block_later_ones() {
    let dir = tempfile::tempdir().unwrap();
    let journal_path = dir.path().join("events.log");

    let broker = Broker::new();
    let subscriber_transport = LoopbackTransport::connect("it-sub", &broker);
    let messages = subscriber_transport.subscribe(TOPIC).await.unwrap();
    let journal = EventJournal::open(&journal_path).await.unwrap();
    let (subscriber, subscriber_task) = SubscriberHandle::spawn(messages, journal, false);

    let publisher_transport = LoopbackTransport::connect("it-pub", &broker);
    publisher_transport
        .publish(TOPIC, b"{ truncated garbage".to_vec())
        .await
        .unwrap();
    publisher_transport
        .publish(TOPIC, encode(&make_telemetry("after-garbage")))
        .await
        .unwrap();

    let contents = wait_for_journal(&journal_path, |c| c.contains("after-garbage")).await;
    assert!(contents.contains("after-garbage"));
    assert_eq!(contents.matches("--- snapshot from").count(), 1);

    subscriber.shutdown().await.unwrap();
    subscriber_task.await.unwrap();
}

#[tokio::test]
async fn failed_adapters_leave_other_fields_intact() {
    // nonexistent critical files are the simulated failing adapter; the
    // rest of the snapshot is still populated
    let config = Config {
        max_processes: 5,
        critical_files: vec![
            PathBuf::from("/definitely/missing/one"),
            PathBuf::from("/definitely/missing/two"),
        ],
        ..Config::default()
    };
    let mut collector = SnapshotCollector::new(&config);

    let telemetry = collector.collect();

    assert!(telemetry.critical_files.is_empty());
    assert!(telemetry.timestamp > 0);
    assert!(!telemetry.system.hostname.is_empty());
    assert!(telemetry.system.cpu_count > 0);
    assert!(telemetry.hardware.memory_percent > 0.0);
    assert!(!telemetry.processes.is_empty());
}

#[tokio::test]
async fn initial_connection_failure_is_an_error() {
    // nothing listens on port 1; both loops would refuse to start
    let result = MqttTransport::connect("it-fatal", "127.0.0.1", 1).await;

    assert_matches!(result, Err(TransportError::ConnectionFailed(_)));
}

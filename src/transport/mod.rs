//! Pub/sub transport seam.
//!
//! The pipeline is agnostic to the wire protocol underneath: it needs
//! at-least-once delivery of opaque payloads to named topics, nothing
//! more. Implementations:
//!
//! - [`mqtt::MqttTransport`] — an MQTT broker connection (QoS 1)
//! - [`memory::LoopbackTransport`] — an in-process broker, for tests and
//!   single-process runs
//!
//! Connecting is constructor-shaped and per-implementation; each loop
//! owns its own connection under its own client identity. A failed
//! initial connection is the one error callers treat as fatal.

pub mod error;
pub mod memory;
pub mod mqtt;

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;

pub use error::{TransportError, TransportResult};
pub use memory::{Broker, LoopbackTransport};
pub use mqtt::MqttTransport;

#[async_trait]
pub trait Transport: Send + Sync {
    /// Hand one payload to the broker under at-least-once semantics.
    async fn publish(&self, topic: &str, payload: Vec<u8>) -> TransportResult<()>;

    /// Register interest in a topic. Payloads arrive on the returned
    /// channel in delivery order; duplicates are possible.
    async fn subscribe(&self, topic: &str) -> TransportResult<mpsc::Receiver<Vec<u8>>>;

    /// Tear the connection down, allowing in-flight work the given grace.
    async fn disconnect(&self, grace: Duration) -> TransportResult<()>;
}

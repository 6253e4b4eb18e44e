//! In-process loopback transport.
//!
//! A [`Broker`] is a shared topic registry over tokio broadcast channels;
//! every [`LoopbackTransport`] attached to the same broker sees every
//! publish. Used by the test suite and by `--loopback` runs where both
//! loops live in one process and no external broker exists.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::error::TransportResult;
use super::Transport;

const CHANNEL_CAPACITY: usize = 64;

/// Topic registry shared by every loopback connection attached to it.
#[derive(Clone, Default)]
pub struct Broker {
    topics: Arc<Mutex<HashMap<String, broadcast::Sender<Vec<u8>>>>>,
}

impl Broker {
    pub fn new() -> Self {
        Self::default()
    }

    fn sender(&self, topic: &str) -> broadcast::Sender<Vec<u8>> {
        let mut topics = self.topics.lock().expect("topic registry poisoned");
        topics
            .entry(topic.to_string())
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .clone()
    }
}

pub struct LoopbackTransport {
    identity: String,
    broker: Broker,
    bridges: Mutex<Vec<JoinHandle<()>>>,
}

impl LoopbackTransport {
    pub fn connect(identity: &str, broker: &Broker) -> Self {
        debug!("loopback transport attached as {identity}");
        Self {
            identity: identity.to_string(),
            broker: broker.clone(),
            bridges: Mutex::new(Vec::new()),
        }
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }
}

#[async_trait]
impl Transport for LoopbackTransport {
    async fn publish(&self, topic: &str, payload: Vec<u8>) -> TransportResult<()> {
        // no subscribers yet is fine, the broker just drops the payload
        let _ = self.broker.sender(topic).send(payload);
        Ok(())
    }

    async fn subscribe(&self, topic: &str) -> TransportResult<mpsc::Receiver<Vec<u8>>> {
        let mut source = self.broker.sender(topic).subscribe();
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);

        let bridge = tokio::spawn(async move {
            loop {
                match source.recv().await {
                    Ok(payload) => {
                        if tx.send(payload).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!("loopback subscriber lagged, skipped {skipped} messages");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });
        self.bridges
            .lock()
            .expect("bridge list poisoned")
            .push(bridge);

        Ok(rx)
    }

    async fn disconnect(&self, _grace: Duration) -> TransportResult<()> {
        for bridge in self
            .bridges
            .lock()
            .expect("bridge list poisoned")
            .drain(..)
        {
            bridge.abort();
        }
        Ok(())
    }
}

//! MQTT transport over rumqttc.
//!
//! One `AsyncClient` per connection; a background driver task polls the
//! event loop, which is where QoS 1 acknowledgements and retransmissions
//! are handled. Incoming publishes are fanned out to the subscription
//! channels registered through [`Transport::subscribe`].

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use rumqttc::{AsyncClient, Event, EventLoop, Incoming, MqttOptions, QoS};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{timeout, timeout_at};
use tracing::{debug, trace, warn};

use super::error::{TransportError, TransportResult};
use super::Transport;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const CHANNEL_CAPACITY: usize = 64;

type SubscriptionList = Arc<Mutex<Vec<(String, mpsc::Sender<Vec<u8>>)>>>;

#[derive(Debug)]
pub struct MqttTransport {
    client: AsyncClient,
    subscriptions: SubscriptionList,
    driver: Mutex<Option<JoinHandle<()>>>,
}

impl MqttTransport {
    /// Establish one broker connection under the given client identity,
    /// waiting for the broker's acknowledgement. Callers treat a failure
    /// here as fatal.
    pub async fn connect(identity: &str, host: &str, port: u16) -> TransportResult<Self> {
        let mut options = MqttOptions::new(identity, host, port);
        options.set_keep_alive(Duration::from_secs(30));

        let (client, mut eventloop) = AsyncClient::new(options, CHANNEL_CAPACITY);

        wait_for_connack(&mut eventloop).await?;
        debug!("connected to {host}:{port} as {identity}");

        let subscriptions: SubscriptionList = Arc::default();
        let driver = tokio::spawn(drive(eventloop, Arc::clone(&subscriptions)));

        Ok(Self {
            client,
            subscriptions,
            driver: Mutex::new(Some(driver)),
        })
    }
}

async fn wait_for_connack(eventloop: &mut EventLoop) -> TransportResult<()> {
    let deadline = tokio::time::Instant::now() + CONNECT_TIMEOUT;
    loop {
        let event = timeout_at(deadline, eventloop.poll())
            .await
            .map_err(|_| {
                TransportError::ConnectionFailed(format!(
                    "no acknowledgement within {CONNECT_TIMEOUT:?}"
                ))
            })?
            .map_err(|e| TransportError::ConnectionFailed(e.to_string()))?;

        match event {
            Event::Incoming(Incoming::ConnAck(_)) => return Ok(()),
            other => trace!("ignoring pre-connack event: {other:?}"),
        }
    }
}

async fn drive(mut eventloop: EventLoop, subscriptions: SubscriptionList) {
    loop {
        match eventloop.poll().await {
            Ok(Event::Incoming(Incoming::Publish(publish))) => {
                dispatch(&subscriptions, &publish.topic, publish.payload.to_vec()).await;
            }
            Ok(_) => {}
            Err(e) => {
                // the next poll reconnects; in-flight QoS 1 messages are
                // retransmitted by the protocol
                warn!("transport connection error: {e}");
                tokio::time::sleep(Duration::from_secs(1)).await;
            }
        }
    }
}

async fn dispatch(subscriptions: &SubscriptionList, topic: &str, payload: Vec<u8>) {
    let senders: Vec<mpsc::Sender<Vec<u8>>> = {
        let subs = subscriptions.lock().expect("subscription registry poisoned");
        subs.iter()
            .filter(|(subscribed, _)| subscribed == topic)
            .map(|(_, tx)| tx.clone())
            .collect()
    };

    for sender in senders {
        if sender.send(payload.clone()).await.is_err() {
            trace!("dropping payload for closed subscriber on {topic}");
        }
    }
}

#[async_trait]
impl Transport for MqttTransport {
    async fn publish(&self, topic: &str, payload: Vec<u8>) -> TransportResult<()> {
        self.client
            .publish(topic, QoS::AtLeastOnce, false, payload)
            .await
            .map_err(|e| TransportError::PublishRejected(e.to_string()))
    }

    async fn subscribe(&self, topic: &str) -> TransportResult<mpsc::Receiver<Vec<u8>>> {
        self.client
            .subscribe(topic, QoS::AtLeastOnce)
            .await
            .map_err(|e| TransportError::SubscribeFailed(e.to_string()))?;

        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        self.subscriptions
            .lock()
            .expect("subscription registry poisoned")
            .push((topic.to_string(), tx));

        Ok(rx)
    }

    async fn disconnect(&self, grace: Duration) -> TransportResult<()> {
        let result = timeout(grace, self.client.disconnect()).await;

        if let Some(driver) = self
            .driver
            .lock()
            .expect("driver handle poisoned")
            .take()
        {
            driver.abort();
        }

        match result {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(TransportError::DisconnectFailed(e.to_string())),
            Err(_) => {
                warn!("disconnect grace period elapsed, dropping connection");
                Ok(())
            }
        }
    }
}

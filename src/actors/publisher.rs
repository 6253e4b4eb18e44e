//! PublisherActor - assembles and publishes snapshots on a fixed period
//!
//! Each tick runs one cycle: assemble a snapshot, encode it, hand it to
//! the transport. A failed cycle is logged and the next tick proceeds
//! independently; nothing short of shutdown stops the loop. The command
//! channel is checked between cycles, which is what keeps shutdown
//! responsive even with a slow transport.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{Instant, interval_at};
use tracing::{debug, error, instrument, trace, warn};

use crate::collector::SnapshotCollector;
use crate::transport::Transport;

use super::messages::PublisherCommand;

pub struct PublisherActor {
    collector: SnapshotCollector,

    transport: Arc<dyn Transport>,

    /// Topic snapshots are published to
    topic: String,

    /// Command receiver for control messages
    command_rx: mpsc::Receiver<PublisherCommand>,

    /// Current collection period
    interval_duration: Duration,
}

impl PublisherActor {
    pub fn new(
        collector: SnapshotCollector,
        transport: Arc<dyn Transport>,
        topic: String,
        interval_duration: Duration,
        command_rx: mpsc::Receiver<PublisherCommand>,
    ) -> Self {
        Self {
            collector,
            transport,
            topic,
            command_rx,
            interval_duration,
        }
    }

    /// Run the actor's main loop until a Shutdown command arrives or the
    /// command channel closes.
    #[instrument(skip(self), fields(topic = %self.topic))]
    pub async fn run(mut self) {
        debug!("starting publisher actor");

        // first cycle one period after start; ticks and commands stay
        // deterministic relative to each other
        let mut ticker = interval_at(
            Instant::now() + self.interval_duration,
            self.interval_duration,
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(e) = self.cycle().await {
                        error!("collection cycle failed: {e:#}");
                    }
                }

                Some(cmd) = self.command_rx.recv() => {
                    match cmd {
                        PublisherCommand::PublishNow { respond_to } => {
                            debug!("received PublishNow command");
                            let result = self.cycle().await;
                            let _ = respond_to.send(result);
                        }

                        PublisherCommand::UpdateInterval { interval_secs } => {
                            debug!("updating interval to {interval_secs}s");
                            self.interval_duration = Duration::from_secs(interval_secs);
                            ticker = interval_at(
                                Instant::now() + self.interval_duration,
                                self.interval_duration,
                            );
                        }

                        PublisherCommand::Shutdown => {
                            debug!("received shutdown command");
                            break;
                        }
                    }
                }

                else => {
                    warn!("command channel closed, shutting down");
                    break;
                }
            }
        }

        debug!("publisher actor stopped");
    }

    /// One cycle: assemble, encode, publish with at-least-once delivery.
    /// Errors here are cycle-local; the caller logs and carries on.
    async fn cycle(&mut self) -> Result<()> {
        let snapshot = self.collector.collect();
        trace!("assembled snapshot at {}", snapshot.timestamp);

        let payload = serde_json::to_vec(&snapshot).context("failed to encode snapshot")?;

        self.transport
            .publish(&self.topic, payload)
            .await
            .context("failed to publish snapshot")?;

        trace!("published snapshot to {}", self.topic);

        Ok(())
    }
}

/// Handle for controlling a PublisherActor
///
/// Can be cloned and shared across tasks.
#[derive(Clone)]
pub struct PublisherHandle {
    sender: mpsc::Sender<PublisherCommand>,
}

impl PublisherHandle {
    /// Spawn the actor as a tokio task, returning the handle and the join
    /// handle so the caller can await the loop on shutdown.
    pub fn spawn(
        collector: SnapshotCollector,
        transport: Arc<dyn Transport>,
        topic: String,
        interval_duration: Duration,
    ) -> (Self, JoinHandle<()>) {
        let (cmd_tx, cmd_rx) = mpsc::channel(32);

        let actor = PublisherActor::new(collector, transport, topic, interval_duration, cmd_rx);
        let task = tokio::spawn(actor.run());

        (Self { sender: cmd_tx }, task)
    }

    /// Trigger an immediate cycle, bypassing the interval timer.
    pub async fn publish_now(&self) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(PublisherCommand::PublishNow { respond_to: tx })
            .await
            .context("failed to send PublishNow command")?;

        rx.await.context("failed to receive response")??;
        Ok(())
    }

    /// Update the collection period
    pub async fn update_interval(&self, interval_secs: u64) -> Result<()> {
        self.sender
            .send(PublisherCommand::UpdateInterval { interval_secs })
            .await
            .context("failed to send UpdateInterval command")?;
        Ok(())
    }

    /// Gracefully shut down the publisher
    pub async fn shutdown(&self) -> Result<()> {
        self.sender
            .send(PublisherCommand::Shutdown)
            .await
            .context("failed to send Shutdown command")?;
        Ok(())
    }
}

//! SubscriberActor - consumes snapshots from the transport
//!
//! For every delivered payload: decode, append the event trail, render
//! the report. A payload that does not decode is logged and discarded;
//! it never stops the loop. Messages are handled strictly one at a time,
//! so event-trail blocks cannot interleave.

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, instrument, trace, warn};

use crate::SystemTelemetry;
use crate::format;
use crate::journal::EventJournal;

use super::messages::SubscriberCommand;

pub struct SubscriberActor {
    /// Payloads as delivered by the transport, in delivery order
    messages: mpsc::Receiver<Vec<u8>>,

    journal: EventJournal,

    /// Render the full report to stdout for each snapshot
    print_reports: bool,

    /// Command receiver for control messages
    command_rx: mpsc::Receiver<SubscriberCommand>,
}

impl SubscriberActor {
    pub fn new(
        messages: mpsc::Receiver<Vec<u8>>,
        journal: EventJournal,
        print_reports: bool,
        command_rx: mpsc::Receiver<SubscriberCommand>,
    ) -> Self {
        Self {
            messages,
            journal,
            print_reports,
            command_rx,
        }
    }

    /// Run the actor's main loop until a Shutdown command arrives or the
    /// delivery channel closes.
    #[instrument(skip(self))]
    pub async fn run(mut self) {
        debug!("starting subscriber actor");

        loop {
            tokio::select! {
                message = self.messages.recv() => {
                    match message {
                        Some(payload) => self.handle_message(&payload).await,
                        None => {
                            warn!("delivery channel closed, shutting down");
                            break;
                        }
                    }
                }

                Some(cmd) = self.command_rx.recv() => {
                    match cmd {
                        SubscriberCommand::Shutdown => {
                            debug!("received shutdown command");
                            break;
                        }
                    }
                }

                else => break,
            }
        }

        debug!("subscriber actor stopped");
    }

    async fn handle_message(&mut self, payload: &[u8]) {
        let telemetry: SystemTelemetry = match serde_json::from_slice(payload) {
            Ok(telemetry) => telemetry,
            Err(e) => {
                error!("discarding undecodable snapshot ({} bytes): {e}", payload.len());
                return;
            }
        };

        trace!("received snapshot from {}", telemetry.system.hostname);

        if let Err(e) = self.journal.append(&telemetry).await {
            error!("failed to append event journal: {e}");
        }

        if self.print_reports {
            println!("{}", format::render_report(&telemetry));
        }
    }
}

/// Handle for controlling a SubscriberActor
#[derive(Clone)]
pub struct SubscriberHandle {
    sender: mpsc::Sender<SubscriberCommand>,
}

impl SubscriberHandle {
    /// Spawn the actor as a tokio task, returning the handle and the join
    /// handle so the caller can await the loop on shutdown.
    pub fn spawn(
        messages: mpsc::Receiver<Vec<u8>>,
        journal: EventJournal,
        print_reports: bool,
    ) -> (Self, JoinHandle<()>) {
        let (cmd_tx, cmd_rx) = mpsc::channel(32);

        let actor = SubscriberActor::new(messages, journal, print_reports, cmd_rx);
        let task = tokio::spawn(actor.run());

        (Self { sender: cmd_tx }, task)
    }

    /// Gracefully shut down the subscriber
    pub async fn shutdown(&self) -> Result<()> {
        self.sender
            .send(SubscriberCommand::Shutdown)
            .await
            .context("failed to send Shutdown command")?;
        Ok(())
    }
}

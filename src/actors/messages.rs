//! Command types for actor control channels.

use tokio::sync::oneshot;

/// Commands that can be sent to a PublisherActor
#[derive(Debug)]
pub enum PublisherCommand {
    /// Trigger an immediate collect-and-publish cycle (bypassing the
    /// interval timer). Used by tests and manual refreshes.
    PublishNow {
        /// Channel to send the result back
        respond_to: oneshot::Sender<anyhow::Result<()>>,
    },

    /// Update the collection period
    ///
    /// The new period takes effect immediately.
    UpdateInterval {
        /// New period in seconds
        interval_secs: u64,
    },

    /// Gracefully shut down the publisher
    ///
    /// The actor finishes any in-flight cycle and then exits.
    Shutdown,
}

/// Commands that can be sent to a SubscriberActor
#[derive(Debug)]
pub enum SubscriberCommand {
    /// Gracefully shut down the subscriber
    Shutdown,
}

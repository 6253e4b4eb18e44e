//! Error types for transport operations

use std::fmt;

/// Result type alias for transport operations
pub type TransportResult<T> = Result<T, TransportError>;

/// Errors that can occur during transport operations
#[derive(Debug)]
pub enum TransportError {
    /// The initial connection could not be established
    ConnectionFailed(String),

    /// The broker rejected (or the connection dropped during) a publish
    PublishRejected(String),

    /// The subscription could not be registered
    SubscribeFailed(String),

    /// Tearing down the connection failed
    DisconnectFailed(String),
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::ConnectionFailed(msg) => {
                write!(f, "failed to connect to broker: {}", msg)
            }
            TransportError::PublishRejected(msg) => write!(f, "publish rejected: {}", msg),
            TransportError::SubscribeFailed(msg) => write!(f, "subscribe failed: {}", msg),
            TransportError::DisconnectFailed(msg) => write!(f, "disconnect failed: {}", msg),
        }
    }
}

impl std::error::Error for TransportError {}

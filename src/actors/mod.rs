//! The two long-lived loops of the pipeline.
//!
//! Each actor runs as an independent async task and is controlled through
//! an mpsc command channel wrapped by a cloneable handle.
//!
//! ## Message Flow
//!
//! ```text
//! Timer tick → Assemble snapshot → Encode → publish(topic)
//!                                              │
//!                                          transport
//!                                              │
//!                  deliver → Decode → Event trail + rendered report
//! ```
//!
//! The publisher owns the snapshot collector and one transport
//! connection; the subscriber owns a second connection, the event
//! journal and the report output. They share nothing but read-only
//! configuration. A single shutdown signal stops both: the binary sends
//! `Shutdown` to each handle and joins both tasks before tearing the
//! connections down.

pub mod messages;
pub mod publisher;
pub mod subscriber;

pub use publisher::PublisherHandle;
pub use subscriber::SubscriberHandle;

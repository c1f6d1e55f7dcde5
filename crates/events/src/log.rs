//! Event-log abstraction (mechanics only).
//!
//! The broker is modeled as an abstract partitioned log carrying opaque
//! UTF-8 message values. Delivery is at-least-once; consumers must tolerate
//! duplicates. Subscriptions start at the newest offset: values published
//! before `subscribe` are not replayed.

use thiserror::Error;
use tokio::sync::mpsc;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EventLogError {
    #[error("broker connection error: {0}")]
    Connection(String),

    #[error("broker command error: {0}")]
    Command(String),

    #[error("event serialization error: {0}")]
    Serialization(String),
}

/// A live subscription to an event log.
///
/// The channel is fed by the log implementation (an in-process fan-out or a
/// background reader thread). When the log side goes away `recv` yields
/// `None`.
#[derive(Debug)]
pub struct Subscription {
    receiver: mpsc::UnboundedReceiver<String>,
}

impl Subscription {
    pub fn new(receiver: mpsc::UnboundedReceiver<String>) -> Self {
        Self { receiver }
    }

    /// Wait for the next message value.
    pub async fn recv(&mut self) -> Option<String> {
        self.receiver.recv().await
    }

    /// Non-blocking receive, for synchronous call sites and tests.
    pub fn try_recv(&mut self) -> Result<String, mpsc::error::TryRecvError> {
        self.receiver.try_recv()
    }
}

/// Append-only message log with newest-offset subscriptions.
pub trait EventLog: Send + Sync {
    /// Append one message value to the log.
    fn publish(&self, value: String) -> Result<(), EventLogError>;

    /// Start consuming from the newest offset.
    fn subscribe(&self) -> Subscription;
}

impl<L> EventLog for std::sync::Arc<L>
where
    L: EventLog + ?Sized,
{
    fn publish(&self, value: String) -> Result<(), EventLogError> {
        (**self).publish(value)
    }

    fn subscribe(&self) -> Subscription {
        (**self).subscribe()
    }
}

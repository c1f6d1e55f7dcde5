//! In-memory event log for tests/dev.

use std::sync::Mutex;

use tokio::sync::mpsc;

use crate::log::{EventLog, EventLogError, Subscription};

/// In-process fan-out log.
///
/// - No IO
/// - Best-effort fan-out to live subscribers
/// - Newest-offset semantics: no replay of earlier values
#[derive(Debug, Default)]
pub struct InMemoryEventLog {
    subscribers: Mutex<Vec<mpsc::UnboundedSender<String>>>,
}

impl InMemoryEventLog {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EventLog for InMemoryEventLog {
    fn publish(&self, value: String) -> Result<(), EventLogError> {
        let mut subs = self
            .subscribers
            .lock()
            .map_err(|_| EventLogError::Command("subscriber lock poisoned".to_string()))?;

        // Drop any dead subscribers while publishing.
        subs.retain(|tx| tx.send(value.clone()).is_ok());

        Ok(())
    }

    fn subscribe(&self) -> Subscription {
        let (tx, rx) = mpsc::unbounded_channel();

        if let Ok(mut subs) = self.subscribers.lock() {
            subs.push(tx);
        }

        Subscription::new(rx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fan_out_reaches_every_subscriber() {
        let log = InMemoryEventLog::new();
        let mut a = log.subscribe();
        let mut b = log.subscribe();

        log.publish("one".to_string()).unwrap();

        assert_eq!(a.try_recv().unwrap(), "one");
        assert_eq!(b.try_recv().unwrap(), "one");
    }

    #[test]
    fn late_subscribers_start_at_the_newest_offset() {
        let log = InMemoryEventLog::new();
        log.publish("early".to_string()).unwrap();

        let mut sub = log.subscribe();
        assert!(sub.try_recv().is_err());

        log.publish("late".to_string()).unwrap();
        assert_eq!(sub.try_recv().unwrap(), "late");
    }

    #[test]
    fn dropped_subscribers_do_not_break_publish() {
        let log = InMemoryEventLog::new();
        let sub = log.subscribe();
        drop(sub);

        log.publish("after-drop".to_string()).unwrap();
    }
}

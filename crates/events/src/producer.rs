//! Producer facet consumed by the edge orchestrator.
//!
//! The orchestrator holds one `Arc<dyn EventProducer>`; when broker wiring
//! fails at startup it holds a [`NullProducer`] instead, so emission is a
//! no-op rather than a crash.

use std::sync::Arc;

use crate::event::AuditEvent;
use crate::in_memory::InMemoryEventLog;
use crate::log::{EventLog, EventLogError};
use crate::redis_streams::RedisStreamsEventLog;

/// Object-safe audit-event submission.
pub trait EventProducer: Send + Sync {
    fn send(&self, event: &AuditEvent) -> Result<(), EventLogError>;
}

impl<P> EventProducer for Arc<P>
where
    P: EventProducer + ?Sized,
{
    fn send(&self, event: &AuditEvent) -> Result<(), EventLogError> {
        (**self).send(event)
    }
}

/// Null-object producer: accepts every event and drops it.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullProducer;

impl EventProducer for NullProducer {
    fn send(&self, _event: &AuditEvent) -> Result<(), EventLogError> {
        Ok(())
    }
}

impl EventProducer for InMemoryEventLog {
    fn send(&self, event: &AuditEvent) -> Result<(), EventLogError> {
        self.publish(event.to_wire()?)
    }
}

impl EventProducer for RedisStreamsEventLog {
    fn send(&self, event: &AuditEvent) -> Result<(), EventLogError> {
        self.publish(event.to_wire()?)
    }
}

#[cfg(test)]
mod tests {
    use taskloom_core::UserId;

    use crate::event::{AuditAction, AuditStatus};

    use super::*;

    fn sample() -> AuditEvent {
        AuditEvent::now(
            UserId::new(1),
            "alice",
            AuditAction::CreateTask,
            "Task created: id=1, name=t1",
            AuditStatus::Success,
        )
    }

    #[test]
    fn null_producer_swallows_everything() {
        assert!(NullProducer.send(&sample()).is_ok());
    }

    #[test]
    fn in_memory_log_delivers_wire_json() {
        let log = InMemoryEventLog::new();
        let mut sub = log.subscribe();

        log.send(&sample()).unwrap();

        let value = sub.try_recv().unwrap();
        let parsed: AuditEvent = serde_json::from_str(&value).unwrap();
        assert_eq!(parsed.action, AuditAction::CreateTask);
        assert_eq!(parsed.user_id, UserId::new(1));
    }
}

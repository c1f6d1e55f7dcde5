//! `taskloom-events` — audit events and the partitioned-log abstraction.
//!
//! This crate defines mechanics, not business logic. Events are immutable,
//! delivered at-least-once, and ordered only within one stream.

pub mod event;
pub mod in_memory;
pub mod log;
pub mod producer;
pub mod redis_streams;

pub use event::{AuditAction, AuditEvent, AuditStatus};
pub use in_memory::InMemoryEventLog;
pub use log::{EventLog, EventLogError, Subscription};
pub use producer::{EventProducer, NullProducer};
pub use redis_streams::RedisStreamsEventLog;

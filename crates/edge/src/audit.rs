//! Fire-and-forget audit emission.
//!
//! The HTTP response for a mutation is decided before the event is submitted;
//! submission runs on its own blocking task and failures are logged, never
//! propagated.

use std::sync::Arc;

use taskloom_events::{AuditEvent, EventProducer};

pub fn emit(producer: &Arc<dyn EventProducer>, event: AuditEvent) {
    let producer = producer.clone();
    tokio::task::spawn_blocking(move || {
        if let Err(e) = producer.send(&event) {
            tracing::warn!(
                action = event.action.as_str(),
                error = %e,
                "audit event emission failed"
            );
        }
    });
}

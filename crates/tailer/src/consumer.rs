//! The single-threaded cooperative consume loop.

use std::future::Future;

use taskloom_events::Subscription;

use crate::sink::FileSink;

/// Drain the subscription into the sink until `shutdown` resolves.
///
/// Write failures are logged and the loop continues; only shutdown or a
/// closed subscription ends it. Returns the sink with every accepted message
/// flushed.
pub async fn consume<F>(mut sub: Subscription, mut sink: FileSink, shutdown: F) -> FileSink
where
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            value = sub.recv() => {
                match value {
                    Some(value) => {
                        tracing::info!(event = %value, "received event");
                        if let Err(e) = sink.append(&value) {
                            tracing::error!(error = %e, "failed to write event");
                        }
                    }
                    None => {
                        tracing::warn!("event subscription closed");
                        return sink;
                    }
                }
            }
            _ = &mut shutdown => {
                tracing::info!("shutting down consumer");
                return sink;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use taskloom_events::{EventLog, InMemoryEventLog};

    use super::*;

    #[tokio::test]
    async fn drains_messages_until_shutdown() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.log");
        let sink = FileSink::open(&path).unwrap();

        let log = Arc::new(InMemoryEventLog::new());
        let sub = log.subscribe();

        let (tx, rx) = tokio::sync::oneshot::channel::<()>();
        let handle = tokio::spawn(consume(sub, sink, async {
            let _ = rx.await;
        }));

        log.publish("one".to_string()).unwrap();
        log.publish("two".to_string()).unwrap();

        // Let the loop drain, then stop it.
        tokio::time::sleep(Duration::from_millis(100)).await;
        tx.send(()).unwrap();
        handle.await.unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "one\ntwo\n");
    }

    #[tokio::test]
    async fn closed_subscription_ends_the_loop() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.log");
        let sink = FileSink::open(&path).unwrap();

        let log = InMemoryEventLog::new();
        let sub = log.subscribe();
        drop(log);

        // Never-resolving shutdown; the closed channel must end the loop.
        let sink = tokio::time::timeout(
            Duration::from_secs(2),
            consume(sub, sink, std::future::pending()),
        )
        .await
        .expect("loop did not end on closed subscription");
        drop(sink);
    }

    #[tokio::test]
    async fn messages_published_before_shutdown_are_not_lost() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.log");
        let sink = FileSink::open(&path).unwrap();

        let log = Arc::new(InMemoryEventLog::new());
        let sub = log.subscribe();
        log.publish("buffered".to_string()).unwrap();

        let (tx, rx) = tokio::sync::oneshot::channel::<()>();
        let handle = tokio::spawn(consume(sub, sink, async {
            let _ = rx.await;
        }));

        tokio::time::sleep(Duration::from_millis(100)).await;
        tx.send(()).unwrap();
        handle.await.unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "buffered\n");
    }
}

//! Redis Streams-backed event log.
//!
//! The partitioned log is carried on a single stream key: `XADD` appends,
//! a blocking `XREAD` starting at `$` consumes from the newest offset.
//! Delivery is at-least-once; the stream preserves append order.

use std::sync::Arc;
use std::time::Duration;

use redis::streams::{StreamReadOptions, StreamReadReply};
use redis::Commands;
use tokio::sync::mpsc;
use tracing::warn;

use crate::log::{EventLog, EventLogError, Subscription};

/// How long one blocking read waits before re-polling (keeps the reader
/// responsive to subscriber drops).
const READ_BLOCK_MS: usize = 1_000;

/// Max entries fetched per read.
const READ_COUNT: usize = 64;

/// Backoff after a consumer-side failure.
const RETRY_DELAY: Duration = Duration::from_secs(1);

#[derive(Debug, Clone)]
pub struct RedisStreamsEventLog {
    client: Arc<redis::Client>,
    stream_key: String,
}

impl RedisStreamsEventLog {
    /// Create a log over the given broker URL and stream key.
    ///
    /// Fails only on an unparseable URL; an unreachable broker surfaces per
    /// operation so a producer can keep running while the broker is down.
    pub fn new(broker_url: &str, stream_key: impl Into<String>) -> Result<Self, EventLogError> {
        let client = redis::Client::open(broker_url)
            .map_err(|e| EventLogError::Connection(e.to_string()))?;

        Ok(Self {
            client: Arc::new(client),
            stream_key: stream_key.into(),
        })
    }
}

impl EventLog for RedisStreamsEventLog {
    fn publish(&self, value: String) -> Result<(), EventLogError> {
        let mut conn = self
            .client
            .get_connection_with_timeout(Duration::from_secs(2))
            .map_err(|e| EventLogError::Connection(e.to_string()))?;

        let _: String = conn
            .xadd(&self.stream_key, "*", &[("value", value.as_str())])
            .map_err(|e| EventLogError::Command(e.to_string()))?;

        Ok(())
    }

    fn subscribe(&self) -> Subscription {
        let (tx, rx) = mpsc::unbounded_channel();
        let client = self.client.clone();
        let stream_key = self.stream_key.clone();

        // Blocking reader thread; failures are logged and retried, never
        // allowed to end the loop. The thread exits when the subscriber side
        // of the channel is dropped.
        std::thread::spawn(move || {
            // "$" = newest offset; replaced by concrete entry ids as we read.
            let mut last_id = "$".to_string();

            'reconnect: loop {
                if tx.is_closed() {
                    return;
                }

                let mut conn = match client.get_connection() {
                    Ok(conn) => conn,
                    Err(e) => {
                        warn!(error = %e, "event log connection failed, retrying");
                        std::thread::sleep(RETRY_DELAY);
                        continue;
                    }
                };

                loop {
                    if tx.is_closed() {
                        return;
                    }

                    let opts = StreamReadOptions::default()
                        .block(READ_BLOCK_MS)
                        .count(READ_COUNT);
                    let reply: Option<StreamReadReply> =
                        match conn.xread_options(&[&stream_key], &[&last_id], &opts) {
                            Ok(reply) => reply,
                            Err(e) => {
                                warn!(error = %e, "event log read failed, retrying");
                                std::thread::sleep(RETRY_DELAY);
                                continue 'reconnect;
                            }
                        };

                    let Some(reply) = reply else {
                        // Blocking read timed out with no new entries.
                        continue;
                    };

                    for stream in reply.keys {
                        for entry in stream.ids {
                            last_id = entry.id.clone();
                            let Some(redis::Value::Data(bytes)) = entry.map.get("value") else {
                                continue;
                            };
                            let value = String::from_utf8_lossy(bytes).into_owned();
                            if tx.send(value).is_err() {
                                return;
                            }
                        }
                    }
                }
            }
        });

        Subscription::new(rx)
    }
}

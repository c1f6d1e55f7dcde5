//! `taskloom-tailer` — the log-tailing consumer.
//!
//! Drains the audit-event topic from the newest offset and appends each
//! message value as one line to an append-only file. Delivery is
//! at-least-once; the file is a lossy shadow of the store and may diverge
//! from it on producer-side emission failures.

pub mod config;
pub mod consumer;
pub mod sink;

pub use config::{ensure_log_dir, TailerConfig};
pub use consumer::consume;
pub use sink::FileSink;

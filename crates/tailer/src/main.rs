use taskloom_events::{EventLog, RedisStreamsEventLog};
use taskloom_tailer::{consume, ensure_log_dir, FileSink, TailerConfig};

#[tokio::main]
async fn main() {
    taskloom_observability::init();

    let config = TailerConfig::from_env();

    if let Err(e) = ensure_log_dir(&config.log_file) {
        tracing::error!(error = %e, "failed to create log directory");
        std::process::exit(1);
    }

    let sink = match FileSink::open(&config.log_file) {
        Ok(sink) => sink,
        Err(e) => {
            tracing::error!(error = %e, path = %config.log_file.display(), "failed to open log file");
            std::process::exit(1);
        }
    };

    tracing::info!(
        broker = %config.broker_url,
        topic = %config.topic,
        "event tailer starting"
    );

    let log = match RedisStreamsEventLog::new(&config.broker_url, &config.topic) {
        Ok(log) => log,
        Err(e) => {
            tracing::error!(error = %e, "failed to create event log consumer");
            std::process::exit(1);
        }
    };
    let sub = log.subscribe();

    tracing::info!("event tailer started, waiting for messages");

    consume(sub, sink, shutdown_signal()).await;
}

/// Resolves on SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        let mut terminate = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler");
        tokio::select! {
            _ = ctrl_c => {}
            _ = terminate.recv() => {}
        }
    }

    #[cfg(not(unix))]
    {
        let _ = ctrl_c.await;
    }
}

use std::sync::Arc;

use taskloom_auth::TokenIssuer;
use taskloom_edge::{build_app, EdgeConfig, EdgeServices, HttpStoreClient};
use taskloom_events::{EventProducer, NullProducer, RedisStreamsEventLog};

#[tokio::main]
async fn main() {
    taskloom_observability::init();

    let config = match EdgeConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "invalid configuration");
            std::process::exit(1);
        }
    };

    // A broken broker is a valid steady state: degrade to the null producer
    // and keep serving.
    let producer: Arc<dyn EventProducer> =
        match RedisStreamsEventLog::new(&config.broker_url, &config.event_topic) {
            Ok(log) => Arc::new(log),
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    "event producer initialization failed; events will not be recorded"
                );
                Arc::new(NullProducer)
            }
        };

    let services = Arc::new(EdgeServices::new(
        Arc::new(HttpStoreClient::new(config.store_url.clone())),
        producer,
        TokenIssuer::new(config.token_secret.as_bytes()),
    ));

    let app = build_app(services);

    let listener = tokio::net::TcpListener::bind(&config.addr)
        .await
        .expect("failed to bind edge address");

    tracing::info!("edge service listening on {}", listener.local_addr().unwrap());

    axum::serve(listener, app).await.unwrap();
}

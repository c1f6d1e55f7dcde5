use std::sync::Arc;
use std::time::Duration;

use taskloom_store::{build_app, PgRepository, StoreConfig};

#[tokio::main]
async fn main() {
    taskloom_observability::init();

    let config = StoreConfig::from_env();
    tracing::info!(
        host = %config.db_host,
        user = %config.db_user,
        db = %config.db_name,
        "connecting to database"
    );

    let repo = match PgRepository::connect(config.connect_options(), 30, Duration::from_secs(2))
        .await
    {
        Ok(repo) => repo,
        Err(e) => {
            tracing::error!(error = %e, "could not connect to database");
            std::process::exit(1);
        }
    };

    if let Err(e) = repo.ensure_schema().await {
        tracing::error!(error = %e, "schema bootstrap failed");
        std::process::exit(1);
    }

    let app = build_app(Arc::new(repo));

    let listener = tokio::net::TcpListener::bind(&config.addr)
        .await
        .expect("failed to bind store address");

    tracing::info!("store service listening on {}", listener.local_addr().unwrap());

    axum::serve(listener, app).await.unwrap();
}

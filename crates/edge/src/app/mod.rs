//! HTTP API application wiring (axum router + service wiring).
//!
//! Layout:
//! - `routes/`: handlers, one file per area (auth, tasks, collections)
//! - `dto.rs`: request/response DTOs
//! - `errors.rs`: consistent JSON error responses

use std::sync::Arc;

use axum::http::{header, Method, StatusCode};
use axum::routing::{get, post};
use axum::{Extension, Router};
use tower_http::cors::{Any, CorsLayer};

use taskloom_auth::{TokenIssuer, DEFAULT_COST};
use taskloom_events::EventProducer;

use crate::client::StoreClient;
use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;

/// Process-wide collaborators of the edge service.
///
/// The producer is a capability, not a connection: when broker wiring fails
/// at startup this holds a `NullProducer` and the service keeps running.
pub struct EdgeServices {
    pub store: Arc<dyn StoreClient>,
    pub producer: Arc<dyn EventProducer>,
    pub tokens: TokenIssuer,
    pub password_cost: u32,
}

impl EdgeServices {
    pub fn new(
        store: Arc<dyn StoreClient>,
        producer: Arc<dyn EventProducer>,
        tokens: TokenIssuer,
    ) -> Self {
        Self {
            store,
            producer,
            tokens,
            password_cost: DEFAULT_COST,
        }
    }

    /// Lower the hashing work factor (tests).
    pub fn with_password_cost(mut self, cost: u32) -> Self {
        self.password_cost = cost;
        self
    }
}

/// Build the full HTTP router (public entrypoint used by `main.rs` and the
/// black-box tests).
pub fn build_app(services: Arc<EdgeServices>) -> Router {
    let auth_state = middleware::AuthState {
        tokens: services.tokens.clone(),
    };

    // Protected routes: principal required.
    let protected = routes::protected_router().layer(axum::middleware::from_fn_with_state(
        auth_state,
        middleware::auth_gate,
    ));

    // CORS is the outermost layer so preflight never reaches AuthGate.
    Router::new()
        .route("/health", get(health))
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login))
        .merge(protected)
        .layer(Extension(services))
        .layer(cors_layer())
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

async fn health() -> (StatusCode, &'static str) {
    (StatusCode::OK, "API Service is healthy")
}

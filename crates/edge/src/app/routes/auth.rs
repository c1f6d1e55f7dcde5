//! Registration and login. These live outside AuthGate.
//!
//! Security invariant: the responses for "unknown user" and "wrong password"
//! are byte-identical; the distinction only appears in server logs.

use std::sync::Arc;

use axum::extract::Extension;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

use taskloom_auth::password::{self, PasswordError};
use taskloom_auth::MAX_PASSWORD_BYTES;
use taskloom_core::model::validate_username;

use crate::app::errors::json_error;
use crate::app::{dto, EdgeServices};
use crate::client::StoreClientError;

const MIN_USERNAME_CHARS: usize = 3;
const MIN_PASSWORD_CHARS: usize = 8;

pub async fn register(
    Extension(services): Extension<Arc<EdgeServices>>,
    Json(body): Json<dto::RegisterRequest>,
) -> axum::response::Response {
    if body.username.is_empty() || body.password.is_empty() {
        return json_error(
            StatusCode::BAD_REQUEST,
            "validation_error",
            "Username and Password are required",
        );
    }
    if body.username.len() < MIN_USERNAME_CHARS {
        return json_error(
            StatusCode::BAD_REQUEST,
            "validation_error",
            format!("Username must be at least {MIN_USERNAME_CHARS} characters long"),
        );
    }
    if let Err(e) = validate_username(&body.username) {
        return json_error(StatusCode::BAD_REQUEST, "validation_error", e.to_string());
    }
    if body.password.len() < MIN_PASSWORD_CHARS {
        return json_error(
            StatusCode::BAD_REQUEST,
            "validation_error",
            format!("Password must be at least {MIN_PASSWORD_CHARS} characters long"),
        );
    }

    // Hashing blocks for ~400 ms at the default cost; keep it off the
    // async workers.
    let cost = services.password_cost;
    let password = body.password.clone();
    let digest =
        match tokio::task::spawn_blocking(move || password::hash_with_cost(&password, cost)).await
        {
            Ok(Ok(digest)) => digest,
            Ok(Err(PasswordError::TooLong)) => {
                return json_error(
                    StatusCode::BAD_REQUEST,
                    "validation_error",
                    format!("Password must be at most {MAX_PASSWORD_BYTES} bytes"),
                )
            }
            Ok(Err(e)) => {
                tracing::error!(error = %e, "password hashing failed");
                return json_error(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "hash_error",
                    "Failed to hash password",
                );
            }
            Err(e) => {
                tracing::error!(error = %e, "password hashing task failed");
                return json_error(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "hash_error",
                    "Failed to hash password",
                );
            }
        };

    let user = match services.store.create_user(&body.username, &digest).await {
        Ok(user) => user,
        Err(StoreClientError::Conflict) => {
            return json_error(StatusCode::CONFLICT, "conflict", "Username already exists")
        }
        Err(e) => {
            tracing::error!(error = %e, "user creation failed");
            return json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "store_error",
                "Failed to create user",
            );
        }
    };

    match services.tokens.issue(user.id, &user.username) {
        Ok(token) => (
            StatusCode::CREATED,
            Json(dto::AuthResponse {
                token,
                username: user.username,
                user_id: user.id,
            }),
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "token issuance failed");
            json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "token_error",
                "Failed to generate token",
            )
        }
    }
}

pub async fn login(
    Extension(services): Extension<Arc<EdgeServices>>,
    Json(body): Json<dto::LoginRequest>,
) -> axum::response::Response {
    if body.username.is_empty() || body.password.is_empty() {
        return json_error(
            StatusCode::BAD_REQUEST,
            "validation_error",
            "Username and Password are required",
        );
    }

    let user = match services.store.user_by_username(&body.username).await {
        Ok(user) => user,
        Err(StoreClientError::NotFound) => {
            tracing::debug!(username = %body.username, "login failed: unknown username");
            return invalid_credentials();
        }
        Err(e) => {
            tracing::error!(error = %e, "user lookup failed");
            return json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "store_error",
                "Failed to get user",
            );
        }
    };

    let Some(digest) = user.password_hash.clone() else {
        tracing::error!(username = %user.username, "user record is missing its digest");
        return json_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "store_error",
            "Failed to get user",
        );
    };

    let password = body.password.clone();
    let verified = matches!(
        tokio::task::spawn_blocking(move || password::verify(&password, &digest)).await,
        Ok(true)
    );
    if !verified {
        tracing::debug!(username = %user.username, "login failed: wrong password");
        return invalid_credentials();
    }

    match services.tokens.issue(user.id, &user.username) {
        Ok(token) => (
            StatusCode::OK,
            Json(dto::AuthResponse {
                token,
                username: user.username,
                user_id: user.id,
            }),
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "token issuance failed");
            json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "token_error",
                "Failed to generate token",
            )
        }
    }
}

/// The one response body both login failure modes share.
fn invalid_credentials() -> axum::response::Response {
    json_error(
        StatusCode::UNAUTHORIZED,
        "unauthorized",
        "Invalid username or password",
    )
}

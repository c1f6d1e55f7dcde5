//! AuthGate: bearer-token middleware in front of every per-principal route.
//!
//! `OPTIONS` preflight never reaches this middleware; the CORS layer sits
//! outside it and answers preflight directly.

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};

use taskloom_auth::TokenIssuer;

use crate::app::errors::json_error;
use crate::context::PrincipalContext;

#[derive(Clone)]
pub struct AuthState {
    pub tokens: TokenIssuer,
}

pub async fn auth_gate(
    State(state): State<AuthState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Result<Response, Response> {
    let token = extract_bearer(req.headers())?;

    let claims = state.tokens.validate(token).map_err(|_| {
        json_error(
            StatusCode::UNAUTHORIZED,
            "unauthorized",
            "Invalid or expired token",
        )
    })?;

    req.extensions_mut()
        .insert(PrincipalContext::new(claims.user_id, claims.username));

    Ok(next.run(req).await)
}

fn extract_bearer(headers: &HeaderMap) -> Result<&str, Response> {
    let header = headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or_else(|| {
            json_error(
                StatusCode::UNAUTHORIZED,
                "unauthorized",
                "Authorization header required",
            )
        })?;

    let header = header.to_str().map_err(|_| malformed_header())?;

    // Exactly two space-separated parts with the literal Bearer prefix.
    let parts: Vec<&str> = header.split(' ').collect();
    if parts.len() != 2 || parts[0] != "Bearer" || parts[1].is_empty() {
        return Err(malformed_header());
    }

    Ok(parts[1])
}

fn malformed_header() -> Response {
    json_error(
        StatusCode::UNAUTHORIZED,
        "unauthorized",
        "Invalid authorization header format. Expected: Bearer <token>",
    )
}

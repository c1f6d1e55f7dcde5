use axum::http::StatusCode;
use axum::Extension;

use crate::app::errors::json_error;
use crate::context::PrincipalContext;

/// Single accessor for the per-request principal.
///
/// Absent (or mistyped) context yields the unauthorized response; handlers
/// never look at extensions directly.
pub fn require_principal(
    principal: Option<Extension<PrincipalContext>>,
) -> Result<PrincipalContext, axum::response::Response> {
    match principal {
        Some(Extension(principal)) => Ok(principal),
        None => Err(json_error(
            StatusCode::UNAUTHORIZED,
            "unauthorized",
            "Unauthorized",
        )),
    }
}

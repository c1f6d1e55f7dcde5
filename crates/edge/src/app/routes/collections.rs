//! Collection handlers. Collection operations carry no audit events.

use std::sync::Arc;

use axum::extract::{Extension, Path};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

use taskloom_core::model::{
    validate_collection_name, DEFAULT_COLLECTION_COLOR, DEFAULT_COLLECTION_ICON,
};
use taskloom_core::CollectionId;

use crate::app::errors::json_error;
use crate::app::routes::common::require_principal;
use crate::app::{dto, EdgeServices};
use crate::client::{CreateCollection, StoreClientError};
use crate::context::PrincipalContext;

pub async fn create_collection(
    Extension(services): Extension<Arc<EdgeServices>>,
    principal: Option<Extension<PrincipalContext>>,
    Json(body): Json<dto::CreateCollectionRequest>,
) -> axum::response::Response {
    let principal = match require_principal(principal) {
        Ok(principal) => principal,
        Err(response) => return response,
    };

    if body.name.is_empty() {
        return json_error(StatusCode::BAD_REQUEST, "validation_error", "Name is required");
    }
    if let Err(e) = validate_collection_name(&body.name) {
        return json_error(StatusCode::BAD_REQUEST, "validation_error", e.to_string());
    }

    let new = CreateCollection {
        name: body.name,
        color: body
            .color
            .unwrap_or_else(|| DEFAULT_COLLECTION_COLOR.to_string()),
        icon: body
            .icon
            .unwrap_or_else(|| DEFAULT_COLLECTION_ICON.to_string()),
    };

    match services
        .store
        .create_collection(principal.user_id(), new)
        .await
    {
        Ok(collection) => (StatusCode::CREATED, Json(collection)).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "collection creation failed");
            json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "store_error",
                "Failed to create collection",
            )
        }
    }
}

pub async fn list_collections(
    Extension(services): Extension<Arc<EdgeServices>>,
    principal: Option<Extension<PrincipalContext>>,
) -> axum::response::Response {
    let principal = match require_principal(principal) {
        Ok(principal) => principal,
        Err(response) => return response,
    };

    match services.store.list_collections(principal.user_id()).await {
        Ok(collections) => (StatusCode::OK, Json(collections)).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "collection listing failed");
            json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "store_error",
                "Failed to get collections",
            )
        }
    }
}

pub async fn delete_collection(
    Extension(services): Extension<Arc<EdgeServices>>,
    principal: Option<Extension<PrincipalContext>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let principal = match require_principal(principal) {
        Ok(principal) => principal,
        Err(response) => return response,
    };

    let id: CollectionId = match id.parse() {
        Ok(id) => id,
        Err(_) => {
            return json_error(StatusCode::BAD_REQUEST, "invalid_id", "Invalid collection ID")
        }
    };

    match services
        .store
        .delete_collection(id, principal.user_id())
        .await
    {
        Ok(()) => (
            StatusCode::OK,
            Json(serde_json::json!({ "message": "Collection deleted successfully" })),
        )
            .into_response(),
        Err(StoreClientError::NotFoundOrForbidden) => json_error(
            StatusCode::FORBIDDEN,
            "forbidden",
            "Collection not found or forbidden",
        ),
        Err(e) => {
            tracing::error!(error = %e, "collection deletion failed");
            json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "store_error",
                "Failed to delete collection",
            )
        }
    }
}

pub async fn tasks_in_collection(
    Extension(services): Extension<Arc<EdgeServices>>,
    principal: Option<Extension<PrincipalContext>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let principal = match require_principal(principal) {
        Ok(principal) => principal,
        Err(response) => return response,
    };

    let id: CollectionId = match id.parse() {
        Ok(id) => id,
        Err(_) => {
            return json_error(StatusCode::BAD_REQUEST, "invalid_id", "Invalid collection ID")
        }
    };

    match services
        .store
        .tasks_in_collection(id, principal.user_id())
        .await
    {
        Ok(tasks) => (StatusCode::OK, Json(tasks)).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "collection task listing failed");
            json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "store_error",
                "Failed to get tasks",
            )
        }
    }
}

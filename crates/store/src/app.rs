//! HTTP surface of the persistence service (internal, port 8080).
//!
//! Every task/collection route takes `?user_id=<int>`; the repository applies
//! it to every predicate. The `/user/*` routes are the credential surface:
//! `create` strips the digest from its response, the lookup includes it.

use std::sync::Arc;

use axum::extract::{Extension, Path, Query};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use serde::Deserialize;

use taskloom_core::model::{
    validate_collection_name, validate_task_name, validate_username, DEFAULT_COLLECTION_COLOR,
    DEFAULT_COLLECTION_ICON,
};
use taskloom_core::{CollectionId, TaskId, UserId};

use crate::error::StoreError;
use crate::repository::{NewCollection, NewTask, Repository, TaskFilter};

/// Build the full store router (public entrypoint used by `main.rs` and the
/// black-box tests).
pub fn build_app(repo: Arc<dyn Repository>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/user/create", post(create_user))
        .route("/user/:key", get(get_user))
        .route("/create", post(create_task))
        .route("/get", get(list_tasks))
        .route("/tasks", get(list_tasks))
        .route("/delete/:id", delete(delete_task))
        .route("/complete/:id", put(complete_task).post(complete_task))
        .route("/getbyid/:id", get(task_by_id))
        .route("/getbyname/:name", get(task_by_name))
        .route("/collections", post(create_collection).get(list_collections))
        .route("/collections/:id", delete(delete_collection))
        .route("/collections/:id/tasks", get(tasks_in_collection))
        .layer(Extension(repo))
}

async fn health() -> StatusCode {
    StatusCode::OK
}

#[derive(Debug, Deserialize)]
struct OwnerQuery {
    user_id: i64,
}

impl OwnerQuery {
    fn owner(&self) -> UserId {
        UserId::new(self.user_id)
    }
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    user_id: i64,
    complete: Option<bool>,
}

// Missing fields deserialize to their empty defaults so the handlers can
// answer with their own 400s instead of a framework rejection.

#[derive(Debug, Deserialize)]
struct CreateUserRequest {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password_hash: String,
}

#[derive(Debug, Deserialize)]
struct CreateTaskRequest {
    #[serde(default)]
    name: String,
    #[serde(default)]
    text: String,
    collection_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct CreateCollectionRequest {
    #[serde(default)]
    name: String,
    color: Option<String>,
    icon: Option<String>,
}

async fn create_user(
    Extension(repo): Extension<Arc<dyn Repository>>,
    Json(body): Json<CreateUserRequest>,
) -> axum::response::Response {
    if body.username.is_empty() || body.password_hash.is_empty() {
        return json_error(
            StatusCode::BAD_REQUEST,
            "validation_error",
            "Username and password_hash are required",
        );
    }
    if let Err(e) = validate_username(&body.username) {
        return json_error(StatusCode::BAD_REQUEST, "validation_error", e.to_string());
    }

    match repo.create_user(&body.username, &body.password_hash).await {
        Ok(user) => (StatusCode::CREATED, Json(user)).into_response(),
        Err(e) => store_error_to_response(e),
    }
}

async fn get_user(
    Extension(repo): Extension<Arc<dyn Repository>>,
    Path(key): Path<String>,
) -> axum::response::Response {
    // The lookup surface serves both by-id and by-username; an all-digits key
    // is an id, anything else a username.
    let result = match key.parse::<i64>() {
        Ok(id) => repo.user_by_id(UserId::new(id)).await,
        Err(_) => repo.user_by_username(&key).await,
    };

    match result {
        Ok(user) => (StatusCode::OK, Json(user)).into_response(),
        Err(StoreError::NotFound) => {
            json_error(StatusCode::NOT_FOUND, "not_found", "User not found")
        }
        Err(e) => store_error_to_response(e),
    }
}

async fn create_task(
    Extension(repo): Extension<Arc<dyn Repository>>,
    Query(scope): Query<OwnerQuery>,
    Json(body): Json<CreateTaskRequest>,
) -> axum::response::Response {
    if let Err(e) = validate_task_name(&body.name) {
        return json_error(StatusCode::BAD_REQUEST, "validation_error", e.to_string());
    }

    let new = NewTask {
        name: body.name,
        text: body.text,
        collection_id: body.collection_id.map(CollectionId::new),
    };

    match repo.create_task(scope.owner(), new).await {
        Ok(task) => (StatusCode::CREATED, Json(task)).into_response(),
        Err(e) => store_error_to_response(e),
    }
}

async fn list_tasks(
    Extension(repo): Extension<Arc<dyn Repository>>,
    Query(query): Query<ListQuery>,
) -> axum::response::Response {
    let filter = TaskFilter::from(query.complete);

    match repo.list_tasks(UserId::new(query.user_id), filter).await {
        Ok(tasks) => (StatusCode::OK, Json(tasks)).into_response(),
        Err(e) => store_error_to_response(e),
    }
}

async fn delete_task(
    Extension(repo): Extension<Arc<dyn Repository>>,
    Query(scope): Query<OwnerQuery>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: TaskId = match id.parse() {
        Ok(id) => id,
        Err(_) => return json_error(StatusCode::BAD_REQUEST, "invalid_id", "Invalid task ID"),
    };

    match repo.delete_task(id, scope.owner()).await {
        Ok(()) => StatusCode::OK.into_response(),
        Err(e) => store_error_to_response(e),
    }
}

async fn complete_task(
    Extension(repo): Extension<Arc<dyn Repository>>,
    Query(scope): Query<OwnerQuery>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: TaskId = match id.parse() {
        Ok(id) => id,
        Err(_) => return json_error(StatusCode::BAD_REQUEST, "invalid_id", "Invalid task ID"),
    };

    match repo.complete_task(id, scope.owner()).await {
        Ok(()) => StatusCode::OK.into_response(),
        Err(e) => store_error_to_response(e),
    }
}

async fn task_by_id(
    Extension(repo): Extension<Arc<dyn Repository>>,
    Query(scope): Query<OwnerQuery>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: TaskId = match id.parse() {
        Ok(id) => id,
        Err(_) => return json_error(StatusCode::BAD_REQUEST, "invalid_id", "Invalid task ID"),
    };

    match repo.task_by_id(id, scope.owner()).await {
        Ok(task) => (StatusCode::OK, Json(task)).into_response(),
        Err(e) => store_error_to_response(e),
    }
}

async fn task_by_name(
    Extension(repo): Extension<Arc<dyn Repository>>,
    Query(scope): Query<OwnerQuery>,
    Path(name): Path<String>,
) -> axum::response::Response {
    match repo.task_by_name(&name, scope.owner()).await {
        Ok(task) => (StatusCode::OK, Json(task)).into_response(),
        Err(e) => store_error_to_response(e),
    }
}

async fn create_collection(
    Extension(repo): Extension<Arc<dyn Repository>>,
    Query(scope): Query<OwnerQuery>,
    Json(body): Json<CreateCollectionRequest>,
) -> axum::response::Response {
    if let Err(e) = validate_collection_name(&body.name) {
        return json_error(StatusCode::BAD_REQUEST, "validation_error", e.to_string());
    }

    let new = NewCollection {
        name: body.name,
        color: body
            .color
            .unwrap_or_else(|| DEFAULT_COLLECTION_COLOR.to_string()),
        icon: body
            .icon
            .unwrap_or_else(|| DEFAULT_COLLECTION_ICON.to_string()),
    };

    match repo.create_collection(scope.owner(), new).await {
        Ok(collection) => (StatusCode::CREATED, Json(collection)).into_response(),
        Err(e) => store_error_to_response(e),
    }
}

async fn list_collections(
    Extension(repo): Extension<Arc<dyn Repository>>,
    Query(scope): Query<OwnerQuery>,
) -> axum::response::Response {
    match repo.list_collections(scope.owner()).await {
        Ok(collections) => (StatusCode::OK, Json(collections)).into_response(),
        Err(e) => store_error_to_response(e),
    }
}

async fn delete_collection(
    Extension(repo): Extension<Arc<dyn Repository>>,
    Query(scope): Query<OwnerQuery>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: CollectionId = match id.parse() {
        Ok(id) => id,
        Err(_) => {
            return json_error(StatusCode::BAD_REQUEST, "invalid_id", "Invalid collection ID")
        }
    };

    match repo.delete_collection(id, scope.owner()).await {
        Ok(()) => StatusCode::OK.into_response(),
        Err(e) => store_error_to_response(e),
    }
}

async fn tasks_in_collection(
    Extension(repo): Extension<Arc<dyn Repository>>,
    Query(scope): Query<OwnerQuery>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: CollectionId = match id.parse() {
        Ok(id) => id,
        Err(_) => {
            return json_error(StatusCode::BAD_REQUEST, "invalid_id", "Invalid collection ID")
        }
    };

    match repo.tasks_in_collection(id, scope.owner()).await {
        Ok(tasks) => (StatusCode::OK, Json(tasks)).into_response(),
        Err(e) => store_error_to_response(e),
    }
}

fn store_error_to_response(err: StoreError) -> axum::response::Response {
    match err {
        StoreError::Validation(msg) => {
            json_error(StatusCode::BAD_REQUEST, "validation_error", msg)
        }
        StoreError::NotFound => json_error(StatusCode::NOT_FOUND, "not_found", "not found"),
        StoreError::NotFoundOrForbidden => json_error(
            StatusCode::NOT_FOUND,
            "not_found",
            "not found or access denied",
        ),
        StoreError::Conflict(msg) => json_error(StatusCode::CONFLICT, "conflict", msg),
        StoreError::Database(msg) => {
            tracing::error!(error = %msg, "storage operation failed");
            json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "storage_error",
                "storage error",
            )
        }
    }
}

fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        Json(serde_json::json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

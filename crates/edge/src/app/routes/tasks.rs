//! Task orchestration: validate → store call → audit emission.
//!
//! The response status is decided by validation and the store call alone;
//! event submission is fire-and-forget and emitted for every attempted
//! mutation, success or failure. Validation failures return before the store
//! call and produce no event.

use std::sync::Arc;

use axum::extract::{Extension, Path, Query};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

use taskloom_core::model::validate_task_name;
use taskloom_core::{CollectionId, TaskId};
use taskloom_events::{AuditAction, AuditEvent, AuditStatus};

use crate::app::errors::json_error;
use crate::app::routes::common::require_principal;
use crate::app::{dto, EdgeServices};
use crate::audit;
use crate::client::{CreateTask, StoreClientError};
use crate::context::PrincipalContext;

pub async fn create_task(
    Extension(services): Extension<Arc<EdgeServices>>,
    principal: Option<Extension<PrincipalContext>>,
    Json(body): Json<dto::CreateTaskRequest>,
) -> axum::response::Response {
    let principal = match require_principal(principal) {
        Ok(principal) => principal,
        Err(response) => return response,
    };

    if body.name.is_empty() {
        return json_error(StatusCode::BAD_REQUEST, "validation_error", "Name is required");
    }
    if let Err(e) = validate_task_name(&body.name) {
        return json_error(StatusCode::BAD_REQUEST, "validation_error", e.to_string());
    }

    let name = body.name.clone();
    let new = CreateTask {
        name: body.name,
        text: body.text,
        collection_id: body.collection_id.map(CollectionId::new),
    };

    match services.store.create_task(principal.user_id(), new).await {
        Ok(task) => {
            audit::emit(
                &services.producer,
                AuditEvent::now(
                    principal.user_id(),
                    principal.username(),
                    AuditAction::CreateTask,
                    format!("Task created: id={}, name={}", task.id, task.name),
                    AuditStatus::Success,
                ),
            );
            (StatusCode::CREATED, Json(task)).into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "task creation failed");
            audit::emit(
                &services.producer,
                AuditEvent::now(
                    principal.user_id(),
                    principal.username(),
                    AuditAction::CreateTask,
                    format!("Failed to create task: name={name}"),
                    AuditStatus::Error,
                ),
            );
            json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "store_error",
                "Failed to create task",
            )
        }
    }
}

pub async fn list_tasks(
    Extension(services): Extension<Arc<EdgeServices>>,
    principal: Option<Extension<PrincipalContext>>,
    Query(query): Query<dto::ListTasksQuery>,
) -> axum::response::Response {
    let principal = match require_principal(principal) {
        Ok(principal) => principal,
        Err(response) => return response,
    };

    match services
        .store
        .list_tasks(principal.user_id(), query.complete)
        .await
    {
        Ok(tasks) => (StatusCode::OK, Json(tasks)).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "task listing failed");
            json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "store_error",
                "Failed to get tasks",
            )
        }
    }
}

pub async fn delete_task(
    Extension(services): Extension<Arc<EdgeServices>>,
    principal: Option<Extension<PrincipalContext>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let principal = match require_principal(principal) {
        Ok(principal) => principal,
        Err(response) => return response,
    };

    let id: TaskId = match id.parse() {
        Ok(id) => id,
        Err(_) => return json_error(StatusCode::BAD_REQUEST, "invalid_id", "Invalid task ID"),
    };

    match services.store.delete_task(id, principal.user_id()).await {
        Ok(()) => {
            audit::emit(
                &services.producer,
                AuditEvent::now(
                    principal.user_id(),
                    principal.username(),
                    AuditAction::DeleteTask,
                    format!("Task deleted: id={id}"),
                    AuditStatus::Success,
                ),
            );
            (
                StatusCode::OK,
                Json(serde_json::json!({ "message": "Task deleted successfully" })),
            )
                .into_response()
        }
        Err(e) => {
            audit::emit(
                &services.producer,
                AuditEvent::now(
                    principal.user_id(),
                    principal.username(),
                    AuditAction::DeleteTask,
                    format!("Failed to delete task: id={id}"),
                    AuditStatus::Error,
                ),
            );
            match e {
                StoreClientError::NotFoundOrForbidden => json_error(
                    StatusCode::FORBIDDEN,
                    "forbidden",
                    "Task not found or forbidden",
                ),
                e => {
                    tracing::error!(error = %e, "task deletion failed");
                    json_error(
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "store_error",
                        "Failed to delete task",
                    )
                }
            }
        }
    }
}

pub async fn complete_task(
    Extension(services): Extension<Arc<EdgeServices>>,
    principal: Option<Extension<PrincipalContext>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let principal = match require_principal(principal) {
        Ok(principal) => principal,
        Err(response) => return response,
    };

    let id: TaskId = match id.parse() {
        Ok(id) => id,
        Err(_) => return json_error(StatusCode::BAD_REQUEST, "invalid_id", "Invalid task ID"),
    };

    match services.store.complete_task(id, principal.user_id()).await {
        Ok(()) => {
            audit::emit(
                &services.producer,
                AuditEvent::now(
                    principal.user_id(),
                    principal.username(),
                    AuditAction::CompleteTask,
                    format!("Task completed: id={id}"),
                    AuditStatus::Success,
                ),
            );
            (
                StatusCode::OK,
                Json(serde_json::json!({ "message": "Task completed successfully" })),
            )
                .into_response()
        }
        Err(e) => {
            audit::emit(
                &services.producer,
                AuditEvent::now(
                    principal.user_id(),
                    principal.username(),
                    AuditAction::CompleteTask,
                    format!("Failed to complete task: id={id}"),
                    AuditStatus::Error,
                ),
            );
            match e {
                StoreClientError::NotFoundOrForbidden => json_error(
                    StatusCode::FORBIDDEN,
                    "forbidden",
                    "Task already completed, not found, or forbidden",
                ),
                e => {
                    tracing::error!(error = %e, "task completion failed");
                    json_error(
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "store_error",
                        "Failed to complete task",
                    )
                }
            }
        }
    }
}

pub async fn task_by_id(
    Extension(services): Extension<Arc<EdgeServices>>,
    principal: Option<Extension<PrincipalContext>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let principal = match require_principal(principal) {
        Ok(principal) => principal,
        Err(response) => return response,
    };

    let id: TaskId = match id.parse() {
        Ok(id) => id,
        Err(_) => return json_error(StatusCode::BAD_REQUEST, "invalid_id", "Invalid task ID"),
    };

    match services.store.task_by_id(id, principal.user_id()).await {
        Ok(task) => (StatusCode::OK, Json(task)).into_response(),
        Err(StoreClientError::NotFound) => {
            json_error(StatusCode::NOT_FOUND, "not_found", "Task not found")
        }
        Err(e) => {
            tracing::error!(error = %e, "task lookup failed");
            json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "store_error",
                "Failed to get task",
            )
        }
    }
}

pub async fn task_by_name(
    Extension(services): Extension<Arc<EdgeServices>>,
    principal: Option<Extension<PrincipalContext>>,
    Path(name): Path<String>,
) -> axum::response::Response {
    let principal = match require_principal(principal) {
        Ok(principal) => principal,
        Err(response) => return response,
    };

    match services.store.task_by_name(&name, principal.user_id()).await {
        Ok(task) => (StatusCode::OK, Json(task)).into_response(),
        Err(StoreClientError::NotFound) => {
            json_error(StatusCode::NOT_FOUND, "not_found", "Task not found")
        }
        Err(e) => {
            tracing::error!(error = %e, "task lookup failed");
            json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "store_error",
                "Failed to get task",
            )
        }
    }
}

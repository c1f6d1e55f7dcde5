use axum::routing::{delete, get, post, put};
use axum::Router;

pub mod auth;
pub mod collections;
pub mod common;
pub mod tasks;

/// Router for all authenticated (principal-scoped) endpoints.
pub fn protected_router() -> Router {
    Router::new()
        .route("/create", post(tasks::create_task))
        .route("/get", get(tasks::list_tasks))
        .route("/tasks", get(tasks::list_tasks))
        .route("/delete/:id", delete(tasks::delete_task))
        .route("/complete/:id", put(tasks::complete_task).post(tasks::complete_task))
        .route("/getbyid/:id", get(tasks::task_by_id))
        .route("/getbyname/:name", get(tasks::task_by_name))
        .route(
            "/collections",
            post(collections::create_collection).get(collections::list_collections),
        )
        .route("/collections/:id", delete(collections::delete_collection))
        .route("/collections/:id/tasks", get(collections::tasks_in_collection))
}

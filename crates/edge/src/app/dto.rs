use serde::{Deserialize, Serialize};

use taskloom_core::UserId;

// -------------------------
// Request DTOs
// -------------------------

// Missing fields deserialize to their empty defaults so the handlers can
// answer with their own 400s instead of a framework rejection.

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateTaskRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub text: String,
    pub collection_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct CreateCollectionRequest {
    #[serde(default)]
    pub name: String,
    pub color: Option<String>,
    pub icon: Option<String>,
}

/// `?complete=true|false` filter on task listings; absent means all.
#[derive(Debug, Deserialize)]
pub struct ListTasksQuery {
    pub complete: Option<bool>,
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub username: String,
    pub user_id: UserId,
}

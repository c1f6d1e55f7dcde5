//! Storage abstraction for users, tasks and collections.
//!
//! The trait is the authorization boundary: every task/collection operation
//! takes the owning principal and implementations must include it in their
//! row predicate. Callers are never trusted to have checked ownership.

use async_trait::async_trait;

use taskloom_core::{Collection, CollectionId, Task, TaskId, User, UserId};

use crate::error::StoreError;

/// Completion filter for task listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskFilter {
    All,
    Completed,
    Uncompleted,
}

impl From<Option<bool>> for TaskFilter {
    fn from(complete: Option<bool>) -> Self {
        match complete {
            None => TaskFilter::All,
            Some(true) => TaskFilter::Completed,
            Some(false) => TaskFilter::Uncompleted,
        }
    }
}

/// Fields of a task to be created; the store assigns id and timestamps.
#[derive(Debug, Clone)]
pub struct NewTask {
    pub name: String,
    pub text: String,
    pub collection_id: Option<CollectionId>,
}

/// Fields of a collection to be created.
#[derive(Debug, Clone)]
pub struct NewCollection {
    pub name: String,
    pub color: String,
    pub icon: String,
}

/// Owner-scoped storage for the task domain.
///
/// Implementations: Postgres for deployment, in-memory for tests/dev.
#[async_trait]
pub trait Repository: Send + Sync {
    /// Insert a user; fails with `Conflict` when the username is taken.
    /// The returned record has the digest stripped.
    async fn create_user(&self, username: &str, password_hash: &str) -> Result<User, StoreError>;

    /// Full record including the digest (internal lookup surface).
    async fn user_by_username(&self, username: &str) -> Result<User, StoreError>;

    /// Full record including the digest (internal lookup surface).
    async fn user_by_id(&self, id: UserId) -> Result<User, StoreError>;

    /// Insert a task for the owner; `complete` starts false, timestamps are
    /// server-set.
    async fn create_task(&self, owner: UserId, new: NewTask) -> Result<Task, StoreError>;

    /// The owner's tasks, newest `create_time` first. Empty is not an error.
    async fn list_tasks(&self, owner: UserId, filter: TaskFilter) -> Result<Vec<Task>, StoreError>;

    /// Delete iff id and owner both match; zero rows → `NotFoundOrForbidden`.
    async fn delete_task(&self, id: TaskId, owner: UserId) -> Result<(), StoreError>;

    /// Mark complete iff id and owner match and the task is not yet complete;
    /// a re-completion attempt fails like a missing row.
    async fn complete_task(&self, id: TaskId, owner: UserId) -> Result<(), StoreError>;

    async fn task_by_id(&self, id: TaskId, owner: UserId) -> Result<Task, StoreError>;

    async fn task_by_name(&self, name: &str, owner: UserId) -> Result<Task, StoreError>;

    async fn create_collection(
        &self,
        owner: UserId,
        new: NewCollection,
    ) -> Result<Collection, StoreError>;

    /// The owner's collections, oldest first.
    async fn list_collections(&self, owner: UserId) -> Result<Vec<Collection>, StoreError>;

    /// Delete iff id and owner match. Tasks that referenced the collection
    /// keep existing with their reference cleared.
    async fn delete_collection(&self, id: CollectionId, owner: UserId) -> Result<(), StoreError>;

    /// The owner's tasks inside one collection, newest first.
    async fn tasks_in_collection(
        &self,
        collection: CollectionId,
        owner: UserId,
    ) -> Result<Vec<Task>, StoreError>;
}

//! Store client: the edge's only path to persisted state.
//!
//! One abstraction with the superset of store operations, polymorphic over
//! the real HTTP client and an in-memory fake so tests never need network
//! access. Every task/collection call carries the owning principal; the store
//! re-checks it.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::StatusCode;
use thiserror::Error;

use taskloom_core::{Collection, CollectionId, Task, TaskId, User, UserId};

/// Failures surfaced by a [`StoreClient`].
#[derive(Debug, Error)]
pub enum StoreClientError {
    /// Username already taken (user creation).
    #[error("username already exists")]
    Conflict,

    /// The requested row does not exist (lookups).
    #[error("not found")]
    NotFound,

    /// Mutation matched zero rows: missing, or owned by someone else. The
    /// store fuses the two on purpose.
    #[error("not found or forbidden")]
    NotFoundOrForbidden,

    /// The request never completed (connect, timeout, cancelled context).
    #[error("store request failed: {0}")]
    Transport(String),

    /// The response body did not decode into the expected shape.
    #[error("store response decode failed: {0}")]
    Decode(String),

    /// Any other upstream status.
    #[error("unexpected store response status {0}")]
    Upstream(u16),
}

/// Fields for a task creation, forwarded verbatim to the store.
#[derive(Debug, Clone)]
pub struct CreateTask {
    pub name: String,
    pub text: String,
    pub collection_id: Option<CollectionId>,
}

/// Fields for a collection creation (defaults already applied).
#[derive(Debug, Clone)]
pub struct CreateCollection {
    pub name: String,
    pub color: String,
    pub icon: String,
}

/// The persistence surface the orchestrator depends on.
#[async_trait]
pub trait StoreClient: Send + Sync {
    async fn create_user(&self, username: &str, password_hash: &str)
        -> Result<User, StoreClientError>;

    /// Full record including the digest; consumed by the login flow only.
    async fn user_by_username(&self, username: &str) -> Result<User, StoreClientError>;

    async fn create_task(&self, owner: UserId, new: CreateTask) -> Result<Task, StoreClientError>;

    async fn list_tasks(
        &self,
        owner: UserId,
        complete: Option<bool>,
    ) -> Result<Vec<Task>, StoreClientError>;

    async fn delete_task(&self, id: TaskId, owner: UserId) -> Result<(), StoreClientError>;

    async fn complete_task(&self, id: TaskId, owner: UserId) -> Result<(), StoreClientError>;

    async fn task_by_id(&self, id: TaskId, owner: UserId) -> Result<Task, StoreClientError>;

    async fn task_by_name(&self, name: &str, owner: UserId) -> Result<Task, StoreClientError>;

    async fn create_collection(
        &self,
        owner: UserId,
        new: CreateCollection,
    ) -> Result<Collection, StoreClientError>;

    async fn list_collections(&self, owner: UserId) -> Result<Vec<Collection>, StoreClientError>;

    async fn delete_collection(&self, id: CollectionId, owner: UserId)
        -> Result<(), StoreClientError>;

    async fn tasks_in_collection(
        &self,
        collection: CollectionId,
        owner: UserId,
    ) -> Result<Vec<Task>, StoreClientError>;
}

// ---------------------------------------------------------------------------
// HTTP implementation
// ---------------------------------------------------------------------------

/// Store client over the persistence service's HTTP surface.
///
/// Request cancellation propagates: dropping the handler future drops the
/// in-flight reqwest call.
#[derive(Debug, Clone)]
pub struct HttpStoreClient {
    base_url: String,
    client: reqwest::Client,
}

impl HttpStoreClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .unwrap_or_default();

        Self {
            base_url: base_url.into(),
            client,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn decode<T: serde::de::DeserializeOwned>(
        res: reqwest::Response,
    ) -> Result<T, StoreClientError> {
        res.json()
            .await
            .map_err(|e| StoreClientError::Decode(e.to_string()))
    }
}

fn transport(e: reqwest::Error) -> StoreClientError {
    StoreClientError::Transport(e.to_string())
}

/// Map a mutation status: zero-row outcomes arrive as 404 from the store.
fn check_mutation_status(status: StatusCode) -> Result<(), StoreClientError> {
    match status {
        StatusCode::OK => Ok(()),
        StatusCode::NOT_FOUND => Err(StoreClientError::NotFoundOrForbidden),
        status => Err(StoreClientError::Upstream(status.as_u16())),
    }
}

#[async_trait]
impl StoreClient for HttpStoreClient {
    async fn create_user(
        &self,
        username: &str,
        password_hash: &str,
    ) -> Result<User, StoreClientError> {
        let res = self
            .client
            .post(self.url("/user/create"))
            .json(&serde_json::json!({
                "username": username,
                "password_hash": password_hash,
            }))
            .send()
            .await
            .map_err(transport)?;

        match res.status() {
            StatusCode::CREATED => Self::decode(res).await,
            StatusCode::CONFLICT => Err(StoreClientError::Conflict),
            status => Err(StoreClientError::Upstream(status.as_u16())),
        }
    }

    async fn user_by_username(&self, username: &str) -> Result<User, StoreClientError> {
        let res = self
            .client
            .get(self.url(&format!("/user/{username}")))
            .send()
            .await
            .map_err(transport)?;

        match res.status() {
            StatusCode::OK => Self::decode(res).await,
            StatusCode::NOT_FOUND => Err(StoreClientError::NotFound),
            status => Err(StoreClientError::Upstream(status.as_u16())),
        }
    }

    async fn create_task(&self, owner: UserId, new: CreateTask) -> Result<Task, StoreClientError> {
        let res = self
            .client
            .post(self.url("/create"))
            .query(&[("user_id", owner.get())])
            .json(&serde_json::json!({
                "name": new.name,
                "text": new.text,
                "collection_id": new.collection_id,
            }))
            .send()
            .await
            .map_err(transport)?;

        match res.status() {
            StatusCode::CREATED => Self::decode(res).await,
            status => Err(StoreClientError::Upstream(status.as_u16())),
        }
    }

    async fn list_tasks(
        &self,
        owner: UserId,
        complete: Option<bool>,
    ) -> Result<Vec<Task>, StoreClientError> {
        let mut req = self
            .client
            .get(self.url("/get"))
            .query(&[("user_id", owner.get())]);
        if let Some(complete) = complete {
            req = req.query(&[("complete", complete)]);
        }

        let res = req.send().await.map_err(transport)?;
        match res.status() {
            StatusCode::OK => Self::decode(res).await,
            status => Err(StoreClientError::Upstream(status.as_u16())),
        }
    }

    async fn delete_task(&self, id: TaskId, owner: UserId) -> Result<(), StoreClientError> {
        let res = self
            .client
            .delete(self.url(&format!("/delete/{id}")))
            .query(&[("user_id", owner.get())])
            .send()
            .await
            .map_err(transport)?;

        check_mutation_status(res.status())
    }

    async fn complete_task(&self, id: TaskId, owner: UserId) -> Result<(), StoreClientError> {
        let res = self
            .client
            .put(self.url(&format!("/complete/{id}")))
            .query(&[("user_id", owner.get())])
            .send()
            .await
            .map_err(transport)?;

        check_mutation_status(res.status())
    }

    async fn task_by_id(&self, id: TaskId, owner: UserId) -> Result<Task, StoreClientError> {
        let res = self
            .client
            .get(self.url(&format!("/getbyid/{id}")))
            .query(&[("user_id", owner.get())])
            .send()
            .await
            .map_err(transport)?;

        match res.status() {
            StatusCode::OK => Self::decode(res).await,
            StatusCode::NOT_FOUND => Err(StoreClientError::NotFound),
            status => Err(StoreClientError::Upstream(status.as_u16())),
        }
    }

    async fn task_by_name(&self, name: &str, owner: UserId) -> Result<Task, StoreClientError> {
        let res = self
            .client
            .get(self.url(&format!("/getbyname/{name}")))
            .query(&[("user_id", owner.get())])
            .send()
            .await
            .map_err(transport)?;

        match res.status() {
            StatusCode::OK => Self::decode(res).await,
            StatusCode::NOT_FOUND => Err(StoreClientError::NotFound),
            status => Err(StoreClientError::Upstream(status.as_u16())),
        }
    }

    async fn create_collection(
        &self,
        owner: UserId,
        new: CreateCollection,
    ) -> Result<Collection, StoreClientError> {
        let res = self
            .client
            .post(self.url("/collections"))
            .query(&[("user_id", owner.get())])
            .json(&serde_json::json!({
                "name": new.name,
                "color": new.color,
                "icon": new.icon,
            }))
            .send()
            .await
            .map_err(transport)?;

        match res.status() {
            StatusCode::CREATED => Self::decode(res).await,
            status => Err(StoreClientError::Upstream(status.as_u16())),
        }
    }

    async fn list_collections(&self, owner: UserId) -> Result<Vec<Collection>, StoreClientError> {
        let res = self
            .client
            .get(self.url("/collections"))
            .query(&[("user_id", owner.get())])
            .send()
            .await
            .map_err(transport)?;

        match res.status() {
            StatusCode::OK => Self::decode(res).await,
            status => Err(StoreClientError::Upstream(status.as_u16())),
        }
    }

    async fn delete_collection(
        &self,
        id: CollectionId,
        owner: UserId,
    ) -> Result<(), StoreClientError> {
        let res = self
            .client
            .delete(self.url(&format!("/collections/{id}")))
            .query(&[("user_id", owner.get())])
            .send()
            .await
            .map_err(transport)?;

        check_mutation_status(res.status())
    }

    async fn tasks_in_collection(
        &self,
        collection: CollectionId,
        owner: UserId,
    ) -> Result<Vec<Task>, StoreClientError> {
        let res = self
            .client
            .get(self.url(&format!("/collections/{collection}/tasks")))
            .query(&[("user_id", owner.get())])
            .send()
            .await
            .map_err(transport)?;

        match res.status() {
            StatusCode::OK => Self::decode(res).await,
            status => Err(StoreClientError::Upstream(status.as_u16())),
        }
    }
}

// ---------------------------------------------------------------------------
// In-memory fake
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct FakeState {
    users: Vec<User>,
    tasks: Vec<Task>,
    collections: Vec<Collection>,
    next_user_id: i64,
    next_task_id: i64,
    next_collection_id: i64,
}

/// In-process store fake with the persistence service's semantics.
///
/// Backs the edge black-box tests; no network involved.
#[derive(Debug, Default)]
pub struct InMemoryStoreClient {
    state: Mutex<FakeState>,
}

impl InMemoryStoreClient {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, FakeState>, StoreClientError> {
        self.state
            .lock()
            .map_err(|_| StoreClientError::Transport("state lock poisoned".to_string()))
    }
}

fn newest_first(tasks: &mut [Task]) {
    tasks.sort_by(|a, b| {
        b.create_time
            .cmp(&a.create_time)
            .then(b.id.get().cmp(&a.id.get()))
    });
}

#[async_trait]
impl StoreClient for InMemoryStoreClient {
    async fn create_user(
        &self,
        username: &str,
        password_hash: &str,
    ) -> Result<User, StoreClientError> {
        let mut state = self.lock()?;

        if state.users.iter().any(|u| u.username == username) {
            return Err(StoreClientError::Conflict);
        }

        state.next_user_id += 1;
        let user = User {
            id: UserId::new(state.next_user_id),
            username: username.to_string(),
            password_hash: Some(password_hash.to_string()),
            created_at: Utc::now(),
        };
        state.users.push(user.clone());

        Ok(User {
            password_hash: None,
            ..user
        })
    }

    async fn user_by_username(&self, username: &str) -> Result<User, StoreClientError> {
        let state = self.lock()?;
        state
            .users
            .iter()
            .find(|u| u.username == username)
            .cloned()
            .ok_or(StoreClientError::NotFound)
    }

    async fn create_task(&self, owner: UserId, new: CreateTask) -> Result<Task, StoreClientError> {
        let mut state = self.lock()?;

        state.next_task_id += 1;
        let task = Task {
            id: TaskId::new(state.next_task_id),
            user_id: owner,
            collection_id: new.collection_id,
            name: new.name,
            text: new.text,
            create_time: Utc::now(),
            complete: false,
            complete_at: None,
        };
        state.tasks.push(task.clone());

        Ok(task)
    }

    async fn list_tasks(
        &self,
        owner: UserId,
        complete: Option<bool>,
    ) -> Result<Vec<Task>, StoreClientError> {
        let state = self.lock()?;

        let mut tasks: Vec<Task> = state
            .tasks
            .iter()
            .filter(|t| t.user_id == owner)
            .filter(|t| complete.map_or(true, |c| t.complete == c))
            .cloned()
            .collect();
        newest_first(&mut tasks);

        Ok(tasks)
    }

    async fn delete_task(&self, id: TaskId, owner: UserId) -> Result<(), StoreClientError> {
        let mut state = self.lock()?;

        let before = state.tasks.len();
        state.tasks.retain(|t| !(t.id == id && t.user_id == owner));
        if state.tasks.len() == before {
            return Err(StoreClientError::NotFoundOrForbidden);
        }
        Ok(())
    }

    async fn complete_task(&self, id: TaskId, owner: UserId) -> Result<(), StoreClientError> {
        let mut state = self.lock()?;

        let task = state
            .tasks
            .iter_mut()
            .find(|t| t.id == id && t.user_id == owner && !t.complete)
            .ok_or(StoreClientError::NotFoundOrForbidden)?;

        task.complete = true;
        task.complete_at = Some(Utc::now());
        Ok(())
    }

    async fn task_by_id(&self, id: TaskId, owner: UserId) -> Result<Task, StoreClientError> {
        let state = self.lock()?;
        state
            .tasks
            .iter()
            .find(|t| t.id == id && t.user_id == owner)
            .cloned()
            .ok_or(StoreClientError::NotFound)
    }

    async fn task_by_name(&self, name: &str, owner: UserId) -> Result<Task, StoreClientError> {
        let state = self.lock()?;
        state
            .tasks
            .iter()
            .find(|t| t.name == name && t.user_id == owner)
            .cloned()
            .ok_or(StoreClientError::NotFound)
    }

    async fn create_collection(
        &self,
        owner: UserId,
        new: CreateCollection,
    ) -> Result<Collection, StoreClientError> {
        let mut state = self.lock()?;

        state.next_collection_id += 1;
        let collection = Collection {
            id: CollectionId::new(state.next_collection_id),
            user_id: owner,
            name: new.name,
            color: new.color,
            icon: new.icon,
            created_at: Utc::now(),
        };
        state.collections.push(collection.clone());

        Ok(collection)
    }

    async fn list_collections(&self, owner: UserId) -> Result<Vec<Collection>, StoreClientError> {
        let state = self.lock()?;
        Ok(state
            .collections
            .iter()
            .filter(|c| c.user_id == owner)
            .cloned()
            .collect())
    }

    async fn delete_collection(
        &self,
        id: CollectionId,
        owner: UserId,
    ) -> Result<(), StoreClientError> {
        let mut state = self.lock()?;

        let before = state.collections.len();
        state
            .collections
            .retain(|c| !(c.id == id && c.user_id == owner));
        if state.collections.len() == before {
            return Err(StoreClientError::NotFoundOrForbidden);
        }

        for task in state
            .tasks
            .iter_mut()
            .filter(|t| t.collection_id == Some(id))
        {
            task.collection_id = None;
        }
        Ok(())
    }

    async fn tasks_in_collection(
        &self,
        collection: CollectionId,
        owner: UserId,
    ) -> Result<Vec<Task>, StoreClientError> {
        let state = self.lock()?;

        let mut tasks: Vec<Task> = state
            .tasks
            .iter()
            .filter(|t| t.user_id == owner && t.collection_id == Some(collection))
            .cloned()
            .collect();
        newest_first(&mut tasks);

        Ok(tasks)
    }
}

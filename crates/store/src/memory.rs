//! In-memory repository for tests/dev.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;

use taskloom_core::{Collection, CollectionId, Task, TaskId, User, UserId};

use crate::error::StoreError;
use crate::repository::{NewCollection, NewTask, Repository, TaskFilter};

#[derive(Debug, Default)]
struct State {
    users: Vec<User>,
    tasks: Vec<Task>,
    collections: Vec<Collection>,
    next_user_id: i64,
    next_task_id: i64,
    next_collection_id: i64,
}

/// In-memory repository.
///
/// Intended for tests/dev. Mirrors the Postgres semantics exactly, including
/// the fused not-found-or-forbidden outcomes and ordering.
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    state: Mutex<State>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, State>, StoreError> {
        self.state
            .lock()
            .map_err(|_| StoreError::database("state lock poisoned"))
    }
}

fn newest_first(tasks: &mut [Task]) {
    // create_time descending, id as the tiebreaker for same-instant rows.
    tasks.sort_by(|a, b| {
        b.create_time
            .cmp(&a.create_time)
            .then(b.id.get().cmp(&a.id.get()))
    });
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn create_user(&self, username: &str, password_hash: &str) -> Result<User, StoreError> {
        let mut state = self.lock()?;

        if state.users.iter().any(|u| u.username == username) {
            return Err(StoreError::conflict("Username already exists"));
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

    async fn user_by_username(&self, username: &str) -> Result<User, StoreError> {
        let state = self.lock()?;
        state
            .users
            .iter()
            .find(|u| u.username == username)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn user_by_id(&self, id: UserId) -> Result<User, StoreError> {
        let state = self.lock()?;
        state
            .users
            .iter()
            .find(|u| u.id == id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn create_task(&self, owner: UserId, new: NewTask) -> Result<Task, StoreError> {
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

    async fn list_tasks(&self, owner: UserId, filter: TaskFilter) -> Result<Vec<Task>, StoreError> {
        let state = self.lock()?;

        let mut tasks: Vec<Task> = state
            .tasks
            .iter()
            .filter(|t| t.user_id == owner)
            .filter(|t| match filter {
                TaskFilter::All => true,
                TaskFilter::Completed => t.complete,
                TaskFilter::Uncompleted => !t.complete,
            })
            .cloned()
            .collect();
        newest_first(&mut tasks);

        Ok(tasks)
    }

    async fn delete_task(&self, id: TaskId, owner: UserId) -> Result<(), StoreError> {
        let mut state = self.lock()?;

        let before = state.tasks.len();
        state.tasks.retain(|t| !(t.id == id && t.user_id == owner));
        if state.tasks.len() == before {
            return Err(StoreError::NotFoundOrForbidden);
        }

        Ok(())
    }

    async fn complete_task(&self, id: TaskId, owner: UserId) -> Result<(), StoreError> {
        let mut state = self.lock()?;

        let task = state
            .tasks
            .iter_mut()
            .find(|t| t.id == id && t.user_id == owner && !t.complete)
            .ok_or(StoreError::NotFoundOrForbidden)?;

        task.complete = true;
        task.complete_at = Some(Utc::now());

        Ok(())
    }

    async fn task_by_id(&self, id: TaskId, owner: UserId) -> Result<Task, StoreError> {
        let state = self.lock()?;
        state
            .tasks
            .iter()
            .find(|t| t.id == id && t.user_id == owner)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn task_by_name(&self, name: &str, owner: UserId) -> Result<Task, StoreError> {
        let state = self.lock()?;
        state
            .tasks
            .iter()
            .find(|t| t.name == name && t.user_id == owner)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn create_collection(
        &self,
        owner: UserId,
        new: NewCollection,
    ) -> Result<Collection, StoreError> {
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

    async fn list_collections(&self, owner: UserId) -> Result<Vec<Collection>, StoreError> {
        let state = self.lock()?;

        // Insertion order is created_at ascending already.
        Ok(state
            .collections
            .iter()
            .filter(|c| c.user_id == owner)
            .cloned()
            .collect())
    }

    async fn delete_collection(&self, id: CollectionId, owner: UserId) -> Result<(), StoreError> {
        let mut state = self.lock()?;

        let before = state.collections.len();
        state
            .collections
            .retain(|c| !(c.id == id && c.user_id == owner));
        if state.collections.len() == before {
            return Err(StoreError::NotFoundOrForbidden);
        }

        // ON DELETE SET NULL: member tasks survive with the reference cleared.
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
    ) -> Result<Vec<Task>, StoreError> {
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

//! Domain records exchanged between the edge and persistence services.
//!
//! These are plain data carriers; invariants that need the database (username
//! uniqueness, ownership) are enforced in the store, field-level rules here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};
use crate::id::{CollectionId, TaskId, UserId};

/// Maximum username length, matching the `VARCHAR(50)` column.
pub const USERNAME_MAX_LEN: usize = 50;

/// Maximum task name length, matching the `VARCHAR(255)` column.
pub const TASK_NAME_MAX_LEN: usize = 255;

/// Maximum collection name length, matching the `VARCHAR(100)` column.
pub const COLLECTION_NAME_MAX_LEN: usize = 100;

/// Default collection color applied when the client omits one.
pub const DEFAULT_COLLECTION_COLOR: &str = "#2564cf";

/// Default collection icon applied when the client omits one.
pub const DEFAULT_COLLECTION_ICON: &str = "📁";

/// A registered principal.
///
/// `password_hash` is only populated on the persistence service's internal
/// user-lookup surface; everywhere else it is `None` and omitted from JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_hash: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A task owned by exactly one principal.
///
/// Invariant: `complete_at` is `Some` iff `complete` is true.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub user_id: UserId,
    pub collection_id: Option<CollectionId>,
    pub name: String,
    pub text: String,
    pub create_time: DateTime<Utc>,
    pub complete: bool,
    pub complete_at: Option<DateTime<Utc>>,
}

/// A named grouping of tasks, owned by one principal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collection {
    pub id: CollectionId,
    pub user_id: UserId,
    pub name: String,
    pub color: String,
    pub icon: String,
    pub created_at: DateTime<Utc>,
}

/// Validate a username against the store's column constraints.
///
/// Usernames are case-sensitive; length is counted in bytes like the column.
pub fn validate_username(username: &str) -> DomainResult<()> {
    if username.is_empty() {
        return Err(DomainError::validation("username is required"));
    }
    if username.len() > USERNAME_MAX_LEN {
        return Err(DomainError::validation(format!(
            "username must be at most {USERNAME_MAX_LEN} characters"
        )));
    }
    Ok(())
}

/// Validate a task name (required, bounded).
pub fn validate_task_name(name: &str) -> DomainResult<()> {
    if name.is_empty() {
        return Err(DomainError::validation("name is required"));
    }
    if name.len() > TASK_NAME_MAX_LEN {
        return Err(DomainError::validation(format!(
            "name must be at most {TASK_NAME_MAX_LEN} characters"
        )));
    }
    Ok(())
}

/// Validate a collection name (required, bounded).
pub fn validate_collection_name(name: &str) -> DomainResult<()> {
    if name.is_empty() {
        return Err(DomainError::validation("name is required"));
    }
    if name.len() > COLLECTION_NAME_MAX_LEN {
        return Err(DomainError::validation(format!(
            "name must be at most {COLLECTION_NAME_MAX_LEN} characters"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_digest_is_omitted_when_absent() {
        let user = User {
            id: UserId::new(1),
            username: "alice".to_string(),
            password_hash: None,
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password_hash").is_none());
    }

    #[test]
    fn user_digest_survives_roundtrip_when_present() {
        let user = User {
            id: UserId::new(1),
            username: "alice".to_string(),
            password_hash: Some("$2b$12$abcdefghijklmnopqrstuv".to_string()),
            created_at: Utc::now(),
        };
        let json = serde_json::to_string(&user).unwrap();
        let back: User = serde_json::from_str(&json).unwrap();
        assert_eq!(back.password_hash, user.password_hash);
    }

    #[test]
    fn empty_names_are_rejected() {
        assert!(validate_username("").is_err());
        assert!(validate_task_name("").is_err());
        assert!(validate_collection_name("").is_err());
    }

    #[test]
    fn overlong_names_are_rejected() {
        assert!(validate_username(&"a".repeat(USERNAME_MAX_LEN + 1)).is_err());
        assert!(validate_task_name(&"a".repeat(TASK_NAME_MAX_LEN + 1)).is_err());
        assert!(validate_collection_name(&"a".repeat(COLLECTION_NAME_MAX_LEN + 1)).is_err());
        assert!(validate_username(&"a".repeat(USERNAME_MAX_LEN)).is_ok());
    }
}

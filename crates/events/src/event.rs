//! Audit-event model and wire format.
//!
//! One event is produced per attempted task mutation, success or failure.
//! The wire format is a single line of UTF-8 JSON:
//!
//! ```json
//! {"timestamp":"2024-01-01T00:00:00Z","user_id":1,"username":"alice",
//!  "action":"CREATE_TASK","details":"Task created: id=1, name=t1",
//!  "status":"SUCCESS"}
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use taskloom_core::UserId;

use crate::log::EventLogError;

/// The mutation an audit event describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    CreateTask,
    DeleteTask,
    CompleteTask,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::CreateTask => "CREATE_TASK",
            AuditAction::DeleteTask => "DELETE_TASK",
            AuditAction::CompleteTask => "COMPLETE_TASK",
        }
    }
}

/// Whether the attempted mutation succeeded in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditStatus {
    Success,
    Error,
}

/// A best-effort record of one attempted mutation.
///
/// Events are created once and never mutated. The event log is a lossy shadow
/// of the store: emission may fail after the store call succeeded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEvent {
    pub timestamp: DateTime<Utc>,
    pub user_id: UserId,
    pub username: String,
    pub action: AuditAction,
    pub details: String,
    pub status: AuditStatus,
}

impl AuditEvent {
    /// Build an event stamped with the current time.
    pub fn now(
        user_id: UserId,
        username: impl Into<String>,
        action: AuditAction,
        details: impl Into<String>,
        status: AuditStatus,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            user_id,
            username: username.into(),
            action,
            details: details.into(),
            status,
        }
    }

    /// Serialize to the compact JSON wire value.
    pub fn to_wire(&self) -> Result<String, EventLogError> {
        serde_json::to_string(self).map_err(|e| EventLogError::Serialization(e.to_string()))
    }
}

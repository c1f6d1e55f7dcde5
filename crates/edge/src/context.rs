//! Per-request principal context.

use taskloom_core::UserId;

/// Authenticated principal for a request.
///
/// Attached to request extensions by the auth middleware; immutable for the
/// lifetime of the request. Handlers read it through one accessor
/// (`routes::common::require_principal`) that yields present/absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrincipalContext {
    user_id: UserId,
    username: String,
}

impl PrincipalContext {
    pub fn new(user_id: UserId, username: impl Into<String>) -> Self {
        Self {
            user_id,
            username: username.into(),
        }
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn username(&self) -> &str {
        &self.username
    }
}

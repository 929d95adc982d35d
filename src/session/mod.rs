//! Session storage and lifecycle
//!
//! A session is a short JSON payload (`{"token", "user_id"}`) stored under a
//! random session id with a TTL matching the token's lifetime. The session id
//! is the only thing the browser holds.
//!
//! - [`SessionStore`]: TTL-aware key-value storage (memory or MongoDB)
//! - [`SessionLifecycle`]: sign-in, sign-up and logout orchestration

pub mod lifecycle;
pub mod memory;
pub mod mongo;

pub use lifecycle::{SessionLifecycle, SignInRequest, SignUpRequest, SignedIn};
pub use memory::{spawn_sweep_task, MemorySessionStore};
pub use mongo::MongoSessionStore;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

use crate::types::{AuthError, Result};

/// Key-value storage with per-entry expiry
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Store `payload` under `session_id`, replacing any prior value
    async fn put(&self, session_id: &str, payload: &str, ttl: Duration) -> Result<()>;

    /// `NotFound` for both missing and expired entries
    async fn get(&self, session_id: &str) -> Result<String>;

    /// Idempotent: deleting a missing or expired entry succeeds
    async fn delete(&self, session_id: &str) -> Result<()>;
}

/// Serialized session payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionData {
    pub token: String,
    pub user_id: Uuid,
}

impl SessionData {
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self)
            .map_err(|e| AuthError::Internal(format!("Failed to encode session data: {}", e)))
    }

    /// A payload that does not decode is corruption on our side, not a
    /// client error.
    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw)
            .map_err(|e| AuthError::Internal(format!("Cannot decode session data: {}", e)))
    }
}

/// Fresh 128-bit random session id
pub fn new_session_id() -> String {
    Uuid::new_v4().to_string()
}

/// Shortened id for log lines
pub(crate) fn short_id(session_id: &str) -> &str {
    session_id.get(..8).unwrap_or(session_id)
}

pub(crate) fn session_not_found() -> AuthError {
    AuthError::NotFound("session not found".into())
}

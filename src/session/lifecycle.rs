//! Session lifecycle: sign-up, sign-in and logout
//!
//! Sign-in flow:
//! 1. Verify credentials (shape, lookup, password)
//! 2. Issue a token
//! 3. Store `{token, user_id}` under a fresh session id, TTL = token lifetime
//! 4. Only after the store write succeeds is the session id handed back for
//!    the cookie
//!
//! A failed store write leaves the caller signed out; nothing is rolled back
//! in the store because nothing was written.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

use super::{new_session_id, short_id, SessionData, SessionStore};
use crate::auth::credentials::CredentialVerifier;
use crate::auth::jwt::TokenIssuer;
use crate::auth::password::hash_password;
use crate::auth::validation::validate_credentials;
use crate::db::{NewUser, User, UserRepository};
use crate::types::{bounded, AuthError, Result};

#[derive(Debug, Clone, Deserialize)]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SignUpRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Result of a successful sign-in
#[derive(Debug, Clone)]
pub struct SignedIn {
    pub session_id: String,
    pub user_id: uuid::Uuid,
    pub expires_at: DateTime<Utc>,
    /// Seconds until expiry, for the cookie `Max-Age`
    pub max_age_secs: u64,
}

pub struct SessionLifecycle {
    verifier: CredentialVerifier,
    tokens: TokenIssuer,
    users: Arc<dyn UserRepository>,
    sessions: Arc<dyn SessionStore>,
    timeout: Duration,
}

impl SessionLifecycle {
    pub fn new(
        users: Arc<dyn UserRepository>,
        sessions: Arc<dyn SessionStore>,
        tokens: TokenIssuer,
        timeout: Duration,
    ) -> Self {
        Self {
            verifier: CredentialVerifier::new(Arc::clone(&users), timeout),
            tokens,
            users,
            sessions,
            timeout,
        }
    }

    /// Register a new user with a hashed password
    pub async fn sign_up(&self, request: SignUpRequest) -> Result<User> {
        let violations = validate_credentials(&request.email, &request.password);
        if !violations.is_empty() {
            return Err(AuthError::Validation(violations));
        }

        let password_hash = hash_password(&request.password)?;
        let new_user = NewUser {
            name: request.name,
            username: request.username,
            email: request.email,
            password_hash,
        };

        let user = bounded(self.timeout, "user insert", self.users.create(new_user)).await?;
        info!("Registered new user: {}", user.email);
        Ok(user)
    }

    /// Verify credentials and open a new session
    pub async fn sign_in(&self, request: &SignInRequest) -> Result<SignedIn> {
        let user = self.verifier.verify(&request.email, &request.password).await?;

        let issued = self.tokens.issue(user.id, &user.email)?;
        let ttl = issued.remaining();

        let session_id = new_session_id();
        let payload = SessionData {
            token: issued.token.clone(),
            user_id: user.id,
        }
        .to_json()?;

        if let Err(e) = bounded(
            self.timeout,
            "session write",
            self.sessions.put(&session_id, &payload, ttl),
        )
        .await
        {
            error!(error = %e, "Session store write failed; sign-in aborted");
            return Err(match e {
                AuthError::Dependency(_) => e,
                other => AuthError::Dependency(other.to_string()),
            });
        }

        info!(
            session = short_id(&session_id),
            "Sign-in successful: {}", user.email
        );

        Ok(SignedIn {
            session_id,
            user_id: user.id,
            expires_at: issued.expires_at(),
            max_age_secs: issued.max_age_secs(),
        })
    }

    /// Close the session named by the cookie.
    ///
    /// The store delete is idempotent, so an already-expired session still
    /// logs out successfully.
    pub async fn logout(&self, session_id: Option<&str>) -> Result<()> {
        let session_id = session_id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| AuthError::Unauthorized("unauthorized".into()))?;

        bounded(self.timeout, "session delete", self.sessions.delete(session_id)).await?;
        info!(session = short_id(session_id), "Logged out");
        Ok(())
    }
}

//! Request gating
//!
//! Protected routes run behind an ordered [`GuardPipeline`]. Each guard either
//! forwards the (possibly enriched) [`RequestContext`] to the next one or
//! rejects the request; after a rejection nothing else runs.
//!
//! [`AuthGate`] is the session guard:
//! 1. `session_id` cookie present
//! 2. session record present in the store and decodable
//! 3. embedded token verifies (signature + expiry), independent of step 2
//! 4. the token's subject matches the record's `user_id`
//! 5. attach the authenticated user to the context

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hyper::HeaderMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::auth::cookie::extract_session_id;
use crate::auth::jwt::TokenIssuer;
use crate::session::{short_id, SessionData, SessionStore};
use crate::types::{bounded, AuthError, Result};

/// Identity attached to a request that passed the gate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
    pub email: String,
    pub session_expires_at: DateTime<Utc>,
}

/// Per-request state threaded through the guards
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub path: String,
    pub headers: HeaderMap,
    pub user: Option<AuthenticatedUser>,
}

impl RequestContext {
    pub fn new(path: impl Into<String>, headers: HeaderMap) -> Self {
        Self {
            path: path.into(),
            headers,
            user: None,
        }
    }
}

/// What a guard decided
#[derive(Debug)]
pub enum GuardOutcome {
    Forward(RequestContext),
    Reject(AuthError),
}

#[async_trait]
pub trait Guard: Send + Sync {
    fn name(&self) -> &'static str;

    async fn check(&self, ctx: RequestContext) -> GuardOutcome;
}

/// Ordered list of guards run ahead of a protected handler
#[derive(Clone, Default)]
pub struct GuardPipeline {
    guards: Vec<Arc<dyn Guard>>,
}

impl GuardPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, guard: Arc<dyn Guard>) -> Self {
        self.guards.push(guard);
        self
    }

    /// Run every guard in order, stopping at the first rejection
    pub async fn run(&self, ctx: RequestContext) -> Result<RequestContext> {
        let mut ctx = ctx;
        for guard in &self.guards {
            match guard.check(ctx).await {
                GuardOutcome::Forward(next) => ctx = next,
                GuardOutcome::Reject(err) => {
                    debug!(guard = guard.name(), error = %err, "Request rejected");
                    return Err(err);
                }
            }
        }
        Ok(ctx)
    }
}

/// Session + token guard
pub struct AuthGate {
    sessions: Arc<dyn SessionStore>,
    tokens: TokenIssuer,
    timeout: Duration,
}

impl AuthGate {
    pub fn new(sessions: Arc<dyn SessionStore>, tokens: TokenIssuer, timeout: Duration) -> Self {
        Self {
            sessions,
            tokens,
            timeout,
        }
    }

    /// Resolve the caller behind the request's session cookie
    pub async fn authenticate(&self, headers: &HeaderMap) -> Result<AuthenticatedUser> {
        let session_id = extract_session_id(headers)
            .ok_or_else(|| AuthError::Unauthorized("unauthorized - no session".into()))?;

        let raw = match bounded(self.timeout, "session lookup", self.sessions.get(&session_id)).await
        {
            Ok(raw) => raw,
            Err(AuthError::NotFound(_)) => {
                debug!(session = short_id(&session_id), "No session record");
                return Err(AuthError::Unauthorized(
                    "unauthorized - no session data".into(),
                ));
            }
            Err(e) => return Err(e),
        };

        let data = SessionData::from_json(&raw)?;

        let claims = self.tokens.verify(&data.token).map_err(|e| {
            warn!(session = short_id(&session_id), error = %e, "Session token rejected");
            AuthError::Unauthorized("invalid token".into())
        })?;

        // The identity comes from the signed token; the record must agree
        if claims.sub != data.user_id {
            warn!(
                session = short_id(&session_id),
                "Session record user does not match token subject"
            );
            return Err(AuthError::Unauthorized("invalid token".into()));
        }

        Ok(AuthenticatedUser {
            user_id: claims.sub,
            session_expires_at: claims.expires_at(),
            email: claims.email,
        })
    }
}

#[async_trait]
impl Guard for AuthGate {
    fn name(&self) -> &'static str {
        "auth"
    }

    async fn check(&self, mut ctx: RequestContext) -> GuardOutcome {
        match self.authenticate(&ctx.headers).await {
            Ok(user) => {
                ctx.user = Some(user);
                GuardOutcome::Forward(ctx)
            }
            Err(err) => GuardOutcome::Reject(err),
        }
    }
}

//! HTTP server and shared application state

pub mod http;

pub use http::{handle_request, run};

use std::sync::Arc;

use crate::auth::{AuthGate, CookieWriter, GuardPipeline, TokenIssuer};
use crate::config::Args;
use crate::db::{MemoryUserRepository, UserRepository};
use crate::session::{MemorySessionStore, SessionLifecycle, SessionStore};

/// Shared application state
///
/// Built once in `main`; every handle inside is safe to share across
/// connection tasks.
pub struct AppState {
    pub args: Args,
    pub lifecycle: SessionLifecycle,
    /// Guards run ahead of every protected route
    pub guards: GuardPipeline,
    pub cookies: CookieWriter,
}

impl AppState {
    pub fn new(
        args: Args,
        users: Arc<dyn UserRepository>,
        sessions: Arc<dyn SessionStore>,
        tokens: TokenIssuer,
    ) -> Self {
        let timeout = args.request_timeout();
        let gate = AuthGate::new(Arc::clone(&sessions), tokens.clone(), timeout);
        let lifecycle = SessionLifecycle::new(users, sessions, tokens, timeout);

        Self {
            cookies: CookieWriter::new(args.cookie_secure),
            guards: GuardPipeline::new().with(Arc::new(gate)),
            lifecycle,
            args,
        }
    }

    /// State backed by in-memory users and sessions (dev mode, tests).
    ///
    /// The session store is returned as well so callers can start the sweep
    /// task or inspect it.
    pub fn in_memory(args: Args, tokens: TokenIssuer) -> (Self, Arc<MemorySessionStore>) {
        let sessions = Arc::new(MemorySessionStore::new());
        let state = Self::new(
            args,
            Arc::new(MemoryUserRepository::new()),
            Arc::clone(&sessions) as Arc<dyn SessionStore>,
            tokens,
        );
        (state, sessions)
    }
}

//! sessiongate - session-based authentication gateway
//!
//! Users sign in with email and password, receive an opaque `session_id`
//! cookie backed by a server-side session record holding a signed token, and
//! pass the auth gate on protected routes until the session expires or they
//! log out.

pub mod auth;
pub mod config;
pub mod db;
pub mod routes;
pub mod server;
pub mod session;
pub mod types;

pub use config::Args;
pub use server::{run, AppState};
pub use types::{AuthError, Result};

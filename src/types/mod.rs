//! Shared types for sessiongate

mod error;

pub use error::{AuthError, Result};

use std::future::Future;
use std::time::Duration;

/// Run a dependency call (user database, session store) under a deadline.
///
/// An elapsed deadline is reported as [`AuthError::Dependency`] so a slow
/// backend cannot hold a request open indefinitely.
pub async fn bounded<T, F>(limit: Duration, what: &str, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(AuthError::Dependency(format!(
            "{} timed out after {}ms",
            what,
            limit.as_millis()
        ))),
    }
}

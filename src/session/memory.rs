//! In-memory session store
//!
//! DashMap of session id to payload with an expiry instant. Expired entries
//! are dropped on read and by a periodic sweep task.

use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

use super::{session_not_found, short_id, SessionStore};
use crate::types::Result;

#[derive(Debug, Clone)]
struct StoredSession {
    payload: String,
    expires_at: Instant,
}

impl StoredSession {
    fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

/// Store statistics
#[derive(Debug, Clone, Default)]
pub struct StoreStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
    pub expired: u64,
}

#[derive(Default)]
pub struct MemorySessionStore {
    entries: DashMap<String, StoredSession>,
    hits: AtomicU64,
    misses: AtomicU64,
    expired: AtomicU64,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove expired entries, returning how many were dropped
    pub fn sweep(&self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, session| !session.is_expired());
        let removed = before.saturating_sub(self.entries.len());

        if removed > 0 {
            self.expired.fetch_add(removed as u64, Ordering::Relaxed);
            debug!(count = removed, "Swept expired sessions");
        }
        removed
    }

    pub fn stats(&self) -> StoreStats {
        StoreStats {
            entries: self.entries.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            expired: self.expired.load(Ordering::Relaxed),
        }
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn put(&self, session_id: &str, payload: &str, ttl: Duration) -> Result<()> {
        let stored = StoredSession {
            payload: payload.to_string(),
            expires_at: Instant::now() + ttl,
        };
        debug!(session = short_id(session_id), ttl_secs = ttl.as_secs(), "Session set");
        self.entries.insert(session_id.to_string(), stored);
        Ok(())
    }

    async fn get(&self, session_id: &str) -> Result<String> {
        if let Some(entry) = self.entries.get(session_id) {
            if !entry.is_expired() {
                self.hits.fetch_add(1, Ordering::Relaxed);
                return Ok(entry.payload.clone());
            }
            // Release the read guard before removing
            drop(entry);
            self.entries
                .remove_if(session_id, |_, session| session.is_expired());
            self.expired.fetch_add(1, Ordering::Relaxed);
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        Err(session_not_found())
    }

    async fn delete(&self, session_id: &str) -> Result<()> {
        if self.entries.remove(session_id).is_some() {
            debug!(session = short_id(session_id), "Session deleted");
        }
        Ok(())
    }
}

/// Spawn a background task that periodically sweeps expired sessions
pub fn spawn_sweep_task(store: Arc<MemorySessionStore>, interval: Duration) {
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(interval).await;
            let removed = store.sweep();
            let stats = store.stats();
            debug!(
                removed = removed,
                entries = stats.entries,
                "Session sweep completed"
            );
        }
    });

    info!("Session sweep task started (every {}s)", interval.as_secs());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AuthError;

    #[tokio::test]
    async fn test_put_get_delete() {
        let store = MemorySessionStore::new();

        assert!(matches!(store.get("s1").await, Err(AuthError::NotFound(_))));

        store.put("s1", "payload", Duration::from_secs(60)).await.unwrap();
        assert_eq!(store.get("s1").await.unwrap(), "payload");

        store.delete("s1").await.unwrap();
        assert!(store.get("s1").await.is_err());

        let stats = store.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 2);
    }

    #[tokio::test]
    async fn test_put_replaces() {
        let store = MemorySessionStore::new();
        store.put("s1", "first", Duration::from_secs(60)).await.unwrap();
        store.put("s1", "second", Duration::from_secs(60)).await.unwrap();

        assert_eq!(store.get("s1").await.unwrap(), "second");
        assert_eq!(store.stats().entries, 1);
    }

    #[tokio::test]
    async fn test_expiry_looks_like_absence() {
        let store = MemorySessionStore::new();
        store.put("s1", "short-lived", Duration::from_millis(10)).await.unwrap();
        assert!(store.get("s1").await.is_ok());

        tokio::time::sleep(Duration::from_millis(30)).await;

        assert!(matches!(store.get("s1").await, Err(AuthError::NotFound(_))));
        assert_eq!(store.stats().entries, 0);
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let store = MemorySessionStore::new();
        store.delete("never-existed").await.unwrap();

        store.put("s1", "x", Duration::from_millis(5)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        store.delete("s1").await.unwrap();
        store.delete("s1").await.unwrap();
    }

    #[tokio::test]
    async fn test_sweep() {
        let store = MemorySessionStore::new();
        store.put("old", "x", Duration::from_millis(5)).await.unwrap();
        store.put("new", "y", Duration::from_secs(60)).await.unwrap();

        tokio::time::sleep(Duration::from_millis(20)).await;

        assert_eq!(store.sweep(), 1);
        assert_eq!(store.stats().entries, 1);
        assert_eq!(store.stats().expired, 1);
    }
}

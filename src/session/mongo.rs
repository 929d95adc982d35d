//! MongoDB-backed session store

use async_trait::async_trait;
use bson::{doc, Document};
use chrono::Utc;
use std::time::Duration;
use tracing::{debug, info};

use super::{session_not_found, short_id, SessionStore};
use crate::db::mongo::{MongoClient, MongoCollection};
use crate::db::schemas::{SessionDoc, SESSION_COLLECTION};
use crate::types::{AuthError, Result};

#[derive(Clone)]
pub struct MongoSessionStore {
    collection: MongoCollection<SessionDoc>,
}

impl MongoSessionStore {
    pub async fn new(client: &MongoClient) -> Result<Self> {
        let collection = client.collection::<SessionDoc>(SESSION_COLLECTION).await?;
        info!("Session collection ready");
        Ok(Self { collection })
    }
}

/// Document to upsert for a session expiring `ttl` from now
fn session_doc(session_id: &str, payload: &str, ttl: Duration) -> Result<SessionDoc> {
    let ttl = chrono::Duration::from_std(ttl)
        .map_err(|e| AuthError::Internal(format!("Session TTL out of range: {}", e)))?;
    Ok(SessionDoc::new(session_id, payload, Utc::now() + ttl))
}

/// Key filter; a second `put` for the same id replaces the document
fn by_session_id(session_id: &str) -> Document {
    doc! { "session_id": session_id }
}

/// Matches the session only while `expires_at` is still ahead of `now`.
///
/// The TTL monitor lags, so expired documents are filtered here too.
fn live_session(session_id: &str, now: bson::DateTime) -> Document {
    doc! {
        "session_id": session_id,
        "expires_at": { "$gt": now },
    }
}

#[async_trait]
impl SessionStore for MongoSessionStore {
    async fn put(&self, session_id: &str, payload: &str, ttl: Duration) -> Result<()> {
        let doc = session_doc(session_id, payload, ttl)?;
        self.collection
            .upsert_one(by_session_id(session_id), doc)
            .await?;
        debug!(session = short_id(session_id), "Session stored");
        Ok(())
    }

    async fn get(&self, session_id: &str) -> Result<String> {
        let filter = live_session(session_id, bson::DateTime::now());

        match self.collection.find_one(filter).await? {
            Some(session) => Ok(session.payload),
            None => Err(session_not_found()),
        }
    }

    async fn delete(&self, session_id: &str) -> Result<()> {
        let removed = self
            .collection
            .delete_one(by_session_id(session_id))
            .await?;
        debug!(session = short_id(session_id), removed, "Session delete");
        Ok(())
    }
}

//! Session document schema
//!
//! One document per live session. MongoDB's TTL monitor removes documents
//! once `expires_at` passes; it runs about once a minute, so readers must
//! also filter on `expires_at` themselves.

use bson::{doc, oid::ObjectId, Document};
use chrono::{DateTime, Utc};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::Metadata;

/// Collection name for sessions
pub const SESSION_COLLECTION: &str = "sessions";

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct SessionDoc {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,

    #[serde(default)]
    pub metadata: Metadata,

    /// Opaque session id (cookie value)
    pub session_id: String,

    /// Serialized session payload
    pub payload: String,

    /// Stored as a BSON date so the TTL index applies
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub expires_at: DateTime<Utc>,
}

impl SessionDoc {
    pub fn new(session_id: &str, payload: &str, expires_at: DateTime<Utc>) -> Self {
        Self {
            id: None,
            metadata: Metadata::default(),
            session_id: session_id.to_string(),
            payload: payload.to_string(),
            expires_at,
        }
    }

    #[cfg(test)]
    pub(crate) fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }
}

impl IntoIndexes for SessionDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            (
                doc! { "session_id": 1 },
                Some(
                    IndexOptions::builder()
                        .unique(true)
                        .name("session_id_unique".to_string())
                        .build(),
                ),
            ),
            // TTL index for automatic expiration
            (
                doc! { "expires_at": 1 },
                Some(
                    IndexOptions::builder()
                        .expire_after(std::time::Duration::from_secs(0))
                        .name("expires_at_ttl".to_string())
                        .build(),
                ),
            ),
        ]
    }
}

impl MutMetadata for SessionDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expiry() {
        let live = SessionDoc::new("a", "{}", Utc::now() + chrono::Duration::minutes(10));
        assert!(!live.is_expired());

        let dead = SessionDoc::new("b", "{}", Utc::now() - chrono::Duration::seconds(1));
        assert!(dead.is_expired());
    }

    #[test]
    fn test_ttl_index_declared() {
        let indexes = SessionDoc::into_indices();
        assert_eq!(indexes.len(), 2);
        let ttl = indexes[1].1.as_ref().unwrap();
        assert_eq!(ttl.expire_after, Some(std::time::Duration::from_secs(0)));
    }
}

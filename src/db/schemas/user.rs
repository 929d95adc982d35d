//! User document schema

use bson::{doc, oid::ObjectId, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::Metadata;
use crate::db::users::User;
use crate::types::AuthError;

/// Collection name for users
pub const USER_COLLECTION: &str = "users";

/// User document stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct UserDoc {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    #[serde(default)]
    pub metadata: Metadata,

    /// Public user id (UUID, hyphenated)
    pub user_id: String,

    pub name: String,

    pub username: String,

    /// Unique; the sign-in lookup key
    pub email: String,

    /// Argon2 PHC hash
    pub password_hash: String,
}

impl From<&User> for UserDoc {
    fn from(user: &User) -> Self {
        Self {
            _id: None,
            metadata: Metadata::default(),
            user_id: user.id.to_string(),
            name: user.name.clone(),
            username: user.username.clone(),
            email: user.email.clone(),
            password_hash: user.password_hash.clone(),
        }
    }
}

impl TryFrom<UserDoc> for User {
    type Error = AuthError;

    fn try_from(doc: UserDoc) -> Result<Self, Self::Error> {
        let id = Uuid::parse_str(&doc.user_id)
            .map_err(|e| AuthError::Internal(format!("Corrupt user id '{}': {}", doc.user_id, e)))?;

        Ok(User {
            id,
            name: doc.name,
            username: doc.username,
            email: doc.email,
            password_hash: doc.password_hash,
        })
    }
}

impl IntoIndexes for UserDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            (
                doc! { "email": 1 },
                Some(
                    IndexOptions::builder()
                        .unique(true)
                        .name("email_unique".to_string())
                        .build(),
                ),
            ),
            (
                doc! { "user_id": 1 },
                Some(
                    IndexOptions::builder()
                        .unique(true)
                        .name("user_id_unique".to_string())
                        .build(),
                ),
            ),
        ]
    }
}

impl MutMetadata for UserDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_doc_round_trips_user() {
        let user = User {
            id: Uuid::new_v4(),
            name: "Ada".into(),
            username: "ada".into(),
            email: "ada@example.com".into(),
            password_hash: "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA".into(),
        };

        let doc = UserDoc::from(&user);
        assert_eq!(doc.user_id, user.id.to_string());

        let back = User::try_from(doc).unwrap();
        assert_eq!(back, user);
    }

    #[test]
    fn test_corrupt_user_id() {
        let doc = UserDoc {
            user_id: "not-a-uuid".into(),
            ..Default::default()
        };
        assert!(matches!(User::try_from(doc), Err(AuthError::Internal(_))));
    }
}

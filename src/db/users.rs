//! User records
//!
//! The gateway only needs two things from the user store: look a user up by
//! email, and create a user (with email uniqueness enforced). Both MongoDB and
//! in-memory implementations are provided; the in-memory one backs dev mode
//! and tests.

use async_trait::async_trait;
use bson::doc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

use crate::db::mongo::{MongoClient, MongoCollection};
use crate::db::schemas::{UserDoc, USER_COLLECTION};
use crate::types::{AuthError, Result};

/// Stored user record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub username: String,
    pub email: String,
    /// Argon2 PHC hash, never the raw password
    pub password_hash: String,
}

impl User {
    /// Client-facing projection without the credential
    pub fn view(&self) -> UserView {
        UserView {
            id: self.id,
            name: self.name.clone(),
            username: self.username.clone(),
            email: self.email.clone(),
        }
    }
}

/// User as returned over HTTP
#[derive(Debug, Clone, Serialize)]
pub struct UserView {
    pub id: Uuid,
    pub name: String,
    pub username: String,
    pub email: String,
}

/// Fields needed to create a user; the password is already hashed
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// `NotFound` when no user has this email
    async fn find_by_email(&self, email: &str) -> Result<User>;

    /// `Conflict` when the email is already registered
    async fn create(&self, user: NewUser) -> Result<User>;
}

fn not_found(email: &str) -> AuthError {
    debug!(email, "No user with this email");
    AuthError::NotFound("no such user found".into())
}

fn duplicate() -> AuthError {
    AuthError::Conflict("user already exists".into())
}

/// In-memory user store keyed by email
#[derive(Default)]
pub struct MemoryUserRepository {
    users: DashMap<String, User>,
}

impl MemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.users.len()
    }
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn find_by_email(&self, email: &str) -> Result<User> {
        self.users
            .get(email)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| not_found(email))
    }

    async fn create(&self, new_user: NewUser) -> Result<User> {
        match self.users.entry(new_user.email.clone()) {
            Entry::Occupied(_) => Err(duplicate()),
            Entry::Vacant(slot) => {
                let user = User {
                    id: Uuid::new_v4(),
                    name: new_user.name,
                    username: new_user.username,
                    email: new_user.email,
                    password_hash: new_user.password_hash,
                };
                slot.insert(user.clone());
                Ok(user)
            }
        }
    }
}

/// MongoDB-backed user store
#[derive(Clone)]
pub struct MongoUserRepository {
    collection: MongoCollection<UserDoc>,
}

impl MongoUserRepository {
    pub async fn new(client: &MongoClient) -> Result<Self> {
        let collection = client.collection::<UserDoc>(USER_COLLECTION).await?;
        info!("User collection ready");
        Ok(Self { collection })
    }
}

#[async_trait]
impl UserRepository for MongoUserRepository {
    async fn find_by_email(&self, email: &str) -> Result<User> {
        match self.collection.find_one(doc! { "email": email }).await? {
            Some(doc) => User::try_from(doc),
            None => Err(not_found(email)),
        }
    }

    async fn create(&self, new_user: NewUser) -> Result<User> {
        let user = User {
            id: Uuid::new_v4(),
            name: new_user.name,
            username: new_user.username,
            email: new_user.email,
            password_hash: new_user.password_hash,
        };

        match self.collection.insert_one(UserDoc::from(&user)).await {
            Ok(()) => Ok(user),
            Err(AuthError::Conflict(_)) => Err(duplicate()),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            name: "Ada Lovelace".into(),
            username: "ada".into(),
            email: email.into(),
            password_hash: "$argon2id$placeholder".into(),
        }
    }

    #[tokio::test]
    async fn test_create_then_find() {
        let repo = MemoryUserRepository::new();
        let created = repo.create(new_user("ada@example.com")).await.unwrap();

        let found = repo.find_by_email("ada@example.com").await.unwrap();
        assert_eq!(found, created);
        assert_eq!(repo.len(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let repo = MemoryUserRepository::new();
        repo.create(new_user("ada@example.com")).await.unwrap();

        let second = repo.create(new_user("ada@example.com")).await;
        assert!(matches!(second, Err(AuthError::Conflict(_))));
        assert_eq!(repo.len(), 1);
    }

    #[test]
    fn test_missing_user() {
        let repo = MemoryUserRepository::new();
        assert!(matches!(
            tokio_test::block_on(repo.find_by_email("ghost@example.com")),
            Err(AuthError::NotFound(_))
        ));
    }

    #[test]
    fn test_view_omits_credential() {
        let user = User {
            id: Uuid::new_v4(),
            name: "Ada".into(),
            username: "ada".into(),
            email: "ada@example.com".into(),
            password_hash: "$argon2id$secret-hash".into(),
        };
        let json = serde_json::to_string(&user.view()).unwrap();
        assert!(!json.contains("argon2"));
        assert!(json.contains("ada@example.com"));
    }
}

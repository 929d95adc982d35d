//! MongoDB client and typed collection wrapper
//!
//! Schemas declare their own indexes through [`IntoIndexes`]; they are
//! applied when the collection handle is created, once per process.

use bson::{doc, DateTime, Document};
use mongodb::{
    error::{ErrorKind, WriteFailure},
    options::IndexOptions,
    Client, Collection, IndexModel,
};
use serde::{de::DeserializeOwned, Serialize};
use tracing::info;

use crate::db::schemas::Metadata;
use crate::types::AuthError;

/// MongoDB duplicate key error code
const DUPLICATE_KEY: i32 = 11000;

/// Trait for schemas that provide index definitions
pub trait IntoIndexes {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)>;
}

/// Trait for schemas with mutable metadata
pub trait MutMetadata {
    fn mut_metadata(&mut self) -> &mut Metadata;
}

/// MongoDB client wrapper
#[derive(Clone)]
pub struct MongoClient {
    client: Client,
    db_name: String,
}

impl MongoClient {
    /// Connect and ping, failing fast when the server is unreachable
    pub async fn new(uri: &str, db_name: &str) -> Result<Self, AuthError> {
        info!("Connecting to MongoDB");

        let timeout_uri = if uri.contains('?') {
            format!("{}&serverSelectionTimeoutMS=3000&connectTimeoutMS=3000", uri)
        } else {
            format!("{}?serverSelectionTimeoutMS=3000&connectTimeoutMS=3000", uri)
        };

        let client = Client::with_uri_str(&timeout_uri)
            .await
            .map_err(|e| AuthError::Dependency(format!("Failed to connect to MongoDB: {}", e)))?;

        client
            .database(db_name)
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| AuthError::Dependency(format!("MongoDB ping failed: {}", e)))?;

        info!("Connected to MongoDB database '{}'", db_name);

        Ok(Self {
            client,
            db_name: db_name.to_string(),
        })
    }

    /// Get a typed collection with its indexes applied
    pub async fn collection<T>(&self, name: &str) -> Result<MongoCollection<T>, AuthError>
    where
        T: Serialize + DeserializeOwned + Unpin + Send + Sync + Default + IntoIndexes + MutMetadata,
    {
        MongoCollection::new(&self.client, &self.db_name, name).await
    }
}

/// Typed MongoDB collection
#[derive(Debug, Clone)]
pub struct MongoCollection<T>
where
    T: Serialize + DeserializeOwned + Unpin + Send + Sync,
{
    inner: Collection<T>,
}

impl<T> MongoCollection<T>
where
    T: Serialize + DeserializeOwned + Unpin + Send + Sync + Default + IntoIndexes + MutMetadata,
{
    pub async fn new(
        client: &Client,
        db_name: &str,
        collection_name: &str,
    ) -> Result<Self, AuthError> {
        let collection = client.database(db_name).collection::<T>(collection_name);
        let mongo_collection = MongoCollection { inner: collection };

        mongo_collection.apply_indexes().await?;

        Ok(mongo_collection)
    }

    async fn apply_indexes(&self) -> Result<(), AuthError> {
        let schema_indices = T::into_indices();

        if schema_indices.is_empty() {
            return Ok(());
        }

        let indices: Vec<IndexModel> = schema_indices
            .into_iter()
            .map(|(keys, opts)| IndexModel::builder().keys(keys).options(opts).build())
            .collect();

        self.inner
            .create_indexes(indices)
            .await
            .map_err(|e| AuthError::Dependency(format!("Failed to create indexes: {}", e)))?;

        Ok(())
    }

    /// Insert a document, stamping metadata.
    ///
    /// A unique-index violation is reported as [`AuthError::Conflict`].
    pub async fn insert_one(&self, mut item: T) -> Result<(), AuthError> {
        stamp(item.mut_metadata());

        self.inner.insert_one(item).await.map_err(|e| {
            if is_duplicate_key(&e) {
                AuthError::Conflict("duplicate key".into())
            } else {
                AuthError::Dependency(format!("Insert failed: {}", e))
            }
        })?;

        Ok(())
    }

    /// Insert or replace the document matching `filter`
    pub async fn upsert_one(&self, filter: Document, mut item: T) -> Result<(), AuthError> {
        stamp(item.mut_metadata());

        self.inner
            .replace_one(filter, item)
            .upsert(true)
            .await
            .map_err(|e| AuthError::Dependency(format!("Upsert failed: {}", e)))?;

        Ok(())
    }

    /// Find one live (not soft-deleted) document by filter
    pub async fn find_one(&self, filter: Document) -> Result<Option<T>, AuthError> {
        let mut full_filter = filter;
        full_filter.insert("metadata.is_deleted", doc! { "$ne": true });

        self.inner
            .find_one(full_filter)
            .await
            .map_err(|e| AuthError::Dependency(format!("Find failed: {}", e)))
    }

    /// Hard delete; returns how many documents were removed
    pub async fn delete_one(&self, filter: Document) -> Result<u64, AuthError> {
        let result = self
            .inner
            .delete_one(filter)
            .await
            .map_err(|e| AuthError::Dependency(format!("Delete failed: {}", e)))?;

        Ok(result.deleted_count)
    }
}

fn stamp(metadata: &mut Metadata) {
    metadata.is_deleted = false;
    metadata.created_at = Some(DateTime::now());
    metadata.updated_at = Some(DateTime::now());
}

/// Whether a driver error is a unique index violation (E11000)
pub fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(write_error)) => {
            write_error.code == DUPLICATE_KEY
        }
        _ => err.to_string().contains("E11000"),
    }
}

//! Read-only access to the item / recipe metadata documents.
//!
//! Documents live in a single JSONB table:
//!
//! ```sql
//! CREATE TABLE metadata_documents (
//!     collection TEXT   NOT NULL,   -- e.g. `en`, `de_recipes`
//!     id         BIGINT NOT NULL,
//!     document   JSONB  NOT NULL,
//!     PRIMARY KEY (collection, id)
//! );
//! ```

use anyhow::Context;
use async_trait::async_trait;
use serde_json::Value;
use sqlx::PgPool;
use thiserror::Error;

use crate::error::GatewayError;
use crate::keys::MetadataQuery;

/// A metadata document (always a JSON object).
pub type Document = Value;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("no document matches")]
    NotFound,

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl From<StoreError> for GatewayError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound => GatewayError::ItemNotFound,
            StoreError::Unavailable(msg) => GatewayError::StoreUnavailable(msg),
        }
    }
}

impl From<anyhow::Error> for StoreError {
    fn from(e: anyhow::Error) -> Self {
        StoreError::Unavailable(format!("{e:#}"))
    }
}

#[async_trait]
pub trait MetadataRepository: Send + Sync {
    /// The single document of `collection` matching `query`.
    async fn find_one(&self, collection: &str, query: &MetadataQuery)
        -> Result<Document, StoreError>;

    /// Every document of `collection`, ordered by id.
    async fn find_all(&self, collection: &str) -> Result<Vec<Document>, StoreError>;

    /// Names of every collection in the store.
    async fn collections(&self) -> Result<Vec<String>, StoreError>;

    async fn ping(&self) -> Result<(), StoreError>;
}

/// Postgres-backed repository; owns the connection pool.
pub struct PgMetadataRepository {
    db: PgPool,
}

impl PgMetadataRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl MetadataRepository for PgMetadataRepository {
    async fn find_one(
        &self,
        collection: &str,
        query: &MetadataQuery,
    ) -> Result<Document, StoreError> {
        let MetadataQuery::Id(id) = *query else {
            // An empty filter matches the first document, like `findOne({})`.
            let first = sqlx::query_scalar::<_, Value>(
                "SELECT document FROM metadata_documents WHERE collection = $1 ORDER BY id LIMIT 1",
            )
            .bind(collection)
            .fetch_optional(&self.db)
            .await
            .with_context(|| format!("fetching first document of {collection}"))?;
            return first.map(strip_internal).ok_or(StoreError::NotFound);
        };

        let doc = sqlx::query_scalar::<_, Value>(
            "SELECT document FROM metadata_documents WHERE collection = $1 AND id = $2",
        )
        .bind(collection)
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .with_context(|| format!("fetching document {id} of {collection}"))?;

        doc.map(strip_internal).ok_or(StoreError::NotFound)
    }

    async fn find_all(&self, collection: &str) -> Result<Vec<Document>, StoreError> {
        let docs = sqlx::query_scalar::<_, Value>(
            "SELECT document FROM metadata_documents WHERE collection = $1 ORDER BY id",
        )
        .bind(collection)
        .fetch_all(&self.db)
        .await
        .with_context(|| format!("fetching collection {collection}"))?;

        Ok(docs.into_iter().map(strip_internal).collect())
    }

    async fn collections(&self) -> Result<Vec<String>, StoreError> {
        let names = sqlx::query_scalar::<_, String>(
            "SELECT DISTINCT collection FROM metadata_documents ORDER BY collection",
        )
        .fetch_all(&self.db)
        .await
        .context("listing collections")?;
        Ok(names)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1")
            .execute(&self.db)
            .await
            .context("pinging metadata store")?;
        Ok(())
    }
}

/// Drop store-internal keys before a document leaves the gateway.
pub fn strip_internal(mut doc: Document) -> Document {
    if let Some(obj) = doc.as_object_mut() {
        obj.remove("_id");
    }
    doc
}

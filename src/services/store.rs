use async_trait::async_trait;
use futures::stream::BoxStream;
use thiserror::Error;

use crate::modules::dedup::model::{Document, DocumentId};

/// Hard per-batch operation limit of the remote store.
pub const MAX_BATCH_OPERATIONS: usize = 500;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] mongodb::error::Error),
    #[error("Document in '{0}' has no _id")]
    MissingId(String),
    #[error("Store error: {0}")]
    Backend(String),
}

pub type DocumentStream = BoxStream<'static, Result<Document, StoreError>>;

/// Address of a single document.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentRef {
    pub collection: String,
    pub id: DocumentId,
}

/// The operations the deduplicator needs from a document database.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    type Batch: WriteBatch;

    /// Streams every document of `collection` in the order the store delivers them.
    async fn stream(&self, collection: &str) -> Result<DocumentStream, StoreError>;

    fn document(&self, collection: &str, id: DocumentId) -> DocumentRef {
        DocumentRef {
            collection: collection.to_string(),
            id,
        }
    }

    fn batch(&self) -> Self::Batch;
}

/// Accumulates deletes and applies them with a single commit.
#[async_trait]
pub trait WriteBatch: Send {
    fn delete(&mut self, doc: DocumentRef);

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Applies the queued deletes, returning how many documents were removed.
    async fn commit(self) -> Result<u64, StoreError>;
}

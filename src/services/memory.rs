//! In-memory document store.
//!
//! Implements [`DocumentStore`] over plain vectors and records every stream
//! and commit so callers can assert on the exact calls made. Failures can be
//! injected per collection or per commit.

use async_trait::async_trait;
use futures::StreamExt;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::modules::dedup::model::Document;
use crate::services::store::{DocumentRef, DocumentStore, DocumentStream, StoreError, WriteBatch};

/// Record of a store call.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreOp {
    Stream { collection: String },
    Commit { deletes: usize },
}

#[derive(Debug, Default)]
struct State {
    collections: HashMap<String, Vec<Document>>,
    ops: Vec<StoreOp>,
    commits: usize,
    failing_streams: HashSet<String>,
    failing_commit: Option<usize>,
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<State>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Appends documents to a collection, preserving insertion order.
    pub fn insert(&self, collection: &str, docs: impl IntoIterator<Item = Document>) {
        self.lock()
            .collections
            .entry(collection.to_string())
            .or_default()
            .extend(docs);
    }

    pub fn documents(&self, collection: &str) -> Vec<Document> {
        self.lock()
            .collections
            .get(collection)
            .cloned()
            .unwrap_or_default()
    }

    pub fn ids(&self, collection: &str) -> Vec<String> {
        self.documents(collection)
            .iter()
            .map(|d| d.id.to_string())
            .collect()
    }

    pub fn ops(&self) -> Vec<StoreOp> {
        self.lock().ops.clone()
    }

    /// Sizes of every commit issued so far, in order.
    pub fn commit_sizes(&self) -> Vec<usize> {
        self.lock()
            .ops
            .iter()
            .filter_map(|op| match op {
                StoreOp::Commit { deletes } => Some(*deletes),
                _ => None,
            })
            .collect()
    }

    /// Makes every stream of `collection` fail.
    pub fn fail_stream(&self, collection: &str) {
        self.lock().failing_streams.insert(collection.to_string());
    }

    /// Makes the `n`th commit (zero-based, counted across the store's lifetime) fail.
    pub fn fail_commit(&self, n: usize) {
        self.lock().failing_commit = Some(n);
    }
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    type Batch = InMemoryBatch;

    async fn stream(&self, collection: &str) -> Result<DocumentStream, StoreError> {
        let mut state = self.lock();
        state.ops.push(StoreOp::Stream {
            collection: collection.to_string(),
        });

        if state.failing_streams.contains(collection) {
            return Err(StoreError::Backend(format!(
                "stream of '{}' unavailable",
                collection
            )));
        }

        let docs = state.collections.get(collection).cloned().unwrap_or_default();
        Ok(futures::stream::iter(docs.into_iter().map(Ok)).boxed())
    }

    fn batch(&self) -> InMemoryBatch {
        InMemoryBatch {
            store: self.clone(),
            deletes: Vec::new(),
        }
    }
}

pub struct InMemoryBatch {
    store: InMemoryStore,
    deletes: Vec<DocumentRef>,
}

#[async_trait]
impl WriteBatch for InMemoryBatch {
    fn delete(&mut self, doc: DocumentRef) {
        self.deletes.push(doc);
    }

    fn len(&self) -> usize {
        self.deletes.len()
    }

    async fn commit(self) -> Result<u64, StoreError> {
        let mut state = self.store.lock();
        let index = state.commits;
        state.commits += 1;

        if state.failing_commit == Some(index) {
            return Err(StoreError::Backend(format!("commit #{} rejected", index)));
        }

        state.ops.push(StoreOp::Commit {
            deletes: self.deletes.len(),
        });

        let mut deleted = 0;
        for r in &self.deletes {
            if let Some(docs) = state.collections.get_mut(&r.collection) {
                let before = docs.len();
                docs.retain(|d| d.id != r.id);
                deleted += (before - docs.len()) as u64;
            }
        }

        Ok(deleted)
    }
}

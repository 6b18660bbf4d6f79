use async_trait::async_trait;
use bson::{doc, Bson};
use futures::{StreamExt, TryStreamExt};
use mongodb::Database;
use std::collections::HashMap;

use crate::modules::dedup::model::Document;
use crate::services::store::{DocumentRef, DocumentStore, DocumentStream, StoreError, WriteBatch};

/// [`DocumentStore`] backed by a MongoDB database.
#[derive(Clone, Debug)]
pub struct MongoStore {
    db: Database,
}

impl MongoStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl DocumentStore for MongoStore {
    type Batch = MongoBatch;

    async fn stream(&self, collection: &str) -> Result<DocumentStream, StoreError> {
        let name = collection.to_string();
        let cursor = self
            .db
            .collection::<bson::Document>(collection)
            .find(doc! {})
            .await?;

        let stream = cursor.map_err(StoreError::from).and_then(move |raw| {
            let result = Document::from_raw(raw).ok_or_else(|| StoreError::MissingId(name.clone()));
            futures::future::ready(result)
        });

        Ok(stream.boxed())
    }

    fn batch(&self) -> MongoBatch {
        MongoBatch {
            db: self.db.clone(),
            deletes: Vec::new(),
        }
    }
}

/// Pending deletes, applied as one `deleteMany` per collection on commit.
pub struct MongoBatch {
    db: Database,
    deletes: Vec<DocumentRef>,
}

#[async_trait]
impl WriteBatch for MongoBatch {
    fn delete(&mut self, doc: DocumentRef) {
        self.deletes.push(doc);
    }

    fn len(&self) -> usize {
        self.deletes.len()
    }

    async fn commit(self) -> Result<u64, StoreError> {
        let mut by_collection: HashMap<String, Vec<Bson>> = HashMap::new();
        for r in self.deletes {
            by_collection
                .entry(r.collection)
                .or_default()
                .push(r.id.into_bson());
        }

        let mut deleted = 0;
        for (collection, ids) in by_collection {
            let result = self
                .db
                .collection::<bson::Document>(&collection)
                .delete_many(doc! { "_id": { "$in": ids } })
                .await?;
            deleted += result.deleted_count;
        }

        Ok(deleted)
    }
}

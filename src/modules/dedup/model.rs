use bson::{oid::ObjectId, Bson};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

/// Identifier of a stored document.
///
/// Wraps the raw `_id` value so that deletes address exactly the value the
/// store handed out, while reports render it as a plain string.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentId(Bson);

impl DocumentId {
    pub fn new(value: Bson) -> Self {
        Self(value)
    }

    pub fn into_bson(self) -> Bson {
        self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Bson::String(s) => f.write_str(s),
            Bson::ObjectId(oid) => f.write_str(&oid.to_hex()),
            other => write!(f, "{}", other),
        }
    }
}

impl From<&str> for DocumentId {
    fn from(value: &str) -> Self {
        Self(Bson::String(value.to_string()))
    }
}

impl From<String> for DocumentId {
    fn from(value: String) -> Self {
        Self(Bson::String(value))
    }
}

impl From<ObjectId> for DocumentId {
    fn from(value: ObjectId) -> Self {
        Self(Bson::ObjectId(value))
    }
}

impl Serialize for DocumentId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A document as streamed from a collection: its id plus every other field.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: DocumentId,
    pub fields: bson::Document,
}

impl Document {
    pub fn new(id: impl Into<DocumentId>, fields: bson::Document) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }

    /// Splits a raw store document into id and fields. Returns `None` when
    /// the document has no `_id`.
    pub fn from_raw(mut raw: bson::Document) -> Option<Self> {
        let id = raw.remove("_id")?;
        Some(Self {
            id: DocumentId::new(id),
            fields: raw,
        })
    }

    /// Looks up a field, mapping absent and `null` alike to `KeyValue::Missing`.
    pub fn key_value(&self, field: &str) -> KeyValue {
        match self.fields.get(field) {
            None | Some(Bson::Null) | Some(Bson::Undefined) => KeyValue::Missing,
            Some(value) => KeyValue::Present(canonical(value)),
        }
    }

    pub fn key(&self, key_fields: &[String]) -> DedupKey {
        DedupKey(key_fields.iter().map(|f| self.key_value(f)).collect())
    }
}

fn canonical(value: &Bson) -> String {
    normalize_numbers(value.clone())
        .into_relaxed_extjson()
        .to_string()
}

/// Collapses numbers that compare equal across types (`2020`, `2020_i64`,
/// `2020.0`, `-0.0`/`0.0`) onto a single Int64 form.
fn normalize_numbers(value: Bson) -> Bson {
    match value {
        Bson::Int32(n) => Bson::Int64(n.into()),
        Bson::Double(d)
            if d.fract() == 0.0 && d >= i64::MIN as f64 && d < i64::MAX as f64 =>
        {
            Bson::Int64(d as i64)
        }
        Bson::Array(items) => Bson::Array(items.into_iter().map(normalize_numbers).collect()),
        Bson::Document(doc) => Bson::Document(
            doc.into_iter()
                .map(|(k, v)| (k, normalize_numbers(v)))
                .collect(),
        ),
        other => other,
    }
}

/// One component of a [`DedupKey`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KeyValue {
    Missing,
    Present(String),
}

/// Ordered tuple of field values that decides whether two documents are duplicates.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DedupKey(pub Vec<KeyValue>);

/// Duplicate detection state for a single collection pass.
///
/// The first document observed with a given key is kept; every later one is
/// queued for deletion in stream order.
#[derive(Debug, Default)]
pub struct DuplicateScan {
    key_fields: Vec<String>,
    seen: HashMap<DedupKey, DocumentId>,
    duplicates: Vec<DocumentId>,
    scanned: u64,
}

impl DuplicateScan {
    pub fn new(key_fields: &[String]) -> Self {
        Self {
            key_fields: key_fields.to_vec(),
            ..Default::default()
        }
    }

    /// Records a document. Returns `true` when it duplicates an earlier one.
    pub fn observe(&mut self, doc: Document) -> bool {
        self.scanned += 1;
        let key = doc.key(&self.key_fields);

        if self.seen.contains_key(&key) {
            self.duplicates.push(doc.id);
            true
        } else {
            self.seen.insert(key, doc.id);
            false
        }
    }

    pub fn scanned(&self) -> u64 {
        self.scanned
    }

    pub fn distinct(&self) -> usize {
        self.seen.len()
    }

    /// Id kept for `key`, if any document carried it.
    pub fn survivor(&self, key: &DedupKey) -> Option<&DocumentId> {
        self.seen.get(key)
    }

    pub fn duplicates(&self) -> &[DocumentId] {
        &self.duplicates
    }

    pub fn into_duplicates(self) -> Vec<DocumentId> {
        self.duplicates
    }
}

//! Pluggable store trait for prospect documents.
//!
//! The listing and tagging flows only need a small capability set from the
//! backing document store: point lookups, an ordered range scan with
//! list-tag pushdown, atomic write batches with merge semantics, and run
//! creation. Backends implement [`ProspectStore`]; the rest of the crate
//! holds an `Arc<dyn ProspectStore>` injected at startup.

use async_trait::async_trait;

use crate::models::{
    union_list_id, Document, EnrichmentRun, NewEnrichmentRun, ProspectPatch, ProspectRecord,
};

/// Largest write batch any backend accepts.
pub const MAX_BATCH_WRITES: usize = 500;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors from store backend operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(String),
    #[error("Backend unavailable: {0}")]
    Unavailable(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("Write batch of {size} operations exceeds the limit of {limit}")]
    BatchTooLarge { size: usize, limit: usize },
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Serialization(e.to_string())
    }
}

/// Position in the `(name, id)` ordering to resume a scan after.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cursor {
    pub name: String,
    pub id: String,
}

impl Cursor {
    pub fn after(record: &ProspectRecord) -> Self {
        Self {
            name: record.sort_name().to_string(),
            id: record.id.clone(),
        }
    }

    /// Whether a record sorts strictly after this position.
    pub fn precedes(&self, record: &ProspectRecord) -> bool {
        (record.sort_name(), record.id.as_str()) > (self.name.as_str(), self.id.as_str())
    }
}

/// An ordered range query, sorted by `name` then document id.
#[derive(Debug, Clone, Default)]
pub struct ProspectQuery {
    /// Match records whose `list_ids` contains any of these tags. Empty
    /// means no membership predicate.
    pub list_ids_any: Vec<String>,
    pub start_after: Option<Cursor>,
    pub limit: usize,
}

impl ProspectQuery {
    /// Whether a record satisfies the membership predicate.
    pub fn admits(&self, record: &ProspectRecord) -> bool {
        self.list_ids_any.is_empty()
            || record
                .list_ids
                .iter()
                .any(|tag| self.list_ids_any.contains(tag))
    }
}

/// A single write inside a batch.
#[derive(Debug, Clone)]
pub enum WriteOp {
    /// Merge a patch into a document, creating it if absent, and optionally
    /// union a tag into its `list_ids`.
    Merge {
        id: String,
        patch: ProspectPatch,
        add_list_id: Option<String>,
    },
    /// Replace a whole document.
    Replace { id: String, document: Document },
}

impl WriteOp {
    /// Apply this write to the stored fields of its target document.
    pub fn apply(&self, existing: Option<Document>) -> Document {
        match self {
            WriteOp::Merge {
                patch, add_list_id, ..
            } => {
                let mut document = existing.unwrap_or_default();
                patch.apply(&mut document);
                if let Some(tag) = add_list_id {
                    union_list_id(&mut document, tag);
                }
                document
            }
            WriteOp::Replace { document, .. } => document.clone(),
        }
    }

    pub fn target_id(&self) -> &str {
        match self {
            WriteOp::Merge { id, .. } | WriteOp::Replace { id, .. } => id,
        }
    }
}

/// Writes committed together or not at all.
#[derive(Debug, Clone, Default)]
pub struct WriteBatch {
    ops: Vec<WriteOp>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn merge(&mut self, id: &str, patch: &ProspectPatch, add_list_id: Option<&str>) {
        self.ops.push(WriteOp::Merge {
            id: id.to_string(),
            patch: patch.clone(),
            add_list_id: add_list_id.map(str::to_string),
        });
    }

    /// Replace a document with the stored form of `record`.
    pub fn replace(&mut self, record: &ProspectRecord) -> serde_json::Result<()> {
        let document = record.to_document()?;
        self.replace_document(&record.id, document);
        Ok(())
    }

    pub fn replace_document(&mut self, id: &str, document: Document) {
        self.ops.push(WriteOp::Replace {
            id: id.to_string(),
            document,
        });
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn ops(&self) -> &[WriteOp] {
        &self.ops
    }

    pub fn into_ops(self) -> Vec<WriteOp> {
        self.ops
    }

    /// Reject batches over the backend limit before touching storage.
    pub fn check_size(&self) -> StoreResult<()> {
        if self.ops.len() > MAX_BATCH_WRITES {
            return Err(StoreError::BatchTooLarge {
                size: self.ops.len(),
                limit: MAX_BATCH_WRITES,
            });
        }
        Ok(())
    }
}

/// Trait for prospect storage backends.
///
/// Implementations must be thread-safe; requests run concurrently and share
/// one handle.
#[async_trait]
pub trait ProspectStore: Send + Sync {
    /// Point lookup by document id.
    async fn get(&self, id: &str) -> StoreResult<Option<ProspectRecord>>;

    /// Ordered range scan with list-tag pushdown.
    async fn query(&self, query: &ProspectQuery) -> StoreResult<Vec<ProspectRecord>>;

    /// First `limit` records in the store's default (document id) order.
    async fn sample(&self, limit: usize) -> StoreResult<Vec<ProspectRecord>>;

    /// Commit a batch atomically.
    async fn commit(&self, batch: WriteBatch) -> StoreResult<()>;

    /// Create an enrichment run, assigning its identifier.
    async fn create_run(&self, run: NewEnrichmentRun) -> StoreResult<EnrichmentRun>;

    async fn get_run(&self, id: &str) -> StoreResult<Option<EnrichmentRun>>;
}

/// Generate a new document identifier.
pub fn new_document_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

//! In-memory prospect store for single-process operation.
//!
//! Backed by ordered maps behind a lock. State is not persisted across
//! restarts. Each batch is applied under one write lock, which makes it
//! atomic with respect to concurrent readers and writers.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::store::{
    new_document_id, ProspectQuery, ProspectStore, StoreResult, WriteBatch,
};
use crate::models::{Document, EnrichmentRun, NewEnrichmentRun, ProspectRecord};

/// A stored document and the record read from it.
#[derive(Debug, Clone)]
struct StoredProspect {
    document: Document,
    record: ProspectRecord,
}

impl StoredProspect {
    fn new(id: &str, document: Document) -> StoreResult<Self> {
        let record = ProspectRecord::from_document(id, document.clone())?;
        Ok(Self { document, record })
    }
}

/// In-memory prospect store.
#[derive(Clone, Default)]
pub struct InMemoryProspectStore {
    prospects: Arc<RwLock<BTreeMap<String, StoredProspect>>>,
    runs: Arc<RwLock<BTreeMap<String, EnrichmentRun>>>,
}

impl InMemoryProspectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with records.
    #[cfg(test)]
    pub(crate) fn with_records(records: impl IntoIterator<Item = ProspectRecord>) -> Self {
        let prospects = records
            .into_iter()
            .map(|r| {
                let document = r.to_document().expect("record serializes");
                let stored = StoredProspect::new(&r.id, document).expect("record parses");
                (r.id, stored)
            })
            .collect::<BTreeMap<_, _>>();
        Self {
            prospects: Arc::new(RwLock::new(prospects)),
            runs: Arc::default(),
        }
    }

    pub async fn len(&self) -> usize {
        self.prospects.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.prospects.read().await.is_empty()
    }

    pub async fn runs(&self) -> Vec<EnrichmentRun> {
        self.runs.read().await.values().cloned().collect()
    }

    /// Stored fields of a document, as written.
    pub async fn document(&self, id: &str) -> Option<Document> {
        self.prospects
            .read()
            .await
            .get(id)
            .map(|stored| stored.document.clone())
    }
}

#[async_trait]
impl ProspectStore for InMemoryProspectStore {
    async fn get(&self, id: &str) -> StoreResult<Option<ProspectRecord>> {
        Ok(self
            .prospects
            .read()
            .await
            .get(id)
            .map(|stored| stored.record.clone()))
    }

    async fn query(&self, query: &ProspectQuery) -> StoreResult<Vec<ProspectRecord>> {
        let prospects = self.prospects.read().await;

        let mut matching: Vec<&ProspectRecord> = prospects
            .values()
            .map(|stored| &stored.record)
            .filter(|r| query.admits(r))
            .filter(|r| {
                query
                    .start_after
                    .as_ref()
                    .map_or(true, |cursor| cursor.precedes(r))
            })
            .collect();
        matching.sort_by(|a, b| {
            (a.sort_name(), a.id.as_str()).cmp(&(b.sort_name(), b.id.as_str()))
        });

        Ok(matching
            .into_iter()
            .take(query.limit)
            .cloned()
            .collect())
    }

    async fn sample(&self, limit: usize) -> StoreResult<Vec<ProspectRecord>> {
        Ok(self
            .prospects
            .read()
            .await
            .values()
            .take(limit)
            .map(|stored| stored.record.clone())
            .collect())
    }

    async fn commit(&self, batch: WriteBatch) -> StoreResult<()> {
        batch.check_size()?;

        let mut prospects = self.prospects.write().await;
        let mut staged: BTreeMap<String, StoredProspect> = BTreeMap::new();
        for op in batch.ops() {
            let id = op.target_id();
            let existing = staged
                .get(id)
                .or_else(|| prospects.get(id))
                .map(|stored| stored.document.clone());
            let document = op.apply(existing);
            staged.insert(id.to_string(), StoredProspect::new(id, document)?);
        }
        prospects.extend(staged);
        Ok(())
    }

    async fn create_run(&self, run: NewEnrichmentRun) -> StoreResult<EnrichmentRun> {
        let run = run.with_id(new_document_id());
        self.runs.write().await.insert(run.id.clone(), run.clone());
        Ok(run)
    }

    async fn get_run(&self, id: &str) -> StoreResult<Option<EnrichmentRun>> {
        Ok(self.runs.read().await.get(id).cloned())
    }
}

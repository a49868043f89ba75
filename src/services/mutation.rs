//! Chunked batch mutation pipeline.
//!
//! Applies one merge patch to every prospect in an id set. Ids are grouped
//! into chunks of [`BATCH_CHUNK_SIZE`]; each chunk is one atomic store batch,
//! committed before the next is built. Chunks are independent: a failed
//! commit stops the pipeline but earlier chunks stay applied.

use std::sync::Arc;

use tracing::{debug, error};

use super::chunk::{chunk_count, chunked, BATCH_CHUNK_SIZE};
use crate::models::ProspectPatch;
use crate::repository::{ProspectStore, StoreError, WriteBatch};

/// A chunk commit failed after `committed_chunks` chunks had been applied.
#[derive(Debug, thiserror::Error)]
#[error("Batch commit failed after {committed_chunks} of {total_chunks} chunks ({affected} prospects written): {source}")]
pub struct BatchError {
    pub committed_chunks: usize,
    pub total_chunks: usize,
    /// Ids written by the committed chunks.
    pub affected: usize,
    #[source]
    pub source: StoreError,
}

/// Applies merge patches to prospect sets in committed chunks.
#[derive(Clone)]
pub struct BatchMutator {
    store: Arc<dyn ProspectStore>,
}

impl BatchMutator {
    pub fn new(store: Arc<dyn ProspectStore>) -> Self {
        Self { store }
    }

    /// Merge `patch` into every listed prospect, unioning `list_tag` into
    /// `list_ids` when given.
    ///
    /// Returns the number of ids written. Missing documents are created, so
    /// this counts writes, not pre-existing records.
    pub async fn apply_tag_update(
        &self,
        prospect_ids: &[String],
        patch: &ProspectPatch,
        list_tag: Option<&str>,
    ) -> Result<usize, BatchError> {
        let total_chunks = chunk_count(prospect_ids.len(), BATCH_CHUNK_SIZE);
        let mut affected = 0;

        for (index, group) in chunked(prospect_ids, BATCH_CHUNK_SIZE).enumerate() {
            let mut batch = WriteBatch::new();
            for id in group {
                batch.merge(id, patch, list_tag);
            }

            if let Err(source) = self.store.commit(batch).await {
                error!(
                    "Batch commit failed on chunk {}/{} after {} writes: {}",
                    index + 1,
                    total_chunks,
                    affected,
                    source
                );
                return Err(BatchError {
                    committed_chunks: index,
                    total_chunks,
                    affected,
                    source,
                });
            }

            affected += group.len();
            debug!(
                "Committed chunk {}/{} ({} ids)",
                index + 1,
                total_chunks,
                group.len()
            );
        }

        Ok(affected)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::{EnrichmentRun, NewEnrichmentRun, ProspectRecord};
    use crate::repository::{InMemoryProspectStore, ProspectQuery, StoreResult};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Wraps the in-memory store, counting commits and failing the commit
    /// with the given (zero-based) index.
    pub(crate) struct CountingStore {
        pub inner: InMemoryProspectStore,
        pub commits: AtomicUsize,
        pub fail_on: Option<usize>,
    }

    impl CountingStore {
        pub fn new(fail_on: Option<usize>) -> Self {
            Self {
                inner: InMemoryProspectStore::new(),
                commits: AtomicUsize::new(0),
                fail_on,
            }
        }
    }

    #[async_trait]
    impl ProspectStore for CountingStore {
        async fn get(&self, id: &str) -> StoreResult<Option<ProspectRecord>> {
            self.inner.get(id).await
        }

        async fn query(&self, query: &ProspectQuery) -> StoreResult<Vec<ProspectRecord>> {
            self.inner.query(query).await
        }

        async fn sample(&self, limit: usize) -> StoreResult<Vec<ProspectRecord>> {
            self.inner.sample(limit).await
        }

        async fn commit(&self, batch: WriteBatch) -> StoreResult<()> {
            let n = self.commits.fetch_add(1, Ordering::SeqCst);
            if self.fail_on == Some(n) {
                return Err(StoreError::Unavailable("injected failure".to_string()));
            }
            self.inner.commit(batch).await
        }

        async fn create_run(&self, run: NewEnrichmentRun) -> StoreResult<EnrichmentRun> {
            self.inner.create_run(run).await
        }

        async fn get_run(&self, id: &str) -> StoreResult<Option<EnrichmentRun>> {
            self.inner.get_run(id).await
        }
    }

    fn ids(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("p{i:04}")).collect()
    }

    #[tokio::test]
    async fn test_commits_one_batch_per_chunk() {
        for (n, expected) in [(1, 1), (399, 1), (400, 1), (401, 2), (1000, 3)] {
            let store = Arc::new(CountingStore::new(None));
            let mutator = BatchMutator::new(store.clone());

            let affected = mutator
                .apply_tag_update(&ids(n), &ProspectPatch::default(), Some("tag"))
                .await
                .unwrap();

            assert_eq!(affected, n);
            assert_eq!(store.commits.load(Ordering::SeqCst), expected, "n = {n}");
            assert_eq!(store.inner.len().await, n);
        }
    }

    #[tokio::test]
    async fn test_failed_chunk_keeps_earlier_chunks() {
        let store = Arc::new(CountingStore::new(Some(1)));
        let mutator = BatchMutator::new(store.clone());

        let err = mutator
            .apply_tag_update(&ids(1000), &ProspectPatch::default(), Some("tag"))
            .await
            .unwrap_err();

        assert_eq!(err.committed_chunks, 1);
        assert_eq!(err.total_chunks, 3);
        assert_eq!(err.affected, 400);
        // The third chunk is never attempted.
        assert_eq!(store.commits.load(Ordering::SeqCst), 2);
        assert_eq!(store.inner.len().await, 400);
        assert!(store.inner.get("p0399").await.unwrap().is_some());
        assert!(store.inner.get("p0400").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_reapplying_tag_is_idempotent() {
        let store = Arc::new(InMemoryProspectStore::new());
        let mutator = BatchMutator::new(store.clone());
        let targets = ids(3);

        mutator
            .apply_tag_update(&targets, &ProspectPatch::default(), Some("tag-a"))
            .await
            .unwrap();
        mutator
            .apply_tag_update(&targets, &ProspectPatch::default(), Some("tag-a"))
            .await
            .unwrap();

        for id in &targets {
            let record = store.get(id).await.unwrap().unwrap();
            assert_eq!(record.list_ids, vec!["tag-a"]);
        }
    }

    #[tokio::test]
    async fn test_no_tag_leaves_list_ids_alone() {
        let mut existing = ProspectRecord::new("p0000");
        existing.list_ids = vec!["keep".to_string()];
        let store = Arc::new(InMemoryProspectStore::with_records(vec![existing]));
        let mutator = BatchMutator::new(store.clone());

        mutator
            .apply_tag_update(
                &ids(1),
                &ProspectPatch::outreach_ready(chrono::Utc::now()),
                None,
            )
            .await
            .unwrap();

        let record = store.get("p0000").await.unwrap().unwrap();
        assert_eq!(record.list_ids, vec!["keep"]);
        assert_eq!(record.outreach.unwrap().ready, Some(true));
    }
}

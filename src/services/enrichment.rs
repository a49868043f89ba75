//! Enrichment queueing and outreach tagging.
//!
//! Both flows run through the [`BatchMutator`]; they differ only in the patch
//! they write and how the effective list tag is chosen.

use std::sync::Arc;

use chrono::Utc;
use serde_json::{Map, Value};
use tracing::info;

use super::mutation::{BatchError, BatchMutator};
use crate::models::{NewEnrichmentRun, ProspectPatch, STATUS_QUEUED};
use crate::repository::{ProspectStore, StoreError};

/// Tag used for outreach-ready prospects when nothing else is configured.
pub const DEFAULT_OUTREACH_READY_TAG: &str = "outreach_ready";

/// Configured fallbacks for requests that carry no list tag.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListTagDefaults {
    pub queue_list_id: Option<String>,
    pub outreach_ready_list_id: Option<String>,
}

impl ListTagDefaults {
    /// Effective tag for an enqueue request; may be absent.
    pub fn queue_tag(&self, requested: Option<&str>) -> Option<String> {
        requested
            .map(str::to_string)
            .or_else(|| self.queue_list_id.clone())
    }

    /// Effective tag for an outreach-ready request; always present.
    pub fn outreach_tag(&self, requested: Option<&str>) -> String {
        requested
            .map(str::to_string)
            .or_else(|| self.outreach_ready_list_id.clone())
            .unwrap_or_else(|| DEFAULT_OUTREACH_READY_TAG.to_string())
    }
}

/// Errors from queueing prospects for enrichment.
#[derive(Debug, thiserror::Error)]
pub enum EnqueueError {
    #[error("Failed to create enrichment run: {0}")]
    CreateRun(#[source] StoreError),
    #[error("Enrichment run {run_id} created but queueing failed: {source}")]
    Queue {
        run_id: String,
        #[source]
        source: BatchError,
    },
}

/// Result of a successful enqueue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnqueueOutcome {
    pub run_id: String,
    pub queued: usize,
    pub list_tag: Option<String>,
}

/// Result of a successful outreach tagging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagOutcome {
    pub updated: usize,
    pub list_tag: String,
}

/// Service for the two prospect mutation flows.
#[derive(Clone)]
pub struct TaggingService {
    store: Arc<dyn ProspectStore>,
    mutator: BatchMutator,
    defaults: ListTagDefaults,
}

impl TaggingService {
    pub fn new(store: Arc<dyn ProspectStore>, defaults: ListTagDefaults) -> Self {
        Self {
            mutator: BatchMutator::new(store.clone()),
            store,
            defaults,
        }
    }

    /// Create one enrichment run and mark every listed prospect as queued
    /// under it.
    ///
    /// `prospect_ids` must be non-empty. The run's `prospect_count` is the
    /// number of ids given, whether or not they exist.
    pub async fn enqueue_enrichment(
        &self,
        prospect_ids: &[String],
        list_tag: Option<&str>,
        metadata: Option<Map<String, Value>>,
    ) -> Result<EnqueueOutcome, EnqueueError> {
        let list_tag = self.defaults.queue_tag(list_tag);
        let now = Utc::now();

        let run = self
            .store
            .create_run(NewEnrichmentRun {
                created_at: now,
                status: STATUS_QUEUED.to_string(),
                prospect_count: prospect_ids.len() as u64,
                list_tag: list_tag.clone(),
                metadata,
            })
            .await
            .map_err(EnqueueError::CreateRun)?;

        let patch = ProspectPatch::enrichment_queued(&run.id, now);
        let queued = self
            .mutator
            .apply_tag_update(prospect_ids, &patch, list_tag.as_deref())
            .await
            .map_err(|source| EnqueueError::Queue {
                run_id: run.id.clone(),
                source,
            })?;

        info!(
            "Queued {} prospects for enrichment (run {}, list {:?})",
            queued, run.id, list_tag
        );

        Ok(EnqueueOutcome {
            run_id: run.id,
            queued,
            list_tag,
        })
    }

    /// Mark every listed prospect as ready for outreach.
    pub async fn tag_outreach_ready(
        &self,
        prospect_ids: &[String],
        list_tag: Option<&str>,
    ) -> Result<TagOutcome, BatchError> {
        let list_tag = self.defaults.outreach_tag(list_tag);
        let patch = ProspectPatch::outreach_ready(Utc::now());

        let updated = self
            .mutator
            .apply_tag_update(prospect_ids, &patch, Some(&list_tag))
            .await?;

        info!(
            "Tagged {} prospects outreach-ready (list {})",
            updated, list_tag
        );

        Ok(TagOutcome { updated, list_tag })
    }
}

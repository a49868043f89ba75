//! Enrichment run records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One enqueue operation. Downstream workers advance `status`; this crate
/// only creates runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichmentRun {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub status: String,
    /// Number of prospect ids accepted in the request, whether or not they
    /// existed in the store.
    pub prospect_count: u64,
    pub list_tag: Option<String>,
    pub metadata: Option<Map<String, Value>>,
}

/// A run to be created; the store assigns the identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct NewEnrichmentRun {
    pub created_at: DateTime<Utc>,
    pub status: String,
    pub prospect_count: u64,
    pub list_tag: Option<String>,
    pub metadata: Option<Map<String, Value>>,
}

impl NewEnrichmentRun {
    pub fn with_id(self, id: String) -> EnrichmentRun {
        EnrichmentRun {
            id,
            created_at: self.created_at,
            status: self.status,
            prospect_count: self.prospect_count,
            list_tag: self.list_tag,
            metadata: self.metadata,
        }
    }
}

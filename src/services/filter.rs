//! Hybrid filter pipeline for prospect listings.
//!
//! List-tag membership is pushed down to the store query. Priority, status
//! and free-text search are residual: evaluated in memory against each raw
//! record the store returns. Pushing more than one membership predicate to
//! the store would need composite indexes that are not guaranteed to exist.

use std::collections::HashSet;

use crate::models::ProspectRecord;

/// Filters requested by a listing caller, already validated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProspectFilters {
    /// Match any of these list tags (at most 10).
    pub list_ids: Vec<String>,
    pub priorities: Vec<String>,
    pub statuses: Vec<String>,
    pub search: String,
}

/// Filters split into the store's share and ours.
#[derive(Debug, Clone, Default)]
pub struct FilterPlan {
    pushdown_list_ids: Vec<String>,
    priorities: Option<HashSet<String>>,
    statuses: Option<HashSet<String>>,
    /// Trimmed, lower-cased search term.
    search: Option<String>,
}

fn non_empty_set(values: &[String]) -> Option<HashSet<String>> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().cloned().collect())
    }
}

impl FilterPlan {
    pub fn new(filters: &ProspectFilters) -> Self {
        let search = filters.search.trim().to_lowercase();
        Self {
            pushdown_list_ids: filters.list_ids.clone(),
            priorities: non_empty_set(&filters.priorities),
            statuses: non_empty_set(&filters.statuses),
            search: (!search.is_empty()).then_some(search),
        }
    }

    /// List tags for the store's array-membership predicate.
    pub fn pushdown_list_ids(&self) -> &[String] {
        &self.pushdown_list_ids
    }

    pub fn has_pushdown(&self) -> bool {
        !self.pushdown_list_ids.is_empty()
    }

    pub fn has_residual(&self) -> bool {
        self.priorities.is_some() || self.statuses.is_some() || self.search.is_some()
    }

    /// Raw records to request per match still wanted.
    pub fn fetch_multiplier(&self) -> usize {
        if self.has_residual() {
            5
        } else if self.has_pushdown() {
            3
        } else {
            2
        }
    }

    /// Evaluate the residual predicates against a record the store already
    /// admitted. Missing fields compare as the empty string.
    pub fn matches(&self, record: &ProspectRecord) -> bool {
        if let Some(ref priorities) = self.priorities {
            let bucket = record.priority_bucket.as_deref().unwrap_or("");
            if !priorities.contains(bucket) {
                return false;
            }
        }

        if let Some(ref statuses) = self.statuses {
            let status = record.enrichment_status().unwrap_or("");
            if !statuses.contains(status) {
                return false;
            }
        }

        if let Some(ref term) = self.search {
            let found = [&record.name, &record.organization, &record.role_title]
                .into_iter()
                .map(|field| field.as_deref().unwrap_or("").to_lowercase())
                .any(|value| value.contains(term.as_str()));
            if !found {
                return false;
            }
        }

        true
    }
}

//! Adaptive cursor pagination over the prospect store.
//!
//! Residual predicates are applied after the store returns raw records, so a
//! single raw page of `page_size` rarely yields `page_size` matches. Each
//! listing runs a bounded number of over-fetch rounds, with the fetch size
//! scaled by how selective the filters are likely to be.

use std::sync::Arc;

use tracing::{debug, warn};

use super::filter::{FilterPlan, ProspectFilters};
use crate::models::ProspectRecord;
use crate::repository::{Cursor, ProspectQuery, ProspectStore, StoreResult};

/// Largest page a caller may ask for; also caps the per-round fetch.
pub const MAX_PAGE_SIZE: usize = 200;
pub const DEFAULT_PAGE_SIZE: usize = 50;
/// Over-fetch rounds per listing request.
pub const MAX_ROUNDS: usize = 10;
pub const MAX_LIST_FILTERS: usize = 10;

/// One page of listing results.
#[derive(Debug, Clone, Default)]
pub struct ProspectPage {
    pub data: Vec<ProspectRecord>,
    /// Id of the last record, present only when the page is full.
    pub next_page_token: Option<String>,
}

/// Lists prospects in `(name, id)` order with hybrid filtering.
#[derive(Clone)]
pub struct ProspectLister {
    store: Arc<dyn ProspectStore>,
}

impl ProspectLister {
    pub fn new(store: Arc<dyn ProspectStore>) -> Self {
        Self { store }
    }

    /// Fetch one page.
    ///
    /// `page_size` is clamped to `1..=MAX_PAGE_SIZE`. A token that does not
    /// resolve to a record restarts the listing from the beginning.
    pub async fn list(
        &self,
        page_size: usize,
        page_token: Option<&str>,
        filters: &ProspectFilters,
    ) -> StoreResult<ProspectPage> {
        let page_size = page_size.clamp(1, MAX_PAGE_SIZE);
        let plan = FilterPlan::new(filters);
        let fetch_limit = (page_size * plan.fetch_multiplier()).min(MAX_PAGE_SIZE);

        let mut cursor = match page_token {
            Some(token) => self.resolve_token(token).await,
            None => None,
        };

        let mut matches: Vec<ProspectRecord> = Vec::with_capacity(page_size);

        for round in 0..MAX_ROUNDS {
            let query = ProspectQuery {
                list_ids_any: plan.pushdown_list_ids().to_vec(),
                start_after: cursor.clone(),
                limit: fetch_limit,
            };
            let raw = self.store.query(&query).await?;
            let raw_len = raw.len();

            debug!(
                "Listing round {}: fetched {} raw (limit {}), {} matched so far",
                round + 1,
                raw_len,
                fetch_limit,
                matches.len()
            );

            let Some(last_raw) = raw.last().map(Cursor::after) else {
                break;
            };

            let mut full = false;
            for record in raw {
                if !plan.matches(&record) {
                    continue;
                }
                matches.push(record);
                if matches.len() == page_size {
                    full = true;
                    break;
                }
            }

            if full || raw_len < fetch_limit {
                break;
            }
            cursor = Some(last_raw);
        }

        let next_page_token = if matches.len() == page_size {
            matches.last().map(|record| record.id.clone())
        } else {
            None
        };

        Ok(ProspectPage {
            data: matches,
            next_page_token,
        })
    }

    async fn resolve_token(&self, token: &str) -> Option<Cursor> {
        match self.store.get(token).await {
            Ok(Some(record)) => Some(Cursor::after(&record)),
            Ok(None) => {
                warn!("Page token {} not found; listing from the beginning", token);
                None
            }
            Err(e) => {
                warn!(
                    "Failed to resolve page token {}: {}; listing from the beginning",
                    token, e
                );
                None
            }
        }
    }
}

//! Distinct list tags for filter pickers.

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::repository::{ProspectStore, StoreResult};

/// Records sampled per request. Tags only present beyond the sample are not
/// reported.
pub const LIST_OPTIONS_SAMPLE: usize = 500;

/// Collect the list tags seen in the first [`LIST_OPTIONS_SAMPLE`] records,
/// sorted ascending.
pub async fn list_options(store: &Arc<dyn ProspectStore>) -> StoreResult<Vec<String>> {
    let sample = store.sample(LIST_OPTIONS_SAMPLE).await?;

    let options: BTreeSet<String> = sample
        .into_iter()
        .flat_map(|record| record.list_ids)
        .filter(|tag| !tag.trim().is_empty())
        .collect();

    Ok(options.into_iter().collect())
}

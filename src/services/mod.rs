//! Service layer for prospect listing and tagging.
//!
//! Services hold an injected store handle and are shared by the CLI and the
//! web server.

mod chunk;
pub mod enrichment;
pub mod filter;
pub mod list_options;
pub mod mutation;
pub mod pagination;

pub use chunk::{chunk_count, chunked, BATCH_CHUNK_SIZE};
pub use enrichment::{
    EnqueueError, EnqueueOutcome, ListTagDefaults, TagOutcome, TaggingService,
    DEFAULT_OUTREACH_READY_TAG,
};
pub use filter::{FilterPlan, ProspectFilters};
pub use list_options::{list_options, LIST_OPTIONS_SAMPLE};
pub use mutation::{BatchError, BatchMutator};
pub use pagination::{
    ProspectLister, ProspectPage, DEFAULT_PAGE_SIZE, MAX_LIST_FILTERS, MAX_PAGE_SIZE, MAX_ROUNDS,
};

//! Data models for the prospect pipeline.

mod enrichment_run;
pub mod lenient;
mod prospect;

pub use enrichment_run::{EnrichmentRun, NewEnrichmentRun};
pub use prospect::{
    union_list_id, Document, EnrichmentPatch, EnrichmentState, OutreachPatch, OutreachState,
    ProspectPatch, ProspectRecord, STATUS_QUEUED,
};

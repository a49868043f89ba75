//! HTTP request handlers for the web server.

mod enrichment;
mod health;
mod helpers;
mod prospects;
pub mod validation;

// Re-export handlers for use by the router
pub use enrichment::{enqueue_enrichment, tag_outreach_ready};
pub use health::healthz;
pub use prospects::{list_list_options, list_prospects};

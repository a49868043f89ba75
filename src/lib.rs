//! Prospect pipeline - listing and enrichment queueing for prospect records.
//!
//! The crate pages through prospect documents with a mix of store-side and
//! in-memory filters, and tags prospect sets for enrichment or outreach in
//! chunked write batches. A JSON API server and a CLI sit on top.

pub mod cli;
pub mod config;
pub mod models;
pub mod repository;
mod schema;
pub mod server;
pub mod services;

//! Repository layer for prospect persistence.
//!
//! Storage is reached through the [`ProspectStore`] trait. Two backends are
//! provided: SQLite via Diesel, and an in-memory store.

pub mod context;
pub mod diesel_models;
pub mod diesel_prospect;
pub mod memory;
pub mod pool;
pub mod store;
pub mod util;

use std::sync::Arc;

pub use context::DbContext;
pub use diesel_prospect::DieselProspectStore;
pub use memory::InMemoryProspectStore;
pub use pool::{DbError, DbPool};
pub use store::{
    new_document_id, Cursor, ProspectQuery, ProspectStore, StoreError, StoreResult, WriteBatch,
    WriteOp, MAX_BATCH_WRITES,
};

/// Open the store selected by a database URL.
///
/// `memory:` selects the ephemeral in-memory store; anything else is treated
/// as a SQLite path or `sqlite:` URL and has its schema created.
pub async fn open_store(database_url: &str) -> Result<Arc<dyn ProspectStore>, DbError> {
    if util::is_memory_url(database_url) {
        tracing::warn!("Using in-memory prospect store; data will not persist");
        return Ok(Arc::new(InMemoryProspectStore::new()));
    }

    let ctx = DbContext::from_url(database_url);
    ctx.init_schema().await?;
    tracing::debug!("Opened SQLite store at {}", ctx.pool().database_url());
    Ok(Arc::new(ctx.prospects()))
}

//! Database context for managing connections and store access.
//!
//! The DbContext is the entry point for SQLite-backed storage. It holds the
//! connection factory, creates the schema and hands out stores.

use std::path::Path;

use diesel_async::SimpleAsyncConnection;

use super::diesel_prospect::DieselProspectStore;
use super::pool::{DbError, DbPool, SqliteConn};

/// Database context that manages the connection pool and provides store access.
///
/// # Example
/// ```ignore
/// let ctx = DbContext::from_url("sqlite:/var/lib/prospects.db");
/// ctx.init_schema().await?;
/// let store = ctx.prospects();
/// ```
#[derive(Clone)]
pub struct DbContext {
    pool: DbPool,
}

impl DbContext {
    /// Create a context from a database file path.
    pub fn new(db_path: &Path) -> Self {
        Self {
            pool: DbPool::from_path(db_path),
        }
    }

    /// Create a context from a `sqlite:` URL or plain file path.
    pub fn from_url(url: &str) -> Self {
        Self {
            pool: DbPool::new(url),
        }
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    /// Get a prospect store.
    pub fn prospects(&self) -> DieselProspectStore {
        DieselProspectStore::new(self.pool.clone())
    }

    /// Initialize database schema.
    ///
    /// Safe to run on every start; all statements are idempotent.
    pub async fn init_schema(&self) -> Result<(), DbError> {
        let mut conn = self.pool.get().await?;
        init_sqlite_schema(&mut conn).await
    }
}

async fn init_sqlite_schema(conn: &mut SqliteConn) -> Result<(), DbError> {
    conn.batch_execute(
        r#"
        PRAGMA journal_mode = WAL;

        -- Prospect documents; `name` mirrors data.name for ordering
        CREATE TABLE IF NOT EXISTS prospects (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL DEFAULT '',
            data TEXT NOT NULL DEFAULT '{}',
            updated_at TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_prospects_name ON prospects(name, id);

        -- Membership index over data.list_ids
        CREATE TABLE IF NOT EXISTS prospect_lists (
            prospect_id TEXT NOT NULL,
            list_id TEXT NOT NULL,
            PRIMARY KEY (prospect_id, list_id)
        );
        CREATE INDEX IF NOT EXISTS idx_prospect_lists_list ON prospect_lists(list_id);

        -- Enrichment runs
        CREATE TABLE IF NOT EXISTS enrichment_runs (
            id TEXT PRIMARY KEY,
            created_at TEXT NOT NULL,
            status TEXT NOT NULL,
            prospect_count INTEGER NOT NULL,
            list_tag TEXT,
            metadata TEXT
        );
        "#,
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_init_schema_is_idempotent() {
        let dir = tempdir().unwrap();
        let ctx = DbContext::new(&dir.path().join("test.db"));

        ctx.init_schema().await.unwrap();
        ctx.init_schema().await.unwrap();

        assert_eq!(ctx.prospects().count().await.unwrap(), 0);
    }
}

//! Diesel-backed prospect store for SQLite.
//!
//! Documents are stored as JSON in `prospects.data`, with the `name` sort key
//! and the `list_ids` membership index (`prospect_lists`) maintained beside
//! them so ordering and list-tag pushdown run inside SQLite.

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel_async::{RunQueryDsl, SimpleAsyncConnection};
use tracing::warn;

use super::diesel_models::{
    EnrichmentRunRecord, NewEnrichmentRunRecord, NewProspectList, NewProspectRow, ProspectRow,
};
use super::pool::{DbError, DbPool, SqliteConn};
use super::store::{
    new_document_id, ProspectQuery, ProspectStore, StoreError, StoreResult, WriteBatch, WriteOp,
};
use super::util::{parse_datetime, to_diesel_error};
use crate::models::{Document, EnrichmentRun, NewEnrichmentRun, ProspectRecord};
use crate::schema::{enrichment_runs, prospect_lists, prospects};

/// Convert a database record to a domain model.
impl From<EnrichmentRunRecord> for EnrichmentRun {
    fn from(record: EnrichmentRunRecord) -> Self {
        EnrichmentRun {
            id: record.id,
            created_at: parse_datetime(&record.created_at),
            status: record.status,
            prospect_count: record.prospect_count.max(0) as u64,
            list_tag: record.list_tag,
            metadata: record
                .metadata
                .and_then(|m| serde_json::from_str(&m).ok()),
        }
    }
}

impl TryFrom<ProspectRow> for ProspectRecord {
    type Error = serde_json::Error;

    fn try_from(row: ProspectRow) -> Result<Self, Self::Error> {
        ProspectRecord::from_json(&row.id, &row.data)
    }
}

/// Diesel-based prospect store.
#[derive(Clone)]
pub struct DieselProspectStore {
    pool: DbPool,
}

impl DieselProspectStore {
    /// Create a new store with an existing pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Count stored prospects.
    pub async fn count(&self) -> StoreResult<u64> {
        use diesel::dsl::count_star;

        let mut conn = self.pool.get().await?;
        let count: i64 = prospects::table
            .select(count_star())
            .get_result(&mut conn)
            .await?;
        Ok(count as u64)
    }
}

async fn load_record(conn: &mut SqliteConn, id: &str) -> Result<Option<ProspectRecord>, DbError> {
    let row = prospects::table
        .find(id)
        .first::<ProspectRow>(conn)
        .await
        .optional()?;

    row.map(ProspectRecord::try_from)
        .transpose()
        .map_err(to_diesel_error)
}

/// Stored fields of a document, as written.
async fn load_document(conn: &mut SqliteConn, id: &str) -> Result<Option<Document>, DbError> {
    let data = prospects::table
        .find(id)
        .select(prospects::data)
        .first::<String>(conn)
        .await
        .optional()?;

    data.map(|body| serde_json::from_str::<Document>(&body))
        .transpose()
        .map_err(to_diesel_error)
}

/// Write a whole document, refreshing its sort key and list memberships.
async fn write_document(conn: &mut SqliteConn, id: &str, document: Document) -> Result<(), DbError> {
    let data = serde_json::to_string(&document).map_err(to_diesel_error)?;
    let record = ProspectRecord::from_document(id, document).map_err(to_diesel_error)?;
    let updated_at = Utc::now().to_rfc3339();

    diesel::replace_into(prospects::table)
        .values(NewProspectRow {
            id,
            name: record.sort_name(),
            data: &data,
            updated_at: &updated_at,
        })
        .execute(conn)
        .await?;

    diesel::delete(prospect_lists::table.filter(prospect_lists::prospect_id.eq(id)))
        .execute(conn)
        .await?;

    for list_id in &record.list_ids {
        diesel::insert_or_ignore_into(prospect_lists::table)
            .values(NewProspectList {
                prospect_id: id,
                list_id,
            })
            .execute(conn)
            .await?;
    }

    Ok(())
}

async fn apply_ops(conn: &mut SqliteConn, ops: &[WriteOp]) -> Result<(), DbError> {
    for op in ops {
        let existing = load_document(conn, op.target_id()).await?;
        let document = op.apply(existing);
        write_document(conn, op.target_id(), document).await?;
    }
    Ok(())
}

#[async_trait]
impl ProspectStore for DieselProspectStore {
    async fn get(&self, id: &str) -> StoreResult<Option<ProspectRecord>> {
        let mut conn = self.pool.get().await?;
        Ok(load_record(&mut conn, id).await?)
    }

    async fn query(&self, query: &ProspectQuery) -> StoreResult<Vec<ProspectRecord>> {
        let mut conn = self.pool.get().await?;
        let limit = i64::try_from(query.limit).unwrap_or(i64::MAX);

        let mut statement = prospects::table.into_boxed();

        if !query.list_ids_any.is_empty() {
            let members = prospect_lists::table
                .filter(prospect_lists::list_id.eq_any(&query.list_ids_any))
                .select(prospect_lists::prospect_id);
            statement = statement.filter(prospects::id.eq_any(members));
        }

        if let Some(ref cursor) = query.start_after {
            statement = statement.filter(
                prospects::name.gt(&cursor.name).or(prospects::name
                    .eq(&cursor.name)
                    .and(prospects::id.gt(&cursor.id))),
            );
        }

        let rows = statement
            .order((prospects::name.asc(), prospects::id.asc()))
            .limit(limit)
            .load::<ProspectRow>(&mut conn)
            .await?;

        rows.into_iter()
            .map(|row| ProspectRecord::try_from(row).map_err(StoreError::from))
            .collect()
    }

    async fn sample(&self, limit: usize) -> StoreResult<Vec<ProspectRecord>> {
        let mut conn = self.pool.get().await?;
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);

        let rows = prospects::table
            .order(prospects::id.asc())
            .limit(limit)
            .load::<ProspectRow>(&mut conn)
            .await?;

        rows.into_iter()
            .map(|row| ProspectRecord::try_from(row).map_err(StoreError::from))
            .collect()
    }

    async fn commit(&self, batch: WriteBatch) -> StoreResult<()> {
        batch.check_size()?;
        let ops = batch.into_ops();
        let mut conn = self.pool.get().await?;

        // Take the write lock before the first read so concurrent batches
        // wait on busy_timeout instead of failing a lock upgrade.
        conn.batch_execute("BEGIN IMMEDIATE").await?;

        let outcome = match apply_ops(&mut conn, &ops).await {
            Ok(()) => conn.batch_execute("COMMIT").await,
            Err(e) => Err(e),
        };

        if let Err(e) = outcome {
            if let Err(rollback) = conn.batch_execute("ROLLBACK").await {
                warn!("Rollback after failed batch also failed: {}", rollback);
            }
            return Err(e.into());
        }
        Ok(())
    }

    async fn create_run(&self, run: NewEnrichmentRun) -> StoreResult<EnrichmentRun> {
        let mut conn = self.pool.get().await?;

        let id = new_document_id();
        let created_at = run.created_at.to_rfc3339();
        let metadata = run
            .metadata
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;
        let prospect_count = i64::try_from(run.prospect_count).unwrap_or(i64::MAX);

        diesel::insert_into(enrichment_runs::table)
            .values(NewEnrichmentRunRecord {
                id: &id,
                created_at: &created_at,
                status: &run.status,
                prospect_count,
                list_tag: run.list_tag.as_deref(),
                metadata: metadata.as_deref(),
            })
            .execute(&mut conn)
            .await?;

        Ok(run.with_id(id))
    }

    async fn get_run(&self, id: &str) -> StoreResult<Option<EnrichmentRun>> {
        let mut conn = self.pool.get().await?;

        enrichment_runs::table
            .find(id)
            .first::<EnrichmentRunRecord>(&mut conn)
            .await
            .optional()
            .map(|opt| opt.map(EnrichmentRun::from))
            .map_err(StoreError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ProspectPatch;
    use crate::repository::context::DbContext;
    use crate::repository::store::Cursor;
    use tempfile::tempdir;

    async fn setup_test_store() -> (DieselProspectStore, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");

        let ctx = DbContext::new(&db_path);
        ctx.init_schema().await.unwrap();

        (ctx.prospects(), dir)
    }

    fn named(id: &str, name: &str, tags: &[&str]) -> ProspectRecord {
        let mut r = ProspectRecord::new(id);
        r.name = Some(name.to_string());
        r.list_ids = tags.iter().map(|t| t.to_string()).collect();
        r
    }

    async fn seed(store: &DieselProspectStore, records: Vec<ProspectRecord>) {
        let mut batch = WriteBatch::new();
        for record in &records {
            batch.replace(record).unwrap();
        }
        store.commit(batch).await.unwrap();
    }

    async fn stored_data(store: &DieselProspectStore, id: &str) -> serde_json::Value {
        let mut conn = store.pool.get().await.unwrap();
        let data: String = prospects::table
            .find(id)
            .select(prospects::data)
            .first(&mut conn)
            .await
            .unwrap();
        serde_json::from_str(&data).unwrap()
    }

    #[tokio::test]
    async fn test_query_pushdown_and_cursor() {
        let (store, _dir) = setup_test_store().await;
        seed(
            &store,
            vec![
                named("1", "Carol", &["a"]),
                named("2", "Alice", &["a", "b"]),
                named("3", "Bob", &["b"]),
                named("4", "Alice", &["c"]),
                named("5", "Erin", &["a"]),
            ],
        )
        .await;

        let first = store
            .query(&ProspectQuery {
                list_ids_any: vec!["a".to_string(), "c".to_string()],
                start_after: None,
                limit: 3,
            })
            .await
            .unwrap();
        let ids: Vec<_> = first.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["2", "4", "1"]);

        let rest = store
            .query(&ProspectQuery {
                list_ids_any: vec!["a".to_string(), "c".to_string()],
                start_after: Some(Cursor::after(&first[1])),
                limit: 10,
            })
            .await
            .unwrap();
        let ids: Vec<_> = rest.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "5"]);

        assert_eq!(store.count().await.unwrap(), 5);
    }

    #[tokio::test]
    async fn test_merge_preserves_document_and_unions_tags() {
        let (store, _dir) = setup_test_store().await;
        let mut existing = named("p1", "Ada", &["tag-a"]);
        existing
            .extra
            .insert("source".to_string(), serde_json::json!("crm"));
        seed(&store, vec![existing]).await;

        let mut batch = WriteBatch::new();
        let patch = ProspectPatch::outreach_ready(Utc::now());
        batch.merge("p1", &patch, Some("ready"));
        batch.merge("p2", &patch, Some("ready"));
        store.commit(batch.clone()).await.unwrap();
        store.commit(batch).await.unwrap();

        let p1 = store.get("p1").await.unwrap().unwrap();
        assert_eq!(p1.list_ids, vec!["tag-a", "ready"]);
        assert_eq!(p1.extra.get("source"), Some(&serde_json::json!("crm")));
        assert_eq!(p1.outreach.unwrap().ready, Some(true));

        let p2 = store.get("p2").await.unwrap().unwrap();
        assert_eq!(p2.list_ids, vec!["ready"]);
        assert_eq!(p2.name, None);

        let tagged = store
            .query(&ProspectQuery {
                list_ids_any: vec!["ready".to_string()],
                start_after: None,
                limit: 10,
            })
            .await
            .unwrap();
        assert_eq!(tagged.len(), 2);
    }

    #[tokio::test]
    async fn test_merge_keeps_raw_fields_of_unexpected_type() {
        let (store, _dir) = setup_test_store().await;
        let raw: Document = serde_json::from_value(serde_json::json!({
            "name": "Ada",
            "priority_bucket": 5,
            "list_ids": ["a", 7],
            "enrichment": {"status": "done", "queue_timestamp": 1700000000}
        }))
        .unwrap();
        let mut batch = WriteBatch::new();
        batch.replace_document("p1", raw);
        store.commit(batch).await.unwrap();

        let mut batch = WriteBatch::new();
        batch.merge("p1", &ProspectPatch::outreach_ready(Utc::now()), Some("ready"));
        store.commit(batch).await.unwrap();

        let data = stored_data(&store, "p1").await;
        assert_eq!(data["name"], "Ada");
        assert_eq!(data["priority_bucket"], 5);
        assert_eq!(data["list_ids"], serde_json::json!(["a", 7, "ready"]));
        assert_eq!(data["enrichment"]["status"], "done");
        assert_eq!(data["enrichment"]["queue_timestamp"], 1700000000);
        assert_eq!(data["outreach"]["ready"], true);

        let tagged = store
            .query(&ProspectQuery {
                list_ids_any: vec!["ready".to_string()],
                start_after: None,
                limit: 10,
            })
            .await
            .unwrap();
        assert_eq!(tagged.len(), 1);
        assert_eq!(tagged[0].sort_name(), "Ada");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_batches_all_commit() {
        let (store, _dir) = setup_test_store().await;
        let ids: Vec<String> = (0..100).map(|i| format!("p{i:03}")).collect();

        let mut tasks = Vec::new();
        for n in 0..4 {
            let store = store.clone();
            let ids = ids.clone();
            tasks.push(tokio::spawn(async move {
                let tag = format!("tag-{n}");
                let mut batch = WriteBatch::new();
                for id in &ids {
                    batch.merge(id, &ProspectPatch::outreach_ready(Utc::now()), Some(&tag));
                }
                store.commit(batch).await
            }));
        }
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        for id in ["p000", "p099"] {
            let mut tags = store.get(id).await.unwrap().unwrap().list_ids;
            tags.sort();
            assert_eq!(tags, (0..4).map(|n| format!("tag-{n}")).collect::<Vec<_>>());
        }
        assert_eq!(store.count().await.unwrap(), 100);
    }

    #[tokio::test]
    async fn test_failed_batch_rolls_back() {
        let (store, _dir) = setup_test_store().await;
        seed(&store, vec![named("p1", "Ada", &["a"])]).await;

        let mut conn = store.pool.get().await.unwrap();
        conn.batch_execute(
            "CREATE TRIGGER reject_bad BEFORE INSERT ON prospects \
             WHEN NEW.id = 'bad' BEGIN SELECT RAISE(ABORT, 'rejected'); END;",
        )
        .await
        .unwrap();

        let mut batch = WriteBatch::new();
        batch.merge("p1", &ProspectPatch::default(), Some("b"));
        batch.merge("bad", &ProspectPatch::default(), Some("b"));
        assert!(store.commit(batch).await.is_err());

        assert_eq!(store.get("p1").await.unwrap().unwrap().list_ids, vec!["a"]);

        // The connection used next is not stuck in a transaction.
        let mut batch = WriteBatch::new();
        batch.merge("p1", &ProspectPatch::default(), Some("c"));
        store.commit(batch).await.unwrap();
        assert_eq!(store.get("p1").await.unwrap().unwrap().list_ids, vec!["a", "c"]);
    }

    #[tokio::test]
    async fn test_runs_round_trip() {
        let (store, _dir) = setup_test_store().await;
        let mut metadata = serde_json::Map::new();
        metadata.insert("campaign".to_string(), serde_json::json!("q3"));

        let run = store
            .create_run(NewEnrichmentRun {
                created_at: Utc::now(),
                status: "queued".to_string(),
                prospect_count: 3,
                list_tag: Some("tag-a".to_string()),
                metadata: Some(metadata),
            })
            .await
            .unwrap();

        let fetched = store.get_run(&run.id).await.unwrap().unwrap();
        assert_eq!(fetched.prospect_count, 3);
        assert_eq!(fetched.list_tag.as_deref(), Some("tag-a"));
        assert_eq!(fetched.metadata.unwrap()["campaign"], "q3");
        assert!(store.get_run("missing").await.unwrap().is_none());
    }
}

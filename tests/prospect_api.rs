//! End-to-end API tests against a SQLite-backed store.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use prospect_pipeline::models::{Document, ProspectRecord};
use prospect_pipeline::repository::{DbContext, ProspectStore, WriteBatch};
use prospect_pipeline::server::{create_router, AppState};
use prospect_pipeline::services::ListTagDefaults;

async fn setup(records: Vec<ProspectRecord>) -> (axum::Router, Arc<dyn ProspectStore>, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let ctx = DbContext::new(&dir.path().join("prospects.db"));
    ctx.init_schema().await.unwrap();

    let store: Arc<dyn ProspectStore> = Arc::new(ctx.prospects());
    let mut batch = WriteBatch::new();
    for record in &records {
        batch.replace(record).unwrap();
    }
    store.commit(batch).await.unwrap();

    let defaults = ListTagDefaults {
        queue_list_id: Some("enrich-queue".to_string()),
        outreach_ready_list_id: None,
    };
    let app = create_router(AppState::new(store.clone(), defaults));
    (app, store, dir)
}

fn prospect(id: &str, name: &str, priority: &str, lists: &[&str]) -> ProspectRecord {
    let mut r = ProspectRecord::new(id);
    r.name = Some(name.to_string());
    r.priority_bucket = Some(priority.to_string());
    r.list_ids = lists.iter().map(|s| s.to_string()).collect();
    r
}

async fn call(app: &axum::Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_filtered_traversal_over_sqlite() {
    let mut records = Vec::new();
    for i in 0..60 {
        let priority = if i % 2 == 0 { "high" } else { "low" };
        let lists: &[&str] = if i % 3 == 0 { &["tech"] } else { &["retail"] };
        records.push(prospect(&format!("p{i:02}"), &format!("Person {:02}", 59 - i), priority, lists));
    }
    let (app, _store, _dir) = setup(records).await;

    let mut seen = Vec::new();
    let mut uri = "/api/prospects?pageSize=4&listIds=tech&priorities=high".to_string();
    loop {
        let (status, json) = call(&app, get(&uri)).await;
        assert_eq!(status, StatusCode::OK);
        for row in json["data"].as_array().unwrap() {
            assert_eq!(row["priority_bucket"], "high");
            seen.push(row["name"].as_str().unwrap().to_string());
        }
        match json["nextPageToken"].as_str() {
            Some(token) => {
                uri = format!(
                    "/api/prospects?pageSize=4&listIds=tech&priorities=high&pageToken={token}"
                )
            }
            None => break,
        }
    }

    // i divisible by 6 in 0..60
    assert_eq!(seen.len(), 10);
    let mut sorted = seen.clone();
    sorted.sort();
    assert_eq!(seen, sorted);
}

#[tokio::test]
async fn test_enqueue_then_list_by_status() {
    let (app, store, _dir) = setup(vec![
        prospect("a", "Ada", "high", &[]),
        prospect("b", "Bob", "low", &[]),
        prospect("c", "Cy", "low", &[]),
    ])
    .await;

    let (status, json) = call(
        &app,
        post(
            "/api/enqueue_enrichment",
            json!({"prospectIds": ["a", "c"], "metadata": {"by": "test"}}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["queued"], 2);
    assert_eq!(json["listTag"], "enrich-queue");

    let run = store
        .get_run(json["runId"].as_str().unwrap())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(run.prospect_count, 2);
    assert_eq!(run.list_tag.as_deref(), Some("enrich-queue"));

    let (status, json) = call(&app, get("/api/prospects?statuses=queued")).await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<&str> = json["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|row| row["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["a", "c"]);

    let (_, json) = call(&app, get("/api/list-options")).await;
    assert_eq!(json, json!({"options": ["enrich-queue"]}));
}

#[tokio::test]
async fn test_outreach_tag_is_idempotent() {
    let (app, store, _dir) = setup(vec![prospect("a", "Ada", "high", &["vip"])]).await;

    for _ in 0..2 {
        let (status, json) = call(
            &app,
            post("/api/tag_outreach_ready", json!({"prospectIds": ["a"], "listTag": "ready"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["updated"], 1);
    }

    let record = store.get("a").await.unwrap().unwrap();
    assert_eq!(record.list_ids, vec!["vip", "ready"]);
    assert_eq!(record.priority_bucket.as_deref(), Some("high"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_overlapping_tag_requests_both_succeed() {
    let records: Vec<ProspectRecord> = (0..450)
        .map(|i| prospect(&format!("p{i:03}"), &format!("P {i:03}"), "low", &["base"]))
        .collect();
    let ids: Vec<String> = records.iter().map(|r| r.id.clone()).collect();
    let (app, store, _dir) = setup(records).await;

    let first = tokio::spawn({
        let app = app.clone();
        let body = json!({"prospectIds": ids.clone(), "listTag": "ready-a"});
        async move { call(&app, post("/api/tag_outreach_ready", body)).await }
    });
    let second = tokio::spawn({
        let app = app.clone();
        let body = json!({"prospectIds": ids[200..].to_vec(), "listTag": "ready-b"});
        async move { call(&app, post("/api/enqueue_enrichment", body)).await }
    });

    let (status, json) = first.await.unwrap();
    assert_eq!(status, StatusCode::OK, "{json}");
    assert_eq!(json["updated"], 450);
    let (status, json) = second.await.unwrap();
    assert_eq!(status, StatusCode::OK, "{json}");
    assert_eq!(json["queued"], 250);

    let early = store.get("p000").await.unwrap().unwrap();
    assert_eq!(early.list_ids, vec!["base", "ready-a"]);

    let mut late = store.get("p449").await.unwrap().unwrap().list_ids;
    late.sort();
    assert_eq!(late, vec!["base", "ready-a", "ready-b"]);
}

#[tokio::test]
async fn test_enqueue_keeps_upstream_fields() {
    let (app, store, _dir) = setup(Vec::new()).await;
    let raw: Document = serde_json::from_value(json!({
        "name": "Ada",
        "priority_bucket": 5,
        "list_ids": ["a", 7],
        "enrichment": {"status": "done", "provider": "clay"},
        "linkedin": "https://example.com/ada"
    }))
    .unwrap();
    let mut batch = WriteBatch::new();
    batch.replace_document("p1", raw);
    store.commit(batch).await.unwrap();

    let (status, _) = call(
        &app,
        post("/api/enqueue_enrichment", json!({"prospectIds": ["p1"]})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, json) = call(&app, get("/api/prospects?listIds=enrich-queue")).await;
    let row = &json["data"][0];
    assert_eq!(row["id"], "p1");
    assert_eq!(row["linkedin"], "https://example.com/ada");
    assert_eq!(row["enrichment"]["status"], "queued");
    assert_eq!(row["enrichment"]["provider"], "clay");

    let record = store.get("p1").await.unwrap().unwrap();
    assert_eq!(record.list_ids, vec!["a", "enrich-queue"]);
}

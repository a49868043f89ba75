//! Mutation endpoints: enrichment queueing and outreach tagging.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::{json, Value};

use super::super::AppState;
use super::helpers::{error_response, json_body, validation_response};
use super::validation::{validate_enqueue, validate_tag_ready};
use crate::services::{BatchError, EnqueueError};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnqueueResponse {
    pub run_id: String,
    pub queued: usize,
    pub list_tag: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TagReadyResponse {
    pub updated: usize,
    pub list_tag: String,
}

fn batch_failure(err: &BatchError, run_id: Option<&str>) -> Response {
    let mut body = json!({
        "error": err.to_string(),
        "affected": err.affected,
        "committedChunks": err.committed_chunks,
    });
    if let Some(run_id) = run_id {
        body["runId"] = Value::from(run_id);
    }
    (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
}

/// Create an enrichment run and queue the given prospects under it.
pub async fn enqueue_enrichment(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Response {
    let body = match json_body(body) {
        Ok(body) => body,
        Err(response) => return response,
    };
    let request = match validate_enqueue(&body) {
        Ok(request) => request,
        Err(errors) => return validation_response(errors),
    };

    match state
        .tagging
        .enqueue_enrichment(
            &request.prospect_ids,
            request.list_tag.as_deref(),
            request.metadata,
        )
        .await
    {
        Ok(outcome) => Json(EnqueueResponse {
            run_id: outcome.run_id,
            queued: outcome.queued,
            list_tag: outcome.list_tag,
        })
        .into_response(),
        Err(EnqueueError::CreateRun(e)) => {
            tracing::error!("Failed to create enrichment run: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
        Err(EnqueueError::Queue { run_id, source }) => batch_failure(&source, Some(&run_id)),
    }
}

/// Mark the given prospects ready for outreach.
pub async fn tag_outreach_ready(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Response {
    let body = match json_body(body) {
        Ok(body) => body,
        Err(response) => return response,
    };
    let request = match validate_tag_ready(&body) {
        Ok(request) => request,
        Err(errors) => return validation_response(errors),
    };

    match state
        .tagging
        .tag_outreach_ready(&request.prospect_ids, request.list_tag.as_deref())
        .await
    {
        Ok(outcome) => Json(TagReadyResponse {
            updated: outcome.updated,
            list_tag: outcome.list_tag,
        })
        .into_response(),
        Err(e) => batch_failure(&e, None),
    }
}

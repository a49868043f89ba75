//! Listing endpoints.

use std::collections::HashMap;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use super::super::AppState;
use super::helpers::{error_response, validation_response};
use super::validation::validate_list_params;
use crate::models::ProspectRecord;
use crate::services::{list_options, MAX_LIST_FILTERS};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProspectListResponse {
    pub data: Vec<ProspectRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,
}

/// List one page of prospects.
pub async fn list_prospects(
    State(state): State<AppState>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    let params = match validate_list_params(&query) {
        Ok(params) => params,
        Err(errors) => return validation_response(errors),
    };

    if params.filters.list_ids.len() > MAX_LIST_FILTERS {
        return error_response(
            StatusCode::BAD_REQUEST,
            format!("A maximum of {MAX_LIST_FILTERS} list filters is supported."),
        );
    }

    match state
        .lister
        .list(
            params.page_size,
            params.page_token.as_deref(),
            &params.filters,
        )
        .await
    {
        Ok(page) => Json(ProspectListResponse {
            data: page.data,
            next_page_token: page.next_page_token,
        })
        .into_response(),
        Err(e) => {
            tracing::error!("Failed to load prospects: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

/// Distinct list tags from a bounded sample.
pub async fn list_list_options(State(state): State<AppState>) -> Response {
    match list_options(&state.store).await {
        Ok(options) => Json(serde_json::json!({ "options": options })).into_response(),
        Err(e) => {
            tracing::error!("Failed to load list options: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

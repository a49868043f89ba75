//! Request validation for the JSON API.
//!
//! Requests are parsed from raw JSON (or query maps) into typed structs by
//! pure `validate_*` functions. Failures are collected per field so a caller
//! sees every problem at once, in a `{formErrors, fieldErrors}` shape.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;
use serde_json::{Map, Value};

use crate::services::{ProspectFilters, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};

/// Longest accepted list tag, in characters.
pub const MAX_LIST_TAG_LEN: usize = 120;

/// Collected validation failures.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(rename_all = "camelCase")]
#[error("Invalid request: {form_errors:?} {field_errors:?}")]
pub struct ValidationErrors {
    pub form_errors: Vec<String>,
    pub field_errors: BTreeMap<String, Vec<String>>,
}

impl ValidationErrors {
    pub fn form(message: impl Into<String>) -> Self {
        Self {
            form_errors: vec![message.into()],
            ..Default::default()
        }
    }

    pub fn add_field(&mut self, field: &str, message: impl Into<String>) {
        self.field_errors
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.form_errors.is_empty() && self.field_errors.is_empty()
    }

    fn into_result<T>(self, value: T) -> Result<T, Self> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

/// Body of `POST /api/enqueue_enrichment`.
#[derive(Debug, Clone, PartialEq)]
pub struct EnqueueRequest {
    pub prospect_ids: Vec<String>,
    pub list_tag: Option<String>,
    pub metadata: Option<Map<String, Value>>,
}

/// Body of `POST /api/tag_outreach_ready`.
#[derive(Debug, Clone, PartialEq)]
pub struct TagReadyRequest {
    pub prospect_ids: Vec<String>,
    pub list_tag: Option<String>,
}

/// Query of `GET /api/prospects`.
#[derive(Debug, Clone, PartialEq)]
pub struct ListParams {
    pub page_size: usize,
    pub page_token: Option<String>,
    pub filters: ProspectFilters,
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn expect_object(body: &Value) -> Result<&Map<String, Value>, ValidationErrors> {
    body.as_object().ok_or_else(|| {
        ValidationErrors::form(format!("Expected object, received {}", type_name(body)))
    })
}

fn prospect_ids(body: &Map<String, Value>, errors: &mut ValidationErrors) -> Vec<String> {
    const FIELD: &str = "prospectIds";

    let items = match body.get(FIELD) {
        None => {
            errors.add_field(FIELD, "Required");
            return Vec::new();
        }
        Some(Value::Array(items)) => items,
        Some(other) => {
            errors.add_field(FIELD, format!("Expected array, received {}", type_name(other)));
            return Vec::new();
        }
    };

    if items.is_empty() {
        errors.add_field(FIELD, "Array must contain at least 1 element(s)");
    }

    let mut ids = Vec::with_capacity(items.len());
    for item in items {
        match item {
            Value::String(id) if id.is_empty() => {
                errors.add_field(FIELD, "String must contain at least 1 character(s)");
            }
            Value::String(id) => ids.push(id.clone()),
            other => {
                errors.add_field(
                    FIELD,
                    format!("Expected string, received {}", type_name(other)),
                );
            }
        }
    }
    ids
}

fn list_tag(body: &Map<String, Value>, errors: &mut ValidationErrors) -> Option<String> {
    const FIELD: &str = "listTag";

    match body.get(FIELD)? {
        Value::String(tag) => {
            let len = tag.chars().count();
            if len == 0 {
                errors.add_field(FIELD, "String must contain at least 1 character(s)");
                None
            } else if len > MAX_LIST_TAG_LEN {
                errors.add_field(
                    FIELD,
                    format!("String must contain at most {MAX_LIST_TAG_LEN} character(s)"),
                );
                None
            } else {
                Some(tag.clone())
            }
        }
        other => {
            errors.add_field(FIELD, format!("Expected string, received {}", type_name(other)));
            None
        }
    }
}

/// Validate an enqueue-enrichment body.
pub fn validate_enqueue(body: &Value) -> Result<EnqueueRequest, ValidationErrors> {
    let body = expect_object(body)?;
    let mut errors = ValidationErrors::default();

    let prospect_ids = prospect_ids(body, &mut errors);
    let list_tag = list_tag(body, &mut errors);
    let metadata = match body.get("metadata") {
        None => None,
        Some(Value::Object(map)) => Some(map.clone()),
        Some(other) => {
            errors.add_field(
                "metadata",
                format!("Expected object, received {}", type_name(other)),
            );
            None
        }
    };

    errors.into_result(EnqueueRequest {
        prospect_ids,
        list_tag,
        metadata,
    })
}

/// Validate a tag-outreach-ready body.
pub fn validate_tag_ready(body: &Value) -> Result<TagReadyRequest, ValidationErrors> {
    let body = expect_object(body)?;
    let mut errors = ValidationErrors::default();

    let prospect_ids = prospect_ids(body, &mut errors);
    let list_tag = list_tag(body, &mut errors);

    errors.into_result(TagReadyRequest {
        prospect_ids,
        list_tag,
    })
}

/// Split a comma-separated query value, trimming entries and dropping blanks.
pub fn split_list(value: Option<&str>) -> Vec<String> {
    value
        .map(|v| {
            v.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn page_size(raw: Option<&str>, errors: &mut ValidationErrors) -> usize {
    const FIELD: &str = "pageSize";

    let Some(raw) = raw.filter(|s| !s.is_empty()) else {
        return DEFAULT_PAGE_SIZE;
    };

    let number: f64 = match raw.trim().parse() {
        Ok(n) if f64::is_finite(n) => n,
        _ => {
            errors.add_field(FIELD, "Expected number, received nan");
            return DEFAULT_PAGE_SIZE;
        }
    };

    if number.fract() != 0.0 {
        errors.add_field(FIELD, "Expected integer, received float");
    }
    if number < 1.0 {
        errors.add_field(FIELD, "Number must be greater than or equal to 1");
    }
    if number > MAX_PAGE_SIZE as f64 {
        errors.add_field(
            FIELD,
            format!("Number must be less than or equal to {MAX_PAGE_SIZE}"),
        );
    }

    number as usize
}

/// Validate listing query parameters.
///
/// The list-filter count is not checked here; callers reject more than
/// `MAX_LIST_FILTERS` tags with a dedicated message.
pub fn validate_list_params(query: &HashMap<String, String>) -> Result<ListParams, ValidationErrors> {
    let mut errors = ValidationErrors::default();
    let get = |key: &str| query.get(key).map(String::as_str);

    let page_size = page_size(get("pageSize"), &mut errors);
    let params = ListParams {
        page_size,
        page_token: get("pageToken").filter(|t| !t.is_empty()).map(str::to_string),
        filters: ProspectFilters {
            list_ids: split_list(get("listIds")),
            priorities: split_list(get("priorities")),
            statuses: split_list(get("statuses")),
            search: get("search").unwrap_or_default().to_string(),
        },
    };

    errors.into_result(params)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn query(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_enqueue_accepts_valid_body() {
        let request = validate_enqueue(&json!({
            "prospectIds": ["a", "b"],
            "listTag": "batch-1",
            "metadata": {"source": "ui"}
        }))
        .unwrap();

        assert_eq!(request.prospect_ids, vec!["a", "b"]);
        assert_eq!(request.list_tag.as_deref(), Some("batch-1"));
        assert_eq!(request.metadata.unwrap()["source"], "ui");
    }

    #[test]
    fn test_enqueue_collects_every_field_error() {
        let err = validate_enqueue(&json!({
            "prospectIds": ["ok", "", 7],
            "listTag": "x".repeat(121),
            "metadata": [1]
        }))
        .unwrap_err();

        assert!(err.form_errors.is_empty());
        assert_eq!(
            err.field_errors["prospectIds"],
            vec![
                "String must contain at least 1 character(s)",
                "Expected string, received number",
            ]
        );
        assert_eq!(
            err.field_errors["listTag"],
            vec!["String must contain at most 120 character(s)"]
        );
        assert_eq!(
            err.field_errors["metadata"],
            vec!["Expected object, received array"]
        );
    }

    #[test]
    fn test_prospect_ids_required_and_non_empty() {
        let err = validate_tag_ready(&json!({})).unwrap_err();
        assert_eq!(err.field_errors["prospectIds"], vec!["Required"]);

        let err = validate_tag_ready(&json!({"prospectIds": []})).unwrap_err();
        assert_eq!(
            err.field_errors["prospectIds"],
            vec!["Array must contain at least 1 element(s)"]
        );

        let err = validate_tag_ready(&json!({"prospectIds": "a"})).unwrap_err();
        assert_eq!(
            err.field_errors["prospectIds"],
            vec!["Expected array, received string"]
        );
    }

    #[test]
    fn test_list_tag_bounds() {
        let err = validate_tag_ready(&json!({"prospectIds": ["a"], "listTag": ""})).unwrap_err();
        assert!(err.field_errors.contains_key("listTag"));

        let err =
            validate_tag_ready(&json!({"prospectIds": ["a"], "listTag": null})).unwrap_err();
        assert_eq!(
            err.field_errors["listTag"],
            vec!["Expected string, received null"]
        );

        let ok = validate_tag_ready(&json!({"prospectIds": ["a"], "listTag": "x".repeat(120)}))
            .unwrap();
        assert_eq!(ok.list_tag.map(|t| t.len()), Some(120));
    }

    #[test]
    fn test_non_object_body_is_a_form_error() {
        let err = validate_enqueue(&json!(["a"])).unwrap_err();
        assert_eq!(err.form_errors, vec!["Expected object, received array"]);
        assert!(err.field_errors.is_empty());
    }

    #[test]
    fn test_list_params_defaults_and_splitting() {
        let params = validate_list_params(&query(&[
            ("listIds", " a, ,b ,"),
            ("priorities", "high"),
            ("search", "  Acme "),
        ]))
        .unwrap();

        assert_eq!(params.page_size, DEFAULT_PAGE_SIZE);
        assert_eq!(params.page_token, None);
        assert_eq!(params.filters.list_ids, vec!["a", "b"]);
        assert_eq!(params.filters.priorities, vec!["high"]);
        assert!(params.filters.statuses.is_empty());
        assert_eq!(params.filters.search, "  Acme ");
    }

    #[test]
    fn test_page_size_bounds() {
        assert_eq!(
            validate_list_params(&query(&[("pageSize", "200")]))
                .unwrap()
                .page_size,
            200
        );
        assert_eq!(
            validate_list_params(&query(&[("pageSize", "")]))
                .unwrap()
                .page_size,
            DEFAULT_PAGE_SIZE
        );

        for bad in ["0", "201", "abc", "2.5", "-3"] {
            let err = validate_list_params(&query(&[("pageSize", bad)])).unwrap_err();
            assert!(err.field_errors.contains_key("pageSize"), "pageSize = {bad}");
        }
    }

    #[test]
    fn test_errors_serialize_in_camel_case() {
        let mut errors = ValidationErrors::default();
        errors.add_field("pageSize", "bad");
        assert_eq!(
            serde_json::to_value(&errors).unwrap(),
            json!({"formErrors": [], "fieldErrors": {"pageSize": ["bad"]}})
        );
    }
}

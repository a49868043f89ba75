//! Shared response builders for handlers.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};

use super::validation::ValidationErrors;

/// `{ "error": message }` with the given status.
pub fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({ "error": message.into() }))).into_response()
}

/// 400 carrying structured validation errors.
pub fn validation_response(errors: ValidationErrors) -> Response {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": errors }))).into_response()
}

/// Unwrap a JSON body, turning a malformed one into a validation error.
pub fn json_body(body: Result<Json<Value>, JsonRejection>) -> Result<Value, Response> {
    match body {
        Ok(Json(value)) => Ok(value),
        Err(rejection) => Err(validation_response(ValidationErrors::form(
            rejection.body_text(),
        ))),
    }
}

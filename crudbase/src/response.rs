//! # Response Envelopes
//!
//! Builders for the JSON shapes every endpoint answers with:
//!
//! ```json
//! {"success": true, "message": "Created.", "data": {"id": "..."}}
//! {"success": true, "message": "Data retrieved successfully.", "data": [], "meta": {}, "links": {}}
//! {"success": false, "message": "Validation failed.", "errors": {"title": ["This field is required"]}}
//! ```
//!
//! `success` and `message` are always present. `errors` only appears on failures
//! and `meta`/`links` only on paginated payloads. Each builder returns an
//! [`ApiResponse`], which carries the status code and implements `IntoResponse`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::pagination::Page;

pub const DEFAULT_SUCCESS_MESSAGE: &str = "Success.";
pub const DEFAULT_ERROR_MESSAGE: &str = "An error occurred.";
pub const RETRIEVED_MESSAGE: &str = "Data retrieved successfully.";
pub const VALIDATION_FAILED_MESSAGE: &str = "Validation failed.";
pub const NOT_FOUND_MESSAGE: &str = "Data not found.";
pub const UNAUTHORIZED_MESSAGE: &str = "Access denied.";
pub const SERVER_ERROR_MESSAGE: &str = "An internal server error occurred.";

/// A status code paired with an envelope body
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    status: StatusCode,
    body: Value,
}

impl ApiResponse {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    #[must_use]
    pub fn body(&self) -> &Value {
        &self.body
    }

    #[must_use]
    pub fn into_parts(self) -> (StatusCode, Value) {
        (self.status, self.body)
    }
}

impl IntoResponse for ApiResponse {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

pub(crate) fn envelope(success: bool, message: &str) -> Map<String, Value> {
    let mut body = Map::new();
    body.insert("success".to_string(), Value::Bool(success));
    body.insert("message".to_string(), Value::String(message.to_string()));
    body
}

/// Successful response.
///
/// `data` is included only when given; `extra` members are merged into the
/// top level last, so they win over same-named keys.
#[must_use]
pub fn success(
    message: &str,
    data: Option<Value>,
    code: StatusCode,
    extra: Map<String, Value>,
) -> ApiResponse {
    let mut body = envelope(true, message);
    if let Some(data) = data {
        body.insert("data".to_string(), data);
    }
    body.extend(extra);

    ApiResponse {
        status: code,
        body: Value::Object(body),
    }
}

/// `success` with the default message and status 200
#[must_use]
pub fn ok(data: Value) -> ApiResponse {
    success(DEFAULT_SUCCESS_MESSAGE, Some(data), StatusCode::OK, Map::new())
}

/// Paginated response; without a page this is `success(message)`.
#[must_use]
pub fn paginated<T: Serialize>(message: &str, page: Option<&Page<T>>) -> ApiResponse {
    let Some(page) = page else {
        return success(message, None, StatusCode::OK, Map::new());
    };

    let data = match serde_json::to_value(page.items()) {
        Ok(data) => data,
        Err(err) => {
            tracing::error!(error = %err, "Failed to serialize page items");
            return server_error_default();
        }
    };

    let mut body = envelope(true, message);
    body.insert("data".to_string(), data);
    body.insert("meta".to_string(), page.meta().to_json());
    body.insert("links".to_string(), page.links().to_json());

    ApiResponse {
        status: StatusCode::OK,
        body: Value::Object(body),
    }
}

/// Failure response; `errors` is included only when given.
#[must_use]
pub fn error(message: &str, code: StatusCode, errors: Option<Value>) -> ApiResponse {
    let mut body = envelope(false, message);
    if let Some(errors) = errors {
        body.insert("errors".to_string(), errors);
    }

    ApiResponse {
        status: code,
        body: Value::Object(body),
    }
}

/// 422 with the field errors
#[must_use]
pub fn validation_error(errors: Value) -> ApiResponse {
    error(
        VALIDATION_FAILED_MESSAGE,
        StatusCode::UNPROCESSABLE_ENTITY,
        Some(errors),
    )
}

#[must_use]
pub fn not_found(message: &str) -> ApiResponse {
    error(message, StatusCode::NOT_FOUND, None)
}

#[must_use]
pub fn not_found_default() -> ApiResponse {
    not_found(NOT_FOUND_MESSAGE)
}

/// 403; authorization failures use Forbidden, not 401.
#[must_use]
pub fn unauthorized(message: &str) -> ApiResponse {
    error(message, StatusCode::FORBIDDEN, None)
}

#[must_use]
pub fn unauthorized_default() -> ApiResponse {
    unauthorized(UNAUTHORIZED_MESSAGE)
}

#[must_use]
pub fn server_error(message: &str) -> ApiResponse {
    error(message, StatusCode::INTERNAL_SERVER_ERROR, None)
}

#[must_use]
pub fn server_error_default() -> ApiResponse {
    server_error(SERVER_ERROR_MESSAGE)
}

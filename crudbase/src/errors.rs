//! # Error Handling for CRUD APIs
//!
//! Every failure that leaves the repository, service or request layer is an
//! [`ApiError`]. At the HTTP boundary it renders as the standard response
//! envelope (see [`crate::response`]):
//!
//! ```json
//! {"success": false, "message": "Validation failed.", "errors": {"title": ["This field is required"]}}
//! ```
//!
//! Database errors and other internal failures are logged with `tracing` and
//! replaced by a generic message, so driver details never reach clients.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use crudbase::{ApiError, JsonResource};
//!
//! async fn show(State(tasks): State<TaskService>, Path(id): Path<String>) -> Result<JsonResource<Task>, ApiError> {
//!     // NotFound becomes a 404 envelope, database errors a 500 envelope
//!     let task = tasks.repository().find_or_fail(&id).await?;
//!     Ok(JsonResource::new(task))
//! }
//! ```

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sea_orm::{DbErr, SqlErr};
use std::fmt;

use crate::response::{self, ApiResponse};
use crate::validation::ValidationErrors;

/// API error type with automatic logging and sanitized responses
#[derive(Debug)]
pub enum ApiError {
    /// 404 Not Found - no entity with the requested identifier
    NotFound {
        /// Resource type (e.g., "task", "project")
        resource: String,
        /// Optional ID that wasn't found
        id: Option<String>,
    },

    /// 400 Bad Request - unknown column, unknown relation or other bad input
    BadRequest {
        /// User-facing error message
        message: String,
    },

    /// 403 Forbidden - the request was not authorized
    Forbidden {
        /// User-facing error message
        message: String,
    },

    /// 409 Conflict - unique constraint violation
    Conflict {
        /// User-facing error message
        message: String,
    },

    /// 422 Unprocessable Entity - field validation failed
    ValidationFailed {
        /// Messages grouped by field
        errors: ValidationErrors,
    },

    /// 500 Internal Server Error - Database error (details logged, not exposed)
    Database {
        /// User-facing generic message
        message: String,
        /// Internal error (logged, not sent to user)
        internal: DbErr,
    },

    /// 500 Internal Server Error - Generic internal error
    Internal {
        /// User-facing generic message
        message: String,
        /// Internal error details (logged, not sent to user)
        internal: Option<String>,
    },
}

impl ApiError {
    /// Create a 404 Not Found error
    ///
    /// # Example
    /// ```rust,ignore
    /// return Err(ApiError::not_found("task", Some(id.to_string())));
    /// ```
    pub fn not_found(resource: impl Into<String>, id: Option<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
            id,
        }
    }

    /// Create a 400 Bad Request error
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
        }
    }

    /// Create a 403 Forbidden error
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden {
            message: message.into(),
        }
    }

    /// Create a 409 Conflict error
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    /// Create a 422 Validation Failed error
    ///
    /// # Example
    /// ```rust,ignore
    /// let mut errors = ValidationErrors::new();
    /// errors.push("title", "This field is required");
    /// return Err(ApiError::validation_failed(errors));
    /// ```
    #[must_use]
    pub fn validation_failed(errors: ValidationErrors) -> Self {
        Self::ValidationFailed { errors }
    }

    /// Create a 500 Internal Server Error from a database error
    ///
    /// The database error details are logged but NOT sent to the user.
    #[must_use]
    pub fn database(err: DbErr) -> Self {
        Self::Database {
            message: response::SERVER_ERROR_MESSAGE.to_string(),
            internal: err,
        }
    }

    /// Create a 500 Internal Server Error with optional details
    pub fn internal(message: impl Into<String>, internal: Option<String>) -> Self {
        Self::Internal {
            message: message.into(),
            internal,
        }
    }

    /// Map an error raised by an insert or update.
    ///
    /// Unique constraint violations become 409 Conflict, everything else
    /// follows the regular `DbErr` conversion.
    #[must_use]
    pub fn from_write(err: DbErr) -> Self {
        if let Some(SqlErr::UniqueConstraintViolation(detail)) = err.sql_err() {
            return Self::conflict(format!("Conflict: {detail}"));
        }
        Self::from(err)
    }

    /// Get the HTTP status code for this error
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Self::Forbidden { .. } => StatusCode::FORBIDDEN,
            Self::Conflict { .. } => StatusCode::CONFLICT,
            Self::ValidationFailed { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Database { .. } | Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the user-facing error message (sanitized)
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::NotFound { resource, id } => {
                if let Some(id) = id {
                    format!("{resource} with ID '{id}' not found")
                } else {
                    format!("{resource} not found")
                }
            }
            Self::ValidationFailed { .. } => response::VALIDATION_FAILED_MESSAGE.to_string(),
            Self::BadRequest { message }
            | Self::Forbidden { message }
            | Self::Conflict { message }
            | Self::Database { message, .. }
            | Self::Internal { message, .. } => message.clone(),
        }
    }

    /// The envelope this error renders as.
    #[must_use]
    pub fn to_api_response(&self) -> ApiResponse {
        match self {
            Self::NotFound { .. } => response::not_found(&self.user_message()),
            Self::BadRequest { message } => {
                response::error(message, StatusCode::BAD_REQUEST, None)
            }
            Self::Forbidden { message } => response::unauthorized(message),
            Self::Conflict { message } => response::error(message, StatusCode::CONFLICT, None),
            Self::ValidationFailed { errors } => response::validation_error(errors.to_json()),
            Self::Database { message, .. } | Self::Internal { message, .. } => {
                response::server_error(message)
            }
        }
    }

    /// Log internal error details (not sent to user)
    ///
    /// Uses the `tracing` crate; no output unless the application installed a subscriber.
    fn log_internal(&self) {
        match self {
            Self::Database { internal, .. } => {
                tracing::error!(
                    error = ?internal,
                    "Database error occurred"
                );
            }
            Self::Internal {
                internal: Some(details),
                ..
            } => {
                tracing::error!(
                    details = %details,
                    "Internal error occurred"
                );
            }
            _ => {
                tracing::debug!(
                    error = %self.user_message(),
                    status = %self.status_code(),
                    "API error"
                );
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        self.log_internal();
        self.to_api_response().into_response()
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.user_message())
    }
}

impl std::error::Error for ApiError {}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        Self::ValidationFailed { errors }
    }
}

/// Convert SeaORM `DbErr` to `ApiError`
///
/// - `DbErr::RecordNotFound` → 404 Not Found
/// - All other variants → 500 Internal Server Error (logged, sanitized)
impl From<DbErr> for ApiError {
    fn from(err: DbErr) -> Self {
        match &err {
            DbErr::RecordNotFound(msg) => {
                let resource = msg.split_whitespace().next().unwrap_or("Resource");
                Self::NotFound {
                    resource: resource.to_string(),
                    id: None,
                }
            }
            _ => Self::database(err),
        }
    }
}

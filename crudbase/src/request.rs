//! Validated request bodies.
//!
//! A handler taking [`Validated<T>`] only runs once `T::authorize` allowed the
//! request and the JSON body parsed and passed `T::validate`:
//!
//! ```rust,ignore
//! #[derive(Deserialize)]
//! struct CreateTask {
//!     title: String,
//!     priority: i32,
//! }
//!
//! impl FormRequest for CreateTask {
//!     fn validate(&self) -> Result<(), ValidationErrors> {
//!         let mut errors = ValidationErrors::new();
//!         errors.check(validate_length("title", &self.title, Some(1), Some(200)));
//!         errors.check(validate_range("priority", self.priority, Some(1), Some(5)));
//!         errors.result()
//!     }
//! }
//!
//! async fn create_task(Validated(input): Validated<CreateTask>) -> impl IntoResponse { ... }
//! ```

use axum::{
    body::Bytes,
    extract::{FromRequest, Request},
    http::request::Parts,
};
use serde::de::DeserializeOwned;

use crate::errors::ApiError;
use crate::response::UNAUTHORIZED_MESSAGE;
use crate::validation::ValidationErrors;

/// A JSON request body with authorization and validation rules
pub trait FormRequest: DeserializeOwned + Send {
    /// Checked before the body is read
    fn authorize(_parts: &Parts) -> bool {
        true
    }

    /// # Errors
    /// Every rule that failed, keyed by field.
    fn validate(&self) -> Result<(), ValidationErrors> {
        Ok(())
    }
}

/// Extractor yielding an authorized and validated `T`.
///
/// Rejections are [`ApiError`] envelopes: 403 when `authorize` refuses, 422
/// when the body is not valid JSON for `T` (reported on the `body` field) or
/// when `validate` fails.
#[derive(Debug, Clone)]
pub struct Validated<T>(pub T);

impl<T> Validated<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<S, T> FromRequest<S> for Validated<T>
where
    S: Send + Sync,
    T: FormRequest,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let (parts, body) = req.into_parts();
        if !T::authorize(&parts) {
            tracing::debug!(uri = %parts.uri, "Request refused by authorize");
            return Err(ApiError::forbidden(UNAUTHORIZED_MESSAGE));
        }

        let bytes = Bytes::from_request(Request::from_parts(parts, body), state)
            .await
            .map_err(|err| ApiError::bad_request(err.body_text()))?;

        let input: T = serde_json::from_slice(&bytes).map_err(|err| {
            let mut errors = ValidationErrors::new();
            errors.push("body", format!("Invalid JSON body: {err}"));
            ApiError::validation_failed(errors)
        })?;

        input.validate().map_err(ApiError::validation_failed)?;
        Ok(Self(input))
    }
}

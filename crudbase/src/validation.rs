//! Validation Support
//!
//! Field-level errors collected by [`crate::request::FormRequest`] implementations.
//! Errors serialize as a map from field name to the list of messages for that
//! field, which is the `errors` member of a 422 envelope.
//!
//! # Example
//!
//! ```rust,ignore
//! use crudbase::validation::{ValidationErrors, validators};
//!
//! fn validate(&self) -> Result<(), ValidationErrors> {
//!     let mut errors = ValidationErrors::new();
//!     errors.check(validators::validate_required("title", &self.title));
//!     errors.check(validators::validate_range("priority", self.priority, Some(1), Some(5)));
//!     errors.result()
//! }
//! ```

use serde::{Serialize, Serializer};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Validation error with field name and message
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    /// The field that failed validation
    pub field: String,
    /// Human-readable error message
    pub message: String,
}

impl ValidationError {
    /// Create a new validation error
    #[must_use]
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Collection of validation errors
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    errors: Vec<ValidationError>,
}

impl ValidationErrors {
    /// Create a new empty validation errors collection
    #[must_use]
    pub fn new() -> Self {
        Self { errors: Vec::new() }
    }

    /// Add a validation error
    pub fn add(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    /// Add a message for a field
    pub fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.add(ValidationError::new(field, message));
    }

    /// Record the error of a validator result, if any
    pub fn check(&mut self, result: Result<(), ValidationError>) {
        if let Err(error) = result {
            self.add(error);
        }
    }

    /// Check if there are any errors
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Get the number of errors
    #[must_use]
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Get all errors
    #[must_use]
    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    /// Messages recorded for one field
    #[must_use]
    pub fn for_field(&self, field: &str) -> Vec<&str> {
        self.errors
            .iter()
            .filter(|error| error.field == field)
            .map(|error| error.message.as_str())
            .collect()
    }

    /// Messages grouped by field, fields in sorted order
    #[must_use]
    pub fn by_field(&self) -> BTreeMap<&str, Vec<&str>> {
        let mut grouped: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        for error in &self.errors {
            grouped
                .entry(error.field.as_str())
                .or_default()
                .push(error.message.as_str());
        }
        grouped
    }

    /// `{field: [messages]}` as a JSON object
    #[must_use]
    pub fn to_json(&self) -> Value {
        Value::Object(
            self.by_field()
                .into_iter()
                .map(|(field, messages)| {
                    let messages = messages
                        .into_iter()
                        .map(|message| Value::String(message.to_string()))
                        .collect();
                    (field.to_string(), Value::Array(messages))
                })
                .collect(),
        )
    }

    /// Convert to Result
    ///
    /// # Errors
    ///
    /// Returns `self` when at least one error was recorded.
    pub fn result(self) -> Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl From<ValidationError> for ValidationErrors {
    fn from(error: ValidationError) -> Self {
        Self {
            errors: vec![error],
        }
    }
}

impl Serialize for ValidationErrors {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.by_field())
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Validation failed with {} error(s):", self.errors.len())?;
        for error in &self.errors {
            write!(f, "\n  - {error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// Helper validators for common patterns
pub mod validators {
    use super::ValidationError;
    use std::fmt;

    /// Validate string length is within range
    ///
    /// # Errors
    ///
    /// Returns a `ValidationError` for `field` when the length is out of range.
    pub fn validate_length(
        field: &str,
        value: &str,
        min: Option<usize>,
        max: Option<usize>,
    ) -> Result<(), ValidationError> {
        let len = value.chars().count();

        if let Some(min_len) = min
            && len < min_len
        {
            return Err(ValidationError::new(
                field,
                format!("Must be at least {min_len} characters"),
            ));
        }

        if let Some(max_len) = max
            && len > max_len
        {
            return Err(ValidationError::new(
                field,
                format!("Must be at most {max_len} characters"),
            ));
        }

        Ok(())
    }

    /// Validate number is within range
    ///
    /// # Errors
    ///
    /// Returns a `ValidationError` for `field` when the value is out of range.
    pub fn validate_range<T: PartialOrd + fmt::Display>(
        field: &str,
        value: T,
        min: Option<T>,
        max: Option<T>,
    ) -> Result<(), ValidationError> {
        if let Some(min_val) = min
            && value < min_val
        {
            return Err(ValidationError::new(
                field,
                format!("Must be at least {min_val}"),
            ));
        }

        if let Some(max_val) = max
            && value > max_val
        {
            return Err(ValidationError::new(
                field,
                format!("Must be at most {max_val}"),
            ));
        }

        Ok(())
    }

    /// Basic email validation
    ///
    /// # Errors
    ///
    /// Returns a `ValidationError` for malformed or overlong addresses.
    pub fn validate_email(field: &str, value: &str) -> Result<(), ValidationError> {
        if !value.contains('@') || !value.contains('.') {
            return Err(ValidationError::new(field, "Invalid email format"));
        }

        if value.len() > 255 {
            return Err(ValidationError::new(
                field,
                "Email must be at most 255 characters",
            ));
        }

        Ok(())
    }

    /// Validate value is not empty
    ///
    /// # Errors
    ///
    /// Returns a `ValidationError` when the value is blank.
    pub fn validate_required(field: &str, value: &str) -> Result<(), ValidationError> {
        if value.trim().is_empty() {
            return Err(ValidationError::new(field, "This field is required"));
        }
        Ok(())
    }

    /// Validate value is a UUID, the format of entity identifiers
    ///
    /// # Errors
    ///
    /// Returns a `ValidationError` when the value does not parse as a UUID.
    pub fn validate_uuid(field: &str, value: &str) -> Result<(), ValidationError> {
        if uuid::Uuid::parse_str(value).is_err() {
            return Err(ValidationError::new(field, "Must be a valid UUID"));
        }
        Ok(())
    }
}

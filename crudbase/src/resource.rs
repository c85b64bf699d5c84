//! Response formatting for single entities and collections.
//!
//! [`JsonResource`] renders `{data, success, message}`; [`ResourceCollection`]
//! renders `{data: [...], success, message}` plus `meta` and `links` when built
//! from a [`Page`].

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::{Map, Value};

use crate::pagination::Page;
use crate::response::{RETRIEVED_MESSAGE, envelope};

/// Output format of `created_at` / `updated_at`
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// What a formatter needs to know about an entity.
///
/// `id`, `created_at` and `updated_at` are emitted only when populated.
pub trait ToResource {
    fn resource_id(&self) -> Option<String>;

    fn created_at(&self) -> Option<DateTime<Utc>> {
        None
    }

    fn updated_at(&self) -> Option<DateTime<Utc>> {
        None
    }

    /// Add resource-specific fields after the standard ones
    fn extra_fields(&self, _data: &mut Map<String, Value>) {}
}

fn format_timestamp(value: DateTime<Utc>) -> Value {
    Value::String(value.format(TIMESTAMP_FORMAT).to_string())
}

fn to_map<T: ToResource + ?Sized>(item: &T) -> Map<String, Value> {
    let mut data = Map::new();
    if let Some(id) = item.resource_id() {
        data.insert("id".to_string(), Value::String(id));
    }
    if let Some(created_at) = item.created_at() {
        data.insert("created_at".to_string(), format_timestamp(created_at));
    }
    if let Some(updated_at) = item.updated_at() {
        data.insert("updated_at".to_string(), format_timestamp(updated_at));
    }
    item.extra_fields(&mut data);
    data
}

/// A single formatted entity
#[derive(Debug, Clone)]
pub struct JsonResource<T> {
    resource: T,
}

impl<T: ToResource> JsonResource<T> {
    pub fn new(resource: T) -> Self {
        Self { resource }
    }

    pub fn resource(&self) -> &T {
        &self.resource
    }

    /// The formatted entity
    pub fn to_array(&self) -> Map<String, Value> {
        to_map(&self.resource)
    }

    /// Top-level members added next to `data`
    pub fn with(&self) -> Map<String, Value> {
        envelope(true, RETRIEVED_MESSAGE)
    }

    pub fn to_json(&self) -> Value {
        let mut body = Map::new();
        body.insert("data".to_string(), Value::Object(self.to_array()));
        body.extend(self.with());
        Value::Object(body)
    }
}

impl<T: ToResource> IntoResponse for JsonResource<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, axum::Json(self.to_json())).into_response()
    }
}

/// A formatted list, optionally carrying pagination
#[derive(Debug, Clone)]
pub struct ResourceCollection<T> {
    items: Vec<T>,
    page: Option<Page<()>>,
}

impl<T: ToResource> ResourceCollection<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self { items, page: None }
    }

    pub fn from_page(page: Page<T>) -> Self {
        let mut items = Vec::with_capacity(page.items().len());
        let page = page.map(|item| items.push(item));
        Self {
            items,
            page: Some(page),
        }
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn to_array(&self) -> Map<String, Value> {
        let data = self
            .items
            .iter()
            .map(|item| Value::Object(to_map(item)))
            .collect();
        let mut body = Map::new();
        body.insert("data".to_string(), Value::Array(data));
        body
    }

    pub fn with(&self) -> Map<String, Value> {
        let mut body = envelope(true, RETRIEVED_MESSAGE);
        if let Some(page) = &self.page {
            body.insert("meta".to_string(), page.meta().to_json());
            body.insert("links".to_string(), page.links().to_json());
        }
        body
    }

    pub fn to_json(&self) -> Value {
        let mut body = self.to_array();
        body.extend(self.with());
        Value::Object(body)
    }
}

impl<T: ToResource> From<Vec<T>> for ResourceCollection<T> {
    fn from(items: Vec<T>) -> Self {
        Self::new(items)
    }
}

impl<T: ToResource> From<Page<T>> for ResourceCollection<T> {
    fn from(page: Page<T>) -> Self {
        Self::from_page(page)
    }
}

impl<T: ToResource> IntoResponse for ResourceCollection<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, axum::Json(self.to_json())).into_response()
    }
}

fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    let text = value.as_str()?;
    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Some(parsed.with_timezone(&Utc));
    }
    if let Ok(parsed) = DateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f%:z") {
        return Some(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Projected rows from `Repository::get_columns`.
///
/// Columns that were not selected are simply absent, so they are omitted from
/// the output too. Every other key is copied through.
impl ToResource for Map<String, Value> {
    fn resource_id(&self) -> Option<String> {
        match self.get("id")? {
            Value::Null => None,
            Value::String(id) => Some(id.clone()),
            other => Some(other.to_string()),
        }
    }

    fn created_at(&self) -> Option<DateTime<Utc>> {
        self.get("created_at").and_then(parse_timestamp)
    }

    fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.get("updated_at").and_then(parse_timestamp)
    }

    fn extra_fields(&self, data: &mut Map<String, Value>) {
        for (key, value) in self {
            if !matches!(key.as_str(), "id" | "created_at" | "updated_at") {
                data.insert(key.clone(), value.clone());
            }
        }
    }
}

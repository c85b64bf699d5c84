use sea_orm::Value;
use serde::Deserialize;
use serde_json::Value as JsonValue;
use utoipa::{IntoParams, ToSchema};

use crate::core::CRUDResource;
use crate::pagination::PageRequest;
use crate::query::{QuerySpec, parse_order};

/// Query-string parameters of a list endpoint.
///
/// # Filtering
/// `filter` is a JSON object of column/value pairs. A scalar value is an
/// equality match, an array matches any of its elements:
/// ```json
/// {"completed": false, "priority": [4, 5]}
/// ```
///
/// # Pagination
/// `page` (1-based) and `per_page`, capped at the resource's `MAX_PER_PAGE`.
///
/// # Sorting
/// `sort_by` names the column, `order` is `ASC` or `DESC` (default).
#[derive(Debug, Clone, Deserialize, IntoParams, ToSchema, Default)]
#[into_params(parameter_in = Query)]
pub struct ListParams {
    /// Page number (1-based).
    #[param(example = 1)]
    pub page: Option<u64>,
    /// Number of items per page.
    #[param(example = 15)]
    pub per_page: Option<u64>,
    /// Sort column.
    #[param(example = "created_at")]
    pub sort_by: Option<String>,
    /// Sort order (ASC or DESC).
    #[param(example = "DESC")]
    pub order: Option<String>,
    /// JSON-encoded equality filters.
    #[param(example = json!({"completed": false}))]
    pub filter: Option<String>,
}

impl ListParams {
    /// The page to fetch, with links built on `path`
    #[must_use]
    pub fn page_request<R: CRUDResource>(&self, path: impl Into<String>) -> PageRequest {
        let per_page = self
            .per_page
            .unwrap_or(R::DEFAULT_PER_PAGE)
            .clamp(1, R::MAX_PER_PAGE);
        PageRequest::new(self.page.unwrap_or(1), per_page).with_path(path)
    }

    /// Filters and sort order as a [`QuerySpec`].
    ///
    /// A `filter` that is not a JSON object is ignored. Column names are not
    /// checked here; the repository rejects unknown ones when the query runs.
    #[must_use]
    pub fn query_spec(&self) -> QuerySpec {
        let mut spec = QuerySpec::new();

        if let Some(filter) = &self.filter {
            match serde_json::from_str::<serde_json::Map<String, JsonValue>>(filter) {
                Ok(filters) => {
                    for (column, value) in filters {
                        spec = match value {
                            JsonValue::Array(values) => spec.where_in(
                                column,
                                values.iter().filter_map(filter_value).collect::<Vec<_>>(),
                            ),
                            other => match filter_value(&other) {
                                Some(value) => spec.where_eq(column, value),
                                None => {
                                    tracing::warn!(column, "Ignoring unsupported filter value");
                                    spec
                                }
                            },
                        };
                    }
                }
                Err(err) => tracing::warn!(error = %err, "Ignoring malformed filter parameter"),
            }
        }

        if let Some(sort_by) = &self.sort_by {
            let direction = parse_order(self.order.as_deref().unwrap_or("DESC"));
            spec = spec.order_by(sort_by.clone(), direction);
        }

        spec
    }
}

fn filter_value(value: &JsonValue) -> Option<Value> {
    match value {
        JsonValue::String(text) => Some(text.clone().into()),
        JsonValue::Bool(flag) => Some((*flag).into()),
        JsonValue::Number(number) => number
            .as_i64()
            .map(Value::from)
            .or_else(|| number.as_f64().map(Value::from)),
        JsonValue::Null | JsonValue::Array(_) | JsonValue::Object(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::Filter;
    use sea_orm::Order;

    #[test]
    fn test_query_spec_matches_builder_chain() {
        let params = ListParams {
            sort_by: Some("title".to_string()),
            order: Some("asc".to_string()),
            filter: Some(r#"{"completed": true, "priority": [4, 5]}"#.to_string()),
            ..Default::default()
        };

        let expected = QuerySpec::new()
            .where_eq("completed", true)
            .where_in("priority", [4_i64, 5])
            .order_by("title", Order::Asc);
        assert_eq!(params.query_spec(), expected);
    }

    #[test]
    fn test_missing_order_sorts_descending() {
        let params = ListParams {
            sort_by: Some("created_at".to_string()),
            ..Default::default()
        };
        assert_eq!(params.query_spec().sorts()[0].direction, Order::Desc);
    }

    #[test]
    fn test_malformed_filter_is_ignored() {
        let params = ListParams {
            filter: Some("not json".to_string()),
            ..Default::default()
        };
        assert!(params.query_spec().is_empty());
    }

    #[test]
    fn test_null_filter_value_is_skipped() {
        let params = ListParams {
            filter: Some(r#"{"title": null, "done": false}"#.to_string()),
            ..Default::default()
        };
        let spec = params.query_spec();
        assert_eq!(spec.filters().len(), 1);
        assert_eq!(spec.filters()[0].column(), "done");
        assert!(matches!(spec.filters()[0], Filter::Eq { .. }));
    }
}

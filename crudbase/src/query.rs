//! # Query Specifications
//!
//! A [`QuerySpec`] is a plain value describing filters, sort order and
//! relations to eager-load. Builders take the spec by value and return the
//! extended spec, so a spec handed to a terminal repository call can't leak
//! into the next one:
//!
//! ```rust,ignore
//! use crudbase::QuerySpec;
//! use sea_orm::Order;
//!
//! let open_urgent = QuerySpec::new()
//!     .where_eq("completed", false)
//!     .where_between("priority", 4, 5)
//!     .order_by("created_at", Order::Desc);
//!
//! let tasks = repository.scoped(open_urgent.clone()).all().await?;
//! let total = repository.scoped(open_urgent).count().await?;
//! ```
//!
//! Column names are checked against the entity's columns when the query runs;
//! an unknown name is a 400 `BadRequest`.

use sea_orm::{
    ColumnTrait, Condition, EntityTrait, Order, QueryFilter, QueryOrder, Select, Value,
    sea_query::SimpleExpr,
};

use crate::errors::ApiError;

/// A single filter predicate
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// `column = value`
    Eq { column: String, value: Value },
    /// `column LIKE '%value%'`
    Like { column: String, value: String },
    /// `column IN (values)`
    In { column: String, values: Vec<Value> },
    /// `column BETWEEN low AND high`
    Between {
        column: String,
        low: Value,
        high: Value,
    },
}

impl Filter {
    #[must_use]
    pub fn column(&self) -> &str {
        match self {
            Self::Eq { column, .. }
            | Self::Like { column, .. }
            | Self::In { column, .. }
            | Self::Between { column, .. } => column,
        }
    }

    fn to_expr<C: ColumnTrait>(&self) -> Result<SimpleExpr, ApiError> {
        let column = resolve_column::<C>(self.column())?;
        Ok(match self {
            Self::Eq { value, .. } => column.eq(value.clone()),
            Self::Like { value, .. } => column.like(format!("%{value}%")),
            Self::In { values, .. } => column.is_in(values.iter().cloned()),
            Self::Between { low, high, .. } => column.between(low.clone(), high.clone()),
        })
    }
}

/// A sort instruction
#[derive(Debug, Clone, PartialEq)]
pub struct Sort {
    pub column: String,
    pub direction: Order,
}

/// Filters, sorts and eager-load relation names for one terminal call
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuerySpec {
    filters: Vec<Filter>,
    sorts: Vec<Sort>,
    relations: Vec<String>,
}

impl QuerySpec {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    #[must_use]
    pub fn where_eq(self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter(Filter::Eq {
            column: column.into(),
            value: value.into(),
        })
    }

    /// One equality filter per `(column, value)` pair
    #[must_use]
    pub fn where_all<K, V>(self, conditions: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        conditions
            .into_iter()
            .fold(self, |spec, (column, value)| spec.where_eq(column, value))
    }

    /// Substring match, `%value%`
    #[must_use]
    pub fn where_like(self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.filter(Filter::Like {
            column: column.into(),
            value: value.into(),
        })
    }

    #[must_use]
    pub fn where_in<V: Into<Value>>(
        self,
        column: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        self.filter(Filter::In {
            column: column.into(),
            values: values.into_iter().map(Into::into).collect(),
        })
    }

    /// Inclusive range
    #[must_use]
    pub fn where_between<V: Into<Value>>(self, column: impl Into<String>, low: V, high: V) -> Self {
        self.filter(Filter::Between {
            column: column.into(),
            low: low.into(),
            high: high.into(),
        })
    }

    #[must_use]
    pub fn order_by(mut self, column: impl Into<String>, direction: Order) -> Self {
        self.sorts.push(Sort {
            column: column.into(),
            direction,
        });
        self
    }

    /// Add relations to eager-load
    #[must_use]
    pub fn with<S: Into<String>>(mut self, relations: impl IntoIterator<Item = S>) -> Self {
        self.relations.extend(relations.into_iter().map(Into::into));
        self
    }

    /// Replace the relations to eager-load
    #[must_use]
    pub fn with_relations<S: Into<String>>(
        mut self,
        relations: impl IntoIterator<Item = S>,
    ) -> Self {
        self.relations = relations.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    #[must_use]
    pub fn sorts(&self) -> &[Sort] {
        &self.sorts
    }

    #[must_use]
    pub fn relations(&self) -> &[String] {
        &self.relations
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty() && self.sorts.is_empty() && self.relations.is_empty()
    }

    /// All filters joined with AND
    ///
    /// # Errors
    ///
    /// `ApiError::BadRequest` when a filter names an unknown column.
    pub fn condition<C: ColumnTrait>(&self) -> Result<Condition, ApiError> {
        self.filters
            .iter()
            .try_fold(Condition::all(), |condition, filter| {
                Ok(condition.add(filter.to_expr::<C>()?))
            })
    }

    /// Apply filters and sort order to a select
    ///
    /// # Errors
    ///
    /// `ApiError::BadRequest` when a filter or sort names an unknown column.
    pub fn apply<E: EntityTrait>(&self, select: Select<E>) -> Result<Select<E>, ApiError> {
        let mut select = select.filter(self.condition::<E::Column>()?);
        for sort in &self.sorts {
            select = select.order_by(
                resolve_column::<E::Column>(&sort.column)?,
                sort.direction.clone(),
            );
        }
        Ok(select)
    }
}

/// Look up a column of `C` by its database name
///
/// # Errors
///
/// `ApiError::BadRequest` when no column has that name.
pub fn resolve_column<C: ColumnTrait>(name: &str) -> Result<C, ApiError> {
    C::iter()
        .find(|column| column.as_str() == name)
        .ok_or_else(|| ApiError::bad_request(format!("Unknown column '{name}'")))
}

/// Parse a sort direction; anything but `asc` (any case) sorts descending
#[must_use]
pub fn parse_order(direction: &str) -> Order {
    if direction.eq_ignore_ascii_case("asc") {
        Order::Asc
    } else {
        Order::Desc
    }
}

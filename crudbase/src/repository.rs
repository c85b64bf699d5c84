//! # Generic Repository
//!
//! [`Repository`] offers CRUD and query operations for one [`CRUDResource`].
//! Filter builders start a [`Scoped`] query that owns its [`QuerySpec`]; the
//! terminal call consumes the scope, so filters configured for one call are
//! never seen by the next:
//!
//! ```rust,ignore
//! let tasks: Repository<Task> = Repository::new(db.clone());
//!
//! let done = tasks.where_eq("completed", true).order_by("title", Order::Asc).all().await?;
//! let everything = tasks.all().await?; // unfiltered
//!
//! let task = tasks.create(TaskCreate { title: "Write report".into(), ..Default::default() }).await?;
//! let task = tasks.update(&task.id, TaskUpdate { completed: Some(true), ..Default::default() }).await?;
//! tasks.delete(&task.id).await?;
//! ```
//!
//! A repository holds only a connection handle. It is cheap to clone and can
//! be shared between concurrent requests. No transactions are opened here, so
//! read-then-write operations (`update`, `delete`, `first_or_create`,
//! `update_or_create`) are not atomic against concurrent writers.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IdenStatic, IntoActiveModel,
    PaginatorTrait, QueryFilter, QuerySelect, Select, Value,
};
use serde_json::{Map, Value as JsonValue};
use std::collections::BTreeMap;
use std::marker::PhantomData;

use crate::core::{CRUDResource, MergeIntoActiveModel};
use crate::errors::ApiError;
use crate::pagination::{Page, PageRequest};
use crate::query::{QuerySpec, resolve_column};

/// Data access for one resource type
pub struct Repository<R> {
    db: DatabaseConnection,
    _resource: PhantomData<fn() -> R>,
}

impl<R> Clone for Repository<R> {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
            _resource: PhantomData,
        }
    }
}

impl<R> std::fmt::Debug for Repository<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repository")
            .field("resource", &std::any::type_name::<R>())
            .finish_non_exhaustive()
    }
}

impl<R: CRUDResource> Repository<R> {
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            db,
            _resource: PhantomData,
        }
    }

    #[must_use]
    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }

    /// An unfiltered scope
    #[must_use]
    pub fn query(&self) -> Scoped<'_, R> {
        self.scoped(QuerySpec::new())
    }

    /// A scope running the given spec
    #[must_use]
    pub fn scoped(&self, spec: QuerySpec) -> Scoped<'_, R> {
        Scoped {
            repository: self,
            spec,
        }
    }

    // Builders: each starts a scoped query

    #[must_use]
    pub fn where_eq(&self, column: impl Into<String>, value: impl Into<Value>) -> Scoped<'_, R> {
        self.query().where_eq(column, value)
    }

    #[must_use]
    pub fn where_all<K, V>(&self, conditions: impl IntoIterator<Item = (K, V)>) -> Scoped<'_, R>
    where
        K: Into<String>,
        V: Into<Value>,
    {
        self.query().where_all(conditions)
    }

    #[must_use]
    pub fn where_like(&self, column: impl Into<String>, value: impl Into<String>) -> Scoped<'_, R> {
        self.query().where_like(column, value)
    }

    #[must_use]
    pub fn where_in<V: Into<Value>>(
        &self,
        column: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Scoped<'_, R> {
        self.query().where_in(column, values)
    }

    #[must_use]
    pub fn where_between<V: Into<Value>>(
        &self,
        column: impl Into<String>,
        low: V,
        high: V,
    ) -> Scoped<'_, R> {
        self.query().where_between(column, low, high)
    }

    #[must_use]
    pub fn order_by(&self, column: impl Into<String>, direction: sea_orm::Order) -> Scoped<'_, R> {
        self.query().order_by(column, direction)
    }

    #[must_use]
    pub fn with<S: Into<String>>(&self, relations: impl IntoIterator<Item = S>) -> Scoped<'_, R> {
        self.query().with(relations)
    }

    #[must_use]
    pub fn with_relations<S: Into<String>>(
        &self,
        relations: impl IntoIterator<Item = S>,
    ) -> Scoped<'_, R> {
        self.query().with_relations(relations)
    }

    // Terminals on the unfiltered scope

    /// # Errors
    /// Database errors.
    pub async fn all(&self) -> Result<Vec<R>, ApiError> {
        self.query().all().await
    }

    /// # Errors
    /// `BadRequest` for unknown columns, database errors.
    pub async fn get_columns(&self, columns: &[&str]) -> Result<Vec<Map<String, JsonValue>>, ApiError> {
        self.query().get_columns(columns).await
    }

    /// # Errors
    /// Database errors. A missing row is `Ok(None)`.
    pub async fn find(&self, id: &str) -> Result<Option<R>, ApiError> {
        self.query().find(id).await
    }

    /// # Errors
    /// `NotFound` when no row has `id`, database errors.
    pub async fn find_or_fail(&self, id: &str) -> Result<R, ApiError> {
        self.query().find_or_fail(id).await
    }

    /// # Errors
    /// `BadRequest` for an unknown field, database errors.
    pub async fn find_by_field(
        &self,
        field: &str,
        value: impl Into<Value>,
    ) -> Result<Option<R>, ApiError> {
        self.query().find_by_field(field, value).await
    }

    /// # Errors
    /// `BadRequest` for an unknown field, database errors.
    pub async fn get_by_field(&self, field: &str, value: impl Into<Value>) -> Result<Vec<R>, ApiError> {
        self.query().get_by_field(field, value).await
    }

    /// # Errors
    /// `BadRequest` for unknown columns, database errors.
    pub async fn pluck_by_field(
        &self,
        column: &str,
        key_column: &str,
    ) -> Result<BTreeMap<String, JsonValue>, ApiError> {
        self.query().pluck_by_field(column, key_column).await
    }

    /// `pluck_by_field` keyed by `id`
    ///
    /// # Errors
    /// `BadRequest` for an unknown column, database errors.
    pub async fn pluck_by_id(&self, column: &str) -> Result<BTreeMap<String, JsonValue>, ApiError> {
        self.query().pluck_by_id(column).await
    }

    /// # Errors
    /// Database errors.
    pub async fn paginate(&self, per_page: u64) -> Result<Page<R>, ApiError> {
        self.query().paginate(per_page).await
    }

    /// # Errors
    /// Database errors.
    pub async fn paginate_with(&self, request: &PageRequest) -> Result<Page<R>, ApiError> {
        self.query().paginate_with(request).await
    }

    /// # Errors
    /// Database errors.
    pub async fn count(&self) -> Result<u64, ApiError> {
        self.query().count().await
    }

    // Writes

    /// Insert a row and return it as stored.
    ///
    /// # Errors
    /// `Conflict` on unique violations, database errors.
    pub async fn create(&self, data: R::CreateModel) -> Result<R, ApiError> {
        self.insert_active(data.into()).await
    }

    /// Merge `data` onto the stored row, persist it and return it as stored.
    ///
    /// # Errors
    /// `NotFound` when no row has `id`, `Conflict` on unique violations,
    /// database errors.
    pub async fn update(&self, id: &str, data: R::UpdateModel) -> Result<R, ApiError> {
        let model = self.find_model(id).await?;
        let merged = data.merge_into_activemodel(model.into_active_model())?;
        merged.update(&self.db).await.map_err(ApiError::from_write)?;
        tracing::debug!(resource = R::RESOURCE_NAME_SINGULAR, id, "Updated record");
        self.fresh(id).await
    }

    /// Hard delete.
    ///
    /// # Errors
    /// `NotFound` when no row has `id`, database errors.
    pub async fn delete(&self, id: &str) -> Result<bool, ApiError> {
        self.find_model(id).await?;
        let result = R::EntityType::delete_many()
            .filter(R::ID_COLUMN.eq(id))
            .exec(&self.db)
            .await?;
        tracing::debug!(resource = R::RESOURCE_NAME_SINGULAR, id, "Deleted record");
        Ok(result.rows_affected > 0)
    }

    /// The first row matching every `(column, value)` pair, or a newly
    /// inserted `values` with those pairs written over it. Values must fit
    /// their column's type.
    ///
    /// # Errors
    /// `BadRequest` for unknown columns, `Conflict` on unique violations,
    /// database errors.
    pub async fn first_or_create<K, V>(
        &self,
        attributes: impl IntoIterator<Item = (K, V)>,
        values: R::CreateModel,
    ) -> Result<R, ApiError>
    where
        K: Into<String>,
        V: Into<Value>,
    {
        let attributes = collect_attributes(attributes);
        match self.first_matching(&attributes).await? {
            Some(model) => Ok(model.into()),
            None => self.create_with(values, &attributes).await,
        }
    }

    /// Merge `values` onto the first row matching every `(column, value)`
    /// pair, or insert `values` plus those pairs when nothing matches.
    ///
    /// # Errors
    /// `BadRequest` for unknown columns, `Conflict` on unique violations,
    /// database errors.
    pub async fn update_or_create<K, V>(
        &self,
        attributes: impl IntoIterator<Item = (K, V)>,
        values: R::CreateModel,
    ) -> Result<R, ApiError>
    where
        K: Into<String>,
        V: Into<Value>,
        R::CreateModel: MergeIntoActiveModel<R::ActiveModelType>,
    {
        let attributes = collect_attributes(attributes);
        let Some(model) = self.first_matching(&attributes).await? else {
            return self.create_with(values, &attributes).await;
        };

        let existing: R = model.clone().into();
        let id = existing.id().to_string();
        let merged = values.merge_into_activemodel(model.into_active_model())?;
        merged.update(&self.db).await.map_err(ApiError::from_write)?;
        self.fresh(&id).await
    }

    /// Filters of any scope don't apply here.
    async fn first_matching(
        &self,
        attributes: &[(String, Value)],
    ) -> Result<Option<R::ModelType>, ApiError> {
        let condition = QuerySpec::new()
            .where_all(attributes.iter().cloned())
            .condition::<R::ColumnType>()?;
        Ok(R::EntityType::find()
            .filter(condition)
            .one(&self.db)
            .await?)
    }

    async fn insert_active(&self, active_model: R::ActiveModelType) -> Result<R, ApiError> {
        let model = active_model
            .insert(&self.db)
            .await
            .map_err(ApiError::from_write)?;
        let created: R = model.into();
        tracing::debug!(
            resource = R::RESOURCE_NAME_SINGULAR,
            id = created.id(),
            "Created record"
        );
        self.fresh(created.id()).await
    }

    async fn create_with(
        &self,
        values: R::CreateModel,
        attributes: &[(String, Value)],
    ) -> Result<R, ApiError> {
        let mut active_model: R::ActiveModelType = values.into();
        for (name, value) in attributes {
            let column = resolve_column::<R::ColumnType>(name)?;
            active_model
                .try_set(column, value.clone())
                .map_err(|_| {
                    ApiError::bad_request(format!("Invalid value for column '{name}'"))
                })?;
        }
        self.insert_active(active_model).await
    }

    async fn find_model(&self, id: &str) -> Result<R::ModelType, ApiError> {
        R::EntityType::find()
            .filter(R::ID_COLUMN.eq(id))
            .one(&self.db)
            .await?
            .ok_or_else(|| not_found::<R>(id))
    }

    /// Reload a row so defaults and hooks applied by the database show up
    async fn fresh(&self, id: &str) -> Result<R, ApiError> {
        Ok(self.find_model(id).await?.into())
    }
}

fn collect_attributes<K, V>(attributes: impl IntoIterator<Item = (K, V)>) -> Vec<(String, Value)>
where
    K: Into<String>,
    V: Into<Value>,
{
    attributes
        .into_iter()
        .map(|(column, value)| (column.into(), value.into()))
        .collect()
}

fn not_found<R: CRUDResource>(id: &str) -> ApiError {
    ApiError::not_found(R::RESOURCE_NAME_SINGULAR, Some(id.to_string()))
}

/// A repository borrow plus the spec for exactly one terminal call
#[derive(Debug)]
pub struct Scoped<'r, R> {
    repository: &'r Repository<R>,
    spec: QuerySpec,
}

impl<R: CRUDResource> Scoped<'_, R> {
    #[must_use]
    pub fn spec(&self) -> &QuerySpec {
        &self.spec
    }

    #[must_use]
    pub fn where_eq(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.spec = self.spec.where_eq(column, value);
        self
    }

    #[must_use]
    pub fn where_all<K, V>(mut self, conditions: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        self.spec = self.spec.where_all(conditions);
        self
    }

    #[must_use]
    pub fn where_like(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.spec = self.spec.where_like(column, value);
        self
    }

    #[must_use]
    pub fn where_in<V: Into<Value>>(
        mut self,
        column: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        self.spec = self.spec.where_in(column, values);
        self
    }

    #[must_use]
    pub fn where_between<V: Into<Value>>(mut self, column: impl Into<String>, low: V, high: V) -> Self {
        self.spec = self.spec.where_between(column, low, high);
        self
    }

    #[must_use]
    pub fn order_by(mut self, column: impl Into<String>, direction: sea_orm::Order) -> Self {
        self.spec = self.spec.order_by(column, direction);
        self
    }

    #[must_use]
    pub fn with<S: Into<String>>(mut self, relations: impl IntoIterator<Item = S>) -> Self {
        self.spec = self.spec.with(relations);
        self
    }

    #[must_use]
    pub fn with_relations<S: Into<String>>(mut self, relations: impl IntoIterator<Item = S>) -> Self {
        self.spec = self.spec.with_relations(relations);
        self
    }

    fn select(&self) -> Result<Select<R::EntityType>, ApiError> {
        self.spec.apply(R::EntityType::find())
    }

    fn db(&self) -> &DatabaseConnection {
        self.repository.db()
    }

    async fn hydrate(&self, models: Vec<R::ModelType>) -> Result<Vec<R>, ApiError> {
        let mut items: Vec<R> = models.into_iter().map(Into::into).collect();
        R::load_relations(self.db(), &mut items, self.spec.relations()).await?;
        Ok(items)
    }

    fn trace(&self, operation: &'static str) {
        tracing::debug!(
            resource = R::RESOURCE_NAME_PLURAL,
            operation,
            filters = self.spec.filters().len(),
            sorts = self.spec.sorts().len(),
            relations = ?self.spec.relations(),
            "Running repository query"
        );
    }

    /// # Errors
    /// `BadRequest` for unknown columns or relations, database errors.
    pub async fn all(self) -> Result<Vec<R>, ApiError> {
        self.trace("all");
        let models = self.select()?.all(self.db()).await?;
        self.hydrate(models).await
    }

    /// Rows projected to `columns`; an empty slice selects every column.
    ///
    /// # Errors
    /// `BadRequest` for unknown columns, database errors.
    pub async fn get_columns(self, columns: &[&str]) -> Result<Vec<Map<String, JsonValue>>, ApiError> {
        self.trace("get_columns");
        let mut select = self.select()?;
        if !columns.is_empty() {
            select = select.select_only();
            for name in columns {
                select = select.column(resolve_column::<R::ColumnType>(name)?);
            }
        }
        let rows = select.into_json().all(self.db()).await?;
        Ok(rows
            .into_iter()
            .filter_map(|row| match row {
                JsonValue::Object(map) => Some(map),
                _ => None,
            })
            .collect())
    }

    /// # Errors
    /// `BadRequest` for unknown columns or relations, database errors.
    pub async fn find(self, id: &str) -> Result<Option<R>, ApiError> {
        self.trace("find");
        let model = self
            .select()?
            .filter(R::ID_COLUMN.eq(id))
            .one(self.db())
            .await?;
        Ok(self.hydrate(model.into_iter().collect()).await?.pop())
    }

    /// # Errors
    /// `NotFound` when no matching row has `id`.
    pub async fn find_or_fail(self, id: &str) -> Result<R, ApiError> {
        self.find(id).await?.ok_or_else(|| not_found::<R>(id))
    }

    /// # Errors
    /// `BadRequest` for unknown columns or relations, database errors.
    pub async fn find_by_field(self, field: &str, value: impl Into<Value>) -> Result<Option<R>, ApiError> {
        self.trace("find_by_field");
        let column = resolve_column::<R::ColumnType>(field)?;
        let model = self
            .select()?
            .filter(column.eq(value))
            .one(self.db())
            .await?;
        Ok(self.hydrate(model.into_iter().collect()).await?.pop())
    }

    /// # Errors
    /// `BadRequest` for unknown columns or relations, database errors.
    pub async fn get_by_field(self, field: &str, value: impl Into<Value>) -> Result<Vec<R>, ApiError> {
        self.trace("get_by_field");
        let column = resolve_column::<R::ColumnType>(field)?;
        let models = self
            .select()?
            .filter(column.eq(value))
            .all(self.db())
            .await?;
        self.hydrate(models).await
    }

    /// Map of `key_column` (rendered as text) to `column`
    ///
    /// # Errors
    /// `BadRequest` for unknown columns, database errors.
    pub async fn pluck_by_field(
        self,
        column: &str,
        key_column: &str,
    ) -> Result<BTreeMap<String, JsonValue>, ApiError> {
        let rows = self.get_columns(&[key_column, column]).await?;
        Ok(rows
            .into_iter()
            .filter_map(|row| {
                let key = match row.get(key_column)? {
                    JsonValue::String(key) => key.clone(),
                    other => other.to_string(),
                };
                Some((key, row.get(column).cloned().unwrap_or(JsonValue::Null)))
            })
            .collect())
    }

    /// # Errors
    /// `BadRequest` for an unknown column, database errors.
    pub async fn pluck_by_id(self, column: &str) -> Result<BTreeMap<String, JsonValue>, ApiError> {
        let id_column = R::ID_COLUMN;
        self.pluck_by_field(column, id_column.as_str()).await
    }

    /// The first page with `per_page` items
    ///
    /// # Errors
    /// `BadRequest` for unknown columns or relations, database errors.
    pub async fn paginate(self, per_page: u64) -> Result<Page<R>, ApiError> {
        self.paginate_with(&PageRequest::new(1, per_page)).await
    }

    /// # Errors
    /// `BadRequest` for unknown columns or relations, database errors.
    pub async fn paginate_with(self, request: &PageRequest) -> Result<Page<R>, ApiError> {
        self.trace("paginate");
        let select = self.select()?;
        let total = select.clone().count(self.db()).await?;
        let models = select
            .offset(request.offset())
            .limit(request.per_page())
            .all(self.db())
            .await?;
        let items = self.hydrate(models).await?;
        Ok(Page::new(items, total, request))
    }

    /// Rows matching the filters; sorts and relations are ignored.
    ///
    /// # Errors
    /// `BadRequest` for unknown columns, database errors.
    pub async fn count(self) -> Result<u64, ApiError> {
        self.trace("count");
        let condition = self.spec.condition::<R::ColumnType>()?;
        Ok(R::EntityType::find()
            .filter(condition)
            .count(self.db())
            .await?)
    }
}

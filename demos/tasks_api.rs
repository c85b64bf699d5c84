//! Task API built on crudbase
//!
//! ```bash
//! RUST_LOG=crudbase=debug cargo run --example tasks_api
//! ```
//!
//! Then try:
//! - `curl -X POST localhost:3000/tasks -H 'content-type: application/json' -d '{"title":"Write report","priority":2}'`
//! - `curl 'localhost:3000/tasks?sort_by=priority&order=asc&per_page=5'`
//! - `curl 'localhost:3000/tasks?filter=%7B%22completed%22%3Atrue%7D'`

use async_trait::async_trait;
use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
};
use chrono::{DateTime, Utc};
use crudbase::model::{stamp_identity, stamp_timestamps};
use crudbase::validation::validators::{validate_length, validate_range, validate_required};
use crudbase::{
    ApiError, ApiResponse, CRUDResource, CrudService, FormRequest, JsonResource, ListParams,
    MergeIntoActiveModel, ResourceCollection, ResourceService, ToResource, Validated,
    ValidationErrors, response,
};
use sea_orm::{ActiveValue, Database, entity::prelude::*};
use serde::Deserialize;
use serde_json::{Map, Value as JsonValue, json};
use std::env;
use tracing_subscriber::EnvFilter;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "tasks")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub title: String,
    pub priority: i32,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(mut self, _db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        if insert {
            stamp_identity(&mut self.id);
        }
        stamp_timestamps(&mut self.created_at, &mut self.updated_at, insert);
        Ok(self)
    }
}

#[derive(Clone, Debug)]
pub struct Task {
    id: String,
    title: String,
    priority: i32,
    completed: bool,
    created_at: DateTime<Utc>,
    updated_at: Option<DateTime<Utc>>,
}

impl From<Model> for Task {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            title: model.title,
            priority: model.priority,
            completed: model.completed,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[derive(Deserialize)]
pub struct TaskCreate {
    title: String,
    #[serde(default = "default_priority")]
    priority: i32,
}

fn default_priority() -> i32 {
    3
}

impl From<TaskCreate> for ActiveModel {
    fn from(create: TaskCreate) -> Self {
        Self {
            id: ActiveValue::NotSet,
            title: ActiveValue::Set(create.title),
            priority: ActiveValue::Set(create.priority),
            completed: ActiveValue::Set(false),
            created_at: ActiveValue::NotSet,
            updated_at: ActiveValue::NotSet,
        }
    }
}

impl FormRequest for TaskCreate {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.check(validate_required("title", &self.title));
        errors.check(validate_length("title", &self.title, None, Some(200)));
        errors.check(validate_range("priority", self.priority, Some(1), Some(5)));
        errors.result()
    }
}

#[derive(Deserialize)]
pub struct TaskUpdate {
    title: Option<String>,
    priority: Option<i32>,
    completed: Option<bool>,
}

impl MergeIntoActiveModel<ActiveModel> for TaskUpdate {
    fn merge_into_activemodel(self, mut existing: ActiveModel) -> Result<ActiveModel, DbErr> {
        if let Some(title) = self.title {
            existing.title = ActiveValue::Set(title);
        }
        if let Some(priority) = self.priority {
            existing.priority = ActiveValue::Set(priority);
        }
        if let Some(completed) = self.completed {
            existing.completed = ActiveValue::Set(completed);
        }
        Ok(existing)
    }
}

#[async_trait]
impl CRUDResource for Task {
    type EntityType = Entity;
    type ModelType = Model;
    type ColumnType = Column;
    type ActiveModelType = ActiveModel;
    type CreateModel = TaskCreate;
    type UpdateModel = TaskUpdate;

    const ID_COLUMN: Column = Column::Id;
    const RESOURCE_NAME_SINGULAR: &'static str = "task";
    const RESOURCE_NAME_PLURAL: &'static str = "tasks";

    fn id(&self) -> &str {
        &self.id
    }
}

impl ToResource for Task {
    fn resource_id(&self) -> Option<String> {
        Some(self.id.clone())
    }

    fn created_at(&self) -> Option<DateTime<Utc>> {
        Some(self.created_at)
    }

    fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    fn extra_fields(&self, data: &mut Map<String, JsonValue>) {
        data.insert("title".to_string(), json!(self.title));
        data.insert("priority".to_string(), json!(self.priority));
        data.insert("completed".to_string(), json!(self.completed));
    }
}

type Tasks = ResourceService<Task>;

async fn index(
    State(tasks): State<Tasks>,
    Query(params): Query<ListParams>,
) -> Result<ResourceCollection<Task>, ApiError> {
    let request = params.page_request::<Task>("/tasks");
    let page = tasks
        .repository()
        .scoped(params.query_spec())
        .paginate_with(&request)
        .await?;
    Ok(page.into())
}

async fn show(State(tasks): State<Tasks>, Path(id): Path<String>) -> Result<JsonResource<Task>, ApiError> {
    Ok(JsonResource::new(tasks.repository().find_or_fail(&id).await?))
}

async fn store(
    State(tasks): State<Tasks>,
    Validated(input): Validated<TaskCreate>,
) -> Result<ApiResponse, ApiError> {
    let task = tasks.create(input).await?;
    Ok(response::success(
        "Task created.",
        Some(JsonValue::Object(JsonResource::new(task).to_array())),
        StatusCode::CREATED,
        Map::new(),
    ))
}

async fn update(
    State(tasks): State<Tasks>,
    Path(id): Path<String>,
    Json(input): Json<TaskUpdate>,
) -> Result<JsonResource<Task>, ApiError> {
    Ok(JsonResource::new(tasks.update(&id, input).await?))
}

async fn destroy(State(tasks): State<Tasks>, Path(id): Path<String>) -> Result<ApiResponse, ApiError> {
    tasks.delete(&id).await?;
    Ok(response::success("Task deleted.", None, StatusCode::OK, Map::new()))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let database_url = env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite::memory:".to_string());
    let db = Database::connect(&database_url).await?;

    db.execute_unprepared(
        r"CREATE TABLE IF NOT EXISTS tasks (
            id TEXT PRIMARY KEY NOT NULL,
            title TEXT NOT NULL,
            priority INTEGER NOT NULL DEFAULT 3,
            completed BOOLEAN NOT NULL DEFAULT FALSE,
            created_at TEXT NOT NULL,
            updated_at TEXT
        );",
    )
    .await?;

    let app = Router::new()
        .route("/tasks", get(index).post(store))
        .route("/tasks/{id}", get(show).put(update).delete(destroy))
        .with_state(Tasks::new(db));

    let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
    tracing::info!("Task API listening on http://0.0.0.0:3000/tasks");
    axum::serve(listener, app).await?;
    Ok(())
}

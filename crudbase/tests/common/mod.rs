#![allow(dead_code)]

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
};
use crudbase::{
    ApiError, ApiResponse, CrudService, JsonResource, ListParams, ResourceCollection,
    ResourceService, Validated, response,
};
use sea_orm::{Database, DatabaseConnection, DbErr};
use sea_orm_migration::prelude::*;
use serde_json::{Map, Value};

pub mod project_entity;
pub mod task_entity;

use project_entity::{Project, ProjectCreate};
use task_entity::{Task, TaskCreate, TaskUpdate};

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub async fn setup_test_db() -> Result<DatabaseConnection, DbErr> {
    init_tracing();
    let db = Database::connect("sqlite::memory:").await?;

    // Run migrations
    Migrator::up(&db, None).await?;

    Ok(db)
}

pub fn task(title: &str, priority: i32) -> TaskCreate {
    TaskCreate {
        project_id: None,
        title: title.to_string(),
        priority,
        completed: false,
    }
}

pub fn project(name: &str) -> ProjectCreate {
    ProjectCreate {
        name: name.to_string(),
    }
}

type TaskService = ResourceService<Task>;

async fn list_tasks(
    State(tasks): State<TaskService>,
    Query(params): Query<ListParams>,
) -> Result<ResourceCollection<Task>, ApiError> {
    let request = params.page_request::<Task>("/api/v1/tasks");
    let page = tasks
        .repository()
        .scoped(params.query_spec())
        .paginate_with(&request)
        .await?;
    Ok(ResourceCollection::from(page))
}

async fn show_task(
    State(tasks): State<TaskService>,
    Path(id): Path<String>,
) -> Result<JsonResource<Task>, ApiError> {
    let task = tasks.repository().find_or_fail(&id).await?;
    Ok(JsonResource::new(task))
}

async fn create_task(
    State(tasks): State<TaskService>,
    Validated(input): Validated<TaskCreate>,
) -> Result<ApiResponse, ApiError> {
    let task = tasks.create(input).await?;
    let data = JsonResource::new(task).to_array();
    Ok(response::success(
        "Task created.",
        Some(Value::Object(data)),
        StatusCode::CREATED,
        Map::new(),
    ))
}

async fn update_task(
    State(tasks): State<TaskService>,
    Path(id): Path<String>,
    Json(input): Json<TaskUpdate>,
) -> Result<JsonResource<Task>, ApiError> {
    Ok(JsonResource::new(tasks.update(&id, input).await?))
}

async fn delete_task(
    State(tasks): State<TaskService>,
    Path(id): Path<String>,
) -> Result<ApiResponse, ApiError> {
    tasks.delete(&id).await?;
    Ok(response::success(
        "Task deleted.",
        None,
        StatusCode::OK,
        Map::new(),
    ))
}

pub fn setup_task_app(db: DatabaseConnection) -> Router {
    let api = Router::new()
        .route("/tasks", get(list_tasks).post(create_task))
        .route(
            "/tasks/{id}",
            get(show_task).put(update_task).delete(delete_task),
        )
        .with_state(TaskService::new(db));

    Router::new().nest("/api/v1", api)
}

pub async fn seed_project_with_tasks(
    db: &DatabaseConnection,
    name: &str,
    titles: &[&str],
) -> Result<Project, ApiError> {
    let projects = crudbase::Repository::<Project>::new(db.clone());
    let tasks = crudbase::Repository::<Task>::new(db.clone());

    let created = projects.create(project(name)).await?;
    for title in titles {
        tasks
            .create(TaskCreate {
                project_id: Some(created.id.clone()),
                ..task(title, 3)
            })
            .await?;
    }
    Ok(created)
}

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![Box::new(CreateProjectTable), Box::new(CreateTaskTable)]
    }
}

pub struct CreateProjectTable;

impl MigrationName for CreateProjectTable {
    fn name(&self) -> &'static str {
        "m20240101_000001_create_project_table"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for CreateProjectTable {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Projects::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Projects::Id).string().not_null().primary_key())
                    .col(
                        ColumnDef::new(Projects::Name)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(Projects::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Projects::UpdatedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Projects::Table).to_owned())
            .await
    }
}

pub struct CreateTaskTable;

impl MigrationName for CreateTaskTable {
    fn name(&self) -> &'static str {
        "m20240101_000002_create_task_table"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for CreateTaskTable {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Tasks::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Tasks::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Tasks::ProjectId).string().null())
                    .col(ColumnDef::new(Tasks::Title).string().not_null())
                    .col(
                        ColumnDef::new(Tasks::Priority)
                            .integer()
                            .not_null()
                            .default(3),
                    )
                    .col(
                        ColumnDef::new(Tasks::Completed)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Tasks::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Tasks::UpdatedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Tasks::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Projects {
    Table,
    Id,
    Name,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Tasks {
    Table,
    Id,
    ProjectId,
    Title,
    Priority,
    Completed,
    CreatedAt,
    UpdatedAt,
}

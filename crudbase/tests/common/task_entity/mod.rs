use async_trait::async_trait;
use axum::http::request::Parts;
use chrono::{DateTime, Utc};
use crudbase::model::{stamp_identity, stamp_timestamps};
use crudbase::validation::validators::{validate_length, validate_range, validate_required};
use crudbase::{CRUDResource, FormRequest, MergeIntoActiveModel, ToResource, ValidationErrors};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue, json};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Deserialize, Serialize)]
#[sea_orm(table_name = "tasks")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub project_id: Option<String>,
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

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub project_id: Option<String>,
    pub title: String,
    pub priority: i32,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<Model> for Task {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            project_id: model.project_id,
            title: model.title,
            priority: model.priority,
            completed: model.completed,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct TaskCreate {
    #[serde(default)]
    pub project_id: Option<String>,
    pub title: String,
    #[serde(default = "default_priority")]
    pub priority: i32,
    #[serde(default)]
    pub completed: bool,
}

fn default_priority() -> i32 {
    3
}

impl From<TaskCreate> for ActiveModel {
    fn from(create: TaskCreate) -> Self {
        Self {
            id: ActiveValue::NotSet,
            project_id: ActiveValue::Set(create.project_id),
            title: ActiveValue::Set(create.title),
            priority: ActiveValue::Set(create.priority),
            completed: ActiveValue::Set(create.completed),
            created_at: ActiveValue::NotSet,
            updated_at: ActiveValue::NotSet,
        }
    }
}

// Used by update_or_create: every field of the create payload is applied
impl MergeIntoActiveModel<ActiveModel> for TaskCreate {
    fn merge_into_activemodel(self, mut existing: ActiveModel) -> Result<ActiveModel, DbErr> {
        existing.project_id = ActiveValue::Set(self.project_id);
        existing.title = ActiveValue::Set(self.title);
        existing.priority = ActiveValue::Set(self.priority);
        existing.completed = ActiveValue::Set(self.completed);
        Ok(existing)
    }
}

impl FormRequest for TaskCreate {
    fn authorize(parts: &Parts) -> bool {
        !parts.headers.contains_key("x-read-only")
    }

    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.check(validate_required("title", &self.title));
        errors.check(validate_length("title", &self.title, None, Some(200)));
        errors.check(validate_range("priority", self.priority, Some(1), Some(5)));
        errors.result()
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct TaskUpdate {
    pub title: Option<String>,
    pub priority: Option<i32>,
    pub completed: Option<bool>,
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
    const MAX_PER_PAGE: u64 = 50;

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
        data.insert("project_id".to_string(), json!(self.project_id));
        data.insert("title".to_string(), json!(self.title));
        data.insert("priority".to_string(), json!(self.priority));
        data.insert("completed".to_string(), json!(self.completed));
    }
}

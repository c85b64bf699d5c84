use async_trait::async_trait;
use chrono::{DateTime, Utc};
use crudbase::model::{stamp_identity, stamp_timestamps};
use crudbase::{
    ApiError, CRUDResource, MergeIntoActiveModel, Repository, ToResource, unknown_relation,
};
use sea_orm::{ActiveValue, Order, entity::prelude::*};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue, json};

use super::task_entity::Task;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Deserialize, Serialize)]
#[sea_orm(table_name = "projects")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    #[sea_orm(unique)]
    pub name: String,
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
pub struct Project {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tasks: Option<Vec<Task>>,
}

impl From<Model> for Project {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            created_at: model.created_at,
            updated_at: model.updated_at,
            tasks: None,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct ProjectCreate {
    pub name: String,
}

impl From<ProjectCreate> for ActiveModel {
    fn from(create: ProjectCreate) -> Self {
        Self {
            id: ActiveValue::NotSet,
            name: ActiveValue::Set(create.name),
            created_at: ActiveValue::NotSet,
            updated_at: ActiveValue::NotSet,
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct ProjectUpdate {
    pub name: Option<String>,
}

impl MergeIntoActiveModel<ActiveModel> for ProjectUpdate {
    fn merge_into_activemodel(self, mut existing: ActiveModel) -> Result<ActiveModel, DbErr> {
        if let Some(name) = self.name {
            existing.name = ActiveValue::Set(name);
        }
        Ok(existing)
    }
}

#[async_trait]
impl CRUDResource for Project {
    type EntityType = Entity;
    type ModelType = Model;
    type ColumnType = Column;
    type ActiveModelType = ActiveModel;
    type CreateModel = ProjectCreate;
    type UpdateModel = ProjectUpdate;

    const ID_COLUMN: Column = Column::Id;
    const RESOURCE_NAME_SINGULAR: &'static str = "project";
    const RESOURCE_NAME_PLURAL: &'static str = "projects";

    fn id(&self) -> &str {
        &self.id
    }

    async fn load_relations(
        db: &DatabaseConnection,
        items: &mut [Self],
        relations: &[String],
    ) -> Result<(), ApiError> {
        for relation in relations {
            match relation.as_str() {
                "tasks" => {
                    let ids: Vec<String> = items.iter().map(|project| project.id.clone()).collect();
                    let tasks = Repository::<Task>::new(db.clone())
                        .where_in("project_id", ids)
                        .order_by("title", Order::Asc)
                        .all()
                        .await?;
                    for project in items.iter_mut() {
                        let owned = tasks
                            .iter()
                            .filter(|task| task.project_id.as_deref() == Some(project.id.as_str()))
                            .cloned()
                            .collect();
                        project.tasks = Some(owned);
                    }
                }
                other => return Err(unknown_relation::<Self>(other)),
            }
        }
        Ok(())
    }
}

impl ToResource for Project {
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
        data.insert("name".to_string(), json!(self.name));
        if let Some(tasks) = &self.tasks {
            data.insert("tasks".to_string(), json!(tasks));
        }
    }
}

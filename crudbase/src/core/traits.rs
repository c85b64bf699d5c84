use async_trait::async_trait;
use sea_orm::{
    ActiveModelBehavior, ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait,
    FromQueryResult, IntoActiveModel,
};

use crate::errors::ApiError;
use crate::pagination::DEFAULT_PER_PAGE;

pub trait MergeIntoActiveModel<ActiveModelType> {
    /// Merge this model into an existing active model.
    ///
    /// Fields the model leaves empty must keep the existing value, so an
    /// update only touches what the caller sent.
    ///
    /// # Errors
    ///
    /// Returns a `DbErr` if the merge operation fails due to data conversion issues.
    fn merge_into_activemodel(self, existing: ActiveModelType) -> Result<ActiveModelType, DbErr>;
}

/// Binds an API struct to its Sea-ORM entity.
///
/// The identifier is a string (UUID text) stored in `ID_COLUMN`. Column and
/// relation names used by [`crate::QuerySpec`] are resolved against
/// `ColumnType` and [`CRUDResource::load_relations`].
#[async_trait]
pub trait CRUDResource: Sized + Send + Sync + 'static {
    type EntityType: EntityTrait<Model = Self::ModelType, Column = Self::ColumnType> + Sync;
    type ModelType: FromQueryResult
        + IntoActiveModel<Self::ActiveModelType>
        + Into<Self>
        + Clone
        + Send
        + Sync;
    type ColumnType: ColumnTrait + Copy + Send + Sync;
    type ActiveModelType: ActiveModelTrait<Entity = Self::EntityType>
        + ActiveModelBehavior
        + Send
        + Sync;
    type CreateModel: Into<Self::ActiveModelType> + Send;
    type UpdateModel: MergeIntoActiveModel<Self::ActiveModelType> + Send;

    const ID_COLUMN: Self::ColumnType;
    const RESOURCE_NAME_SINGULAR: &'static str;
    const RESOURCE_NAME_PLURAL: &'static str;
    const DEFAULT_PER_PAGE: u64 = DEFAULT_PER_PAGE;
    /// Upper bound applied to `per_page` values coming from query strings
    const MAX_PER_PAGE: u64 = 100;

    fn id(&self) -> &str;

    /// Eager-load the named relations onto freshly fetched items.
    ///
    /// Resources without relations keep the default, which rejects any name.
    ///
    /// # Errors
    ///
    /// `ApiError::BadRequest` for an unknown relation name, or whatever the
    /// relation queries return.
    async fn load_relations(
        db: &DatabaseConnection,
        items: &mut [Self],
        relations: &[String],
    ) -> Result<(), ApiError> {
        let _ = (db, items);
        match relations.first() {
            None => Ok(()),
            Some(name) => Err(unknown_relation::<Self>(name)),
        }
    }
}

/// The error `load_relations` implementations return for names they don't know
#[must_use]
pub fn unknown_relation<R: CRUDResource>(name: &str) -> ApiError {
    ApiError::bad_request(format!(
        "Unknown relation '{name}' on {}",
        R::RESOURCE_NAME_SINGULAR
    ))
}

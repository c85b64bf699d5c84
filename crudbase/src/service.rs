//! Service layer between handlers and the [`Repository`].
//!
//! Implement [`CrudService`] on your own type to put business rules around the
//! default CRUD calls, or use [`ResourceService`] when plain delegation is
//! enough:
//!
//! ```rust,ignore
//! struct TaskService {
//!     tasks: Repository<Task>,
//! }
//!
//! #[async_trait]
//! impl CrudService for TaskService {
//!     type Resource = Task;
//!
//!     fn repository(&self) -> &Repository<Task> {
//!         &self.tasks
//!     }
//!
//!     async fn delete(&self, id: &str) -> Result<bool, ApiError> {
//!         let task = self.find(id).await?.ok_or_else(|| ApiError::not_found("Task", Some(id.into())))?;
//!         if task.completed {
//!             return Err(ApiError::forbidden("Completed tasks are kept"));
//!         }
//!         self.repository().delete(id).await
//!     }
//! }
//! ```

use async_trait::async_trait;
use sea_orm::DatabaseConnection;

use crate::core::CRUDResource;
use crate::errors::ApiError;
use crate::pagination::{Page, PageRequest};
use crate::repository::Repository;

#[async_trait]
pub trait CrudService: Send + Sync {
    type Resource: CRUDResource;

    fn repository(&self) -> &Repository<Self::Resource>;

    async fn all(&self) -> Result<Vec<Self::Resource>, ApiError> {
        self.repository().all().await
    }

    async fn find(&self, id: &str) -> Result<Option<Self::Resource>, ApiError> {
        self.repository().find(id).await
    }

    async fn create(
        &self,
        data: <Self::Resource as CRUDResource>::CreateModel,
    ) -> Result<Self::Resource, ApiError> {
        self.repository().create(data).await
    }

    async fn update(
        &self,
        id: &str,
        data: <Self::Resource as CRUDResource>::UpdateModel,
    ) -> Result<Self::Resource, ApiError> {
        self.repository().update(id, data).await
    }

    async fn delete(&self, id: &str) -> Result<bool, ApiError> {
        self.repository().delete(id).await
    }

    async fn paginate(&self, per_page: u64) -> Result<Page<Self::Resource>, ApiError> {
        self.repository().paginate(per_page).await
    }

    async fn paginate_with(
        &self,
        request: &PageRequest,
    ) -> Result<Page<Self::Resource>, ApiError> {
        self.repository().paginate_with(request).await
    }

    async fn count(&self) -> Result<u64, ApiError> {
        self.repository().count().await
    }
}

/// A [`CrudService`] that delegates everything to its repository
pub struct ResourceService<R> {
    repository: Repository<R>,
}

impl<R> Clone for ResourceService<R> {
    fn clone(&self) -> Self {
        Self {
            repository: self.repository.clone(),
        }
    }
}

impl<R: CRUDResource> ResourceService<R> {
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self::from_repository(Repository::new(db))
    }

    #[must_use]
    pub fn from_repository(repository: Repository<R>) -> Self {
        Self { repository }
    }
}

impl<R: CRUDResource> CrudService for ResourceService<R> {
    type Resource = R;

    fn repository(&self) -> &Repository<R> {
        &self.repository
    }
}

//! Generic CRUD building blocks for axum + Sea-ORM services.
//!
//! Bind an API struct to its entity with [`CRUDResource`], then use a
//! [`Repository`] (or a [`CrudService`] around it) for queries and writes.
//! Handlers take [`Validated`] request bodies and answer with [`JsonResource`],
//! [`ResourceCollection`], [`ApiResponse`] or [`ApiError`], all of which share
//! the `{success, message, data?, errors?, meta?, links?}` envelope.

pub mod core;
pub mod errors;
pub mod model;
pub mod pagination;
pub mod params;
pub mod query;
pub mod repository;
pub mod request;
pub mod resource;
pub mod response;
pub mod service;
pub mod validation;

pub use crate::core::{CRUDResource, MergeIntoActiveModel, unknown_relation};
pub use errors::ApiError;
pub use pagination::{Page, PageLinks, PageMeta, PageRequest};
pub use params::ListParams;
pub use query::{Filter, QuerySpec, Sort};
pub use repository::{Repository, Scoped};
pub use request::{FormRequest, Validated};
pub use resource::{JsonResource, ResourceCollection, ToResource};
pub use response::ApiResponse;
pub use service::{CrudService, ResourceService};
pub use validation::{ValidationError, ValidationErrors};

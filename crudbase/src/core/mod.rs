// Resource binding between API structs and Sea-ORM entities

pub mod traits;

pub use traits::{CRUDResource, MergeIntoActiveModel, unknown_relation};

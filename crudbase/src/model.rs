//! Identity and timestamp stamping for entity models.
//!
//! Call these from an entity's `ActiveModelBehavior::before_save` so ids and
//! timestamps are always set by the persistence layer, never by callers:
//!
//! ```rust,ignore
//! #[async_trait::async_trait]
//! impl ActiveModelBehavior for ActiveModel {
//!     async fn before_save<C: ConnectionTrait>(mut self, _db: &C, insert: bool) -> Result<Self, DbErr> {
//!         if insert {
//!             crudbase::model::stamp_identity(&mut self.id);
//!         }
//!         crudbase::model::stamp_timestamps(&mut self.created_at, &mut self.updated_at, insert);
//!         Ok(self)
//!     }
//! }
//! ```

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, Value};
use uuid::Uuid;

/// A fresh identifier: UUID v4 text
#[must_use]
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Assign a new identifier unless the caller already chose one.
pub fn stamp_identity(id: &mut ActiveValue<String>) {
    if matches!(id, ActiveValue::NotSet) {
        *id = ActiveValue::Set(new_id());
    }
}

/// Set `created_at` on insert and `updated_at` on every save.
///
/// Works for both required (`DateTime<Utc>`) and nullable
/// (`Option<DateTime<Utc>>`) timestamp columns.
pub fn stamp_timestamps<C, U>(
    created_at: &mut ActiveValue<C>,
    updated_at: &mut ActiveValue<U>,
    insert: bool,
) where
    C: From<DateTime<Utc>> + Into<Value>,
    U: From<DateTime<Utc>> + Into<Value>,
{
    let now = Utc::now();
    if insert {
        *created_at = ActiveValue::Set(C::from(now));
    }
    *updated_at = ActiveValue::Set(U::from(now));
}

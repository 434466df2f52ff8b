//! Status repository.

use std::sync::Arc;

use crate::entities::{Status, status};
use petrel_common::{AppError, AppResult};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};

/// Status repository for database operations.
#[derive(Clone)]
pub struct StatusRepository {
    db: Arc<DatabaseConnection>,
}

impl StatusRepository {
    /// Create a new status repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a status by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<status::Model>> {
        Status::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a status by ID, failing when absent.
    pub async fn get_by_id(&self, id: &str) -> AppResult<status::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("status {id}")))
    }

    /// Find reblogs of the given status.
    ///
    /// Used on status updates to notify accounts that boosted the original.
    pub async fn find_reblogs_of(&self, status_id: &str) -> AppResult<Vec<status::Model>> {
        Status::find()
            .filter(status::Column::ReblogOfId.eq(status_id))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

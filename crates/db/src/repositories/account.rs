//! Account repository.

use std::sync::Arc;

use crate::entities::{Account, account};
use petrel_common::{AppError, AppResult};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};

/// Account repository for database operations.
#[derive(Clone)]
pub struct AccountRepository {
    db: Arc<DatabaseConnection>,
}

impl AccountRepository {
    /// Create a new account repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find an account by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<account::Model>> {
        Account::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get an account by ID, failing when absent.
    pub async fn get_by_id(&self, id: &str) -> AppResult<account::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("account {id}")))
    }

    /// Find local, non-suspended accounts among the given ids.
    ///
    /// Used to narrow mention and reblog notification targets to accounts
    /// this instance can actually notify.
    pub async fn find_local_by_ids(&self, ids: &[String]) -> AppResult<Vec<account::Model>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        Account::find()
            .filter(account::Column::Id.is_in(ids.iter().map(String::as_str)))
            .filter(account::Column::Domain.is_null())
            .filter(account::Column::Suspended.eq(false))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

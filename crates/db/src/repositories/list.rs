//! List repository.

use std::sync::Arc;

use crate::entities::{List, list, list_account};
use petrel_common::{AppError, AppResult};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, JoinType, QueryFilter, QueryOrder, QuerySelect,
    RelationTrait,
};

/// List repository for database operations.
#[derive(Clone)]
pub struct ListRepository {
    db: Arc<DatabaseConnection>,
}

impl ListRepository {
    /// Create a new list repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Page through the lists in which the given account is a member.
    ///
    /// A status by the account is delivered to each such list feed whenever
    /// its followers receive it.
    pub async fn lists_with_member(
        &self,
        member_account_id: &str,
        limit: u64,
        until_id: Option<&str>,
    ) -> AppResult<Vec<list::Model>> {
        let mut query = List::find()
            .join(JoinType::InnerJoin, list::Relation::Members.def())
            .filter(list_account::Column::AccountId.eq(member_account_id))
            .order_by_desc(list::Column::Id);

        if let Some(id) = until_id {
            query = query.filter(list::Column::Id.lt(id));
        }

        query
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

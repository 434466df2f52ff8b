//! Follow repository.

use std::sync::Arc;

use crate::entities::{Follow, follow};
use petrel_common::{AppError, AppResult};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, QuerySelect};

/// Follow repository for database operations.
#[derive(Clone)]
pub struct FollowRepository {
    db: Arc<DatabaseConnection>,
}

impl FollowRepository {
    /// Create a new follow repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Page through local followers eligible for home-feed delivery.
    ///
    /// Only followers on this instance with home delivery enabled qualify.
    /// When `reblogs_only` is set (the status being fanned out is a reblog),
    /// followers that opted out of reblogs are skipped.
    pub async fn followers_for_local_distribution(
        &self,
        target_account_id: &str,
        reblogs_only: bool,
        limit: u64,
        until_id: Option<&str>,
    ) -> AppResult<Vec<follow::Model>> {
        let mut query = Follow::find()
            .filter(follow::Column::TargetAccountId.eq(target_account_id))
            .filter(follow::Column::AccountDomain.is_null())
            .filter(follow::Column::Delivery.eq(true))
            .order_by_desc(follow::Column::Id);

        if reblogs_only {
            query = query.filter(follow::Column::ShowReblogs.eq(true));
        }

        if let Some(id) = until_id {
            query = query.filter(follow::Column::Id.lt(id));
        }

        query
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// The subset of `account_ids` that locally follow an account.
    ///
    /// Backs the follower-gated privacy scope for domain/keyword
    /// subscriptions and the keyword-over-follow overlap exclusion.
    /// Candidate sets arrive page-sized, so the restriction stays in SQL
    /// and the full follower set is never loaded.
    pub async fn local_followers_among(
        &self,
        target_account_id: &str,
        account_ids: &[String],
    ) -> AppResult<Vec<follow::Model>> {
        if account_ids.is_empty() {
            return Ok(Vec::new());
        }

        Follow::find()
            .filter(follow::Column::TargetAccountId.eq(target_account_id))
            .filter(follow::Column::AccountDomain.is_null())
            .filter(follow::Column::AccountId.is_in(account_ids.iter().map(String::as_str)))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Page through the local followers of an account restricted to a
    /// mentioned-account set.
    ///
    /// This is the limited/direct audience: mentioned ∩ followers.
    pub async fn mentioned_followers(
        &self,
        target_account_id: &str,
        mentioned_ids: &[String],
        limit: u64,
        until_id: Option<&str>,
    ) -> AppResult<Vec<follow::Model>> {
        if mentioned_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut query = Follow::find()
            .filter(follow::Column::TargetAccountId.eq(target_account_id))
            .filter(follow::Column::AccountDomain.is_null())
            .filter(follow::Column::Delivery.eq(true))
            .filter(follow::Column::AccountId.is_in(mentioned_ids.iter().map(String::as_str)))
            .order_by_desc(follow::Column::Id);

        if let Some(id) = until_id {
            query = query.filter(follow::Column::Id.lt(id));
        }

        query
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

//! Subscription repositories (account, domain, keyword).

use std::sync::Arc;

use crate::entities::{
    AccountSubscribe, DomainSubscribe, KeywordSubscribe, account_subscribe, domain_subscribe,
    keyword_subscribe,
};
use petrel_common::{AppError, AppResult};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, QuerySelect};

/// Filters shared by all subscription lookups, derived from the status
/// being fanned out.
#[derive(Debug, Clone, Copy)]
pub struct SubscriptionFilter {
    /// The status is a reblog.
    pub is_reblog: bool,
    /// The status carries media attachments.
    pub has_media: bool,
}

/// Subscription repository for database operations.
#[derive(Clone)]
pub struct SubscriptionRepository {
    db: Arc<DatabaseConnection>,
}

impl SubscriptionRepository {
    /// Create a new subscription repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Page through account subscriptions on an author, home-feed variant.
    pub async fn account_subscribers_home(
        &self,
        target_account_id: &str,
        filter: SubscriptionFilter,
        limit: u64,
        until_id: Option<&str>,
    ) -> AppResult<Vec<account_subscribe::Model>> {
        self.account_subscribers(target_account_id, false, filter, limit, until_id)
            .await
    }

    /// Page through account subscriptions on an author, list-feed variant.
    pub async fn account_subscribers_list(
        &self,
        target_account_id: &str,
        filter: SubscriptionFilter,
        limit: u64,
        until_id: Option<&str>,
    ) -> AppResult<Vec<account_subscribe::Model>> {
        self.account_subscribers(target_account_id, true, filter, limit, until_id)
            .await
    }

    async fn account_subscribers(
        &self,
        target_account_id: &str,
        to_list: bool,
        filter: SubscriptionFilter,
        limit: u64,
        until_id: Option<&str>,
    ) -> AppResult<Vec<account_subscribe::Model>> {
        let mut query = AccountSubscribe::find()
            .filter(account_subscribe::Column::TargetAccountId.eq(target_account_id))
            .order_by_desc(account_subscribe::Column::Id);

        query = if to_list {
            query.filter(account_subscribe::Column::ListId.is_not_null())
        } else {
            query.filter(account_subscribe::Column::ListId.is_null())
        };

        if filter.is_reblog {
            query = query.filter(account_subscribe::Column::ShowReblogs.eq(true));
        }
        if !filter.has_media {
            query = query.filter(account_subscribe::Column::MediaOnly.eq(false));
        }
        if let Some(id) = until_id {
            query = query.filter(account_subscribe::Column::Id.lt(id));
        }

        query
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Page through domain subscriptions on an author's domain, home-feed
    /// variant.
    pub async fn domain_subscribers_home(
        &self,
        domain: &str,
        filter: SubscriptionFilter,
        limit: u64,
        until_id: Option<&str>,
    ) -> AppResult<Vec<domain_subscribe::Model>> {
        self.domain_subscribers(domain, false, filter, limit, until_id)
            .await
    }

    /// Page through domain subscriptions on an author's domain, list-feed
    /// variant.
    pub async fn domain_subscribers_list(
        &self,
        domain: &str,
        filter: SubscriptionFilter,
        limit: u64,
        until_id: Option<&str>,
    ) -> AppResult<Vec<domain_subscribe::Model>> {
        self.domain_subscribers(domain, true, filter, limit, until_id)
            .await
    }

    async fn domain_subscribers(
        &self,
        domain: &str,
        to_list: bool,
        filter: SubscriptionFilter,
        limit: u64,
        until_id: Option<&str>,
    ) -> AppResult<Vec<domain_subscribe::Model>> {
        let mut query = DomainSubscribe::find()
            .filter(domain_subscribe::Column::Domain.eq(domain))
            .order_by_desc(domain_subscribe::Column::Id);

        query = if to_list {
            query.filter(domain_subscribe::Column::ListId.is_not_null())
        } else {
            query.filter(domain_subscribe::Column::ListId.is_null())
        };

        if filter.is_reblog {
            query = query.filter(domain_subscribe::Column::ExcludeReblog.eq(false));
        }
        if !filter.has_media {
            query = query.filter(domain_subscribe::Column::MediaOnly.eq(false));
        }
        if let Some(id) = until_id {
            query = query.filter(domain_subscribe::Column::Id.lt(id));
        }

        query
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// All active keyword subscriptions delivering to home feeds, ordered
    /// by owner so first-match-per-owner dedup can scan linearly.
    pub async fn active_keyword_subscribes_home(
        &self,
        has_media: bool,
    ) -> AppResult<Vec<keyword_subscribe::Model>> {
        let mut query = KeywordSubscribe::find()
            .filter(keyword_subscribe::Column::Active.eq(true))
            .filter(keyword_subscribe::Column::ListId.is_null())
            .order_by_asc(keyword_subscribe::Column::AccountId);

        if !has_media {
            query = query.filter(keyword_subscribe::Column::MediaOnly.eq(false));
        }

        query
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// All active keyword subscriptions delivering to list feeds, ordered
    /// by list so first-match-per-list dedup can scan linearly.
    pub async fn active_keyword_subscribes_list(
        &self,
        has_media: bool,
    ) -> AppResult<Vec<keyword_subscribe::Model>> {
        let mut query = KeywordSubscribe::find()
            .filter(keyword_subscribe::Column::Active.eq(true))
            .filter(keyword_subscribe::Column::ListId.is_not_null())
            .order_by_asc(keyword_subscribe::Column::ListId);

        if !has_media {
            query = query.filter(keyword_subscribe::Column::MediaOnly.eq(false));
        }

        query
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

//! Hashtag follow repository.

use std::sync::Arc;

use crate::entities::{FollowTag, TagMute, follow_tag, tag_mute};
use petrel_common::{AppError, AppResult};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};

/// Hashtag follow repository for database operations.
#[derive(Clone)]
pub struct FollowTagRepository {
    db: Arc<DatabaseConnection>,
}

impl FollowTagRepository {
    /// Create a new hashtag follow repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Hashtag follows delivering to home feeds for any of the given tags.
    pub async fn home_follows_for_tags(
        &self,
        tags: &[String],
        has_media: bool,
    ) -> AppResult<Vec<follow_tag::Model>> {
        self.follows_for_tags(tags, false, has_media).await
    }

    /// Hashtag follows delivering to list feeds for any of the given tags.
    pub async fn list_follows_for_tags(
        &self,
        tags: &[String],
        has_media: bool,
    ) -> AppResult<Vec<follow_tag::Model>> {
        self.follows_for_tags(tags, true, has_media).await
    }

    async fn follows_for_tags(
        &self,
        tags: &[String],
        to_list: bool,
        has_media: bool,
    ) -> AppResult<Vec<follow_tag::Model>> {
        if tags.is_empty() {
            return Ok(Vec::new());
        }

        let mut query = FollowTag::find()
            .filter(follow_tag::Column::Tag.is_in(tags.iter().map(String::as_str)));

        query = if to_list {
            query.filter(follow_tag::Column::ListId.is_not_null())
        } else {
            query.filter(follow_tag::Column::ListId.is_null())
        };

        if !has_media {
            query = query.filter(follow_tag::Column::MediaOnly.eq(false));
        }

        query
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Tag mutes covering any of the given tags.
    ///
    /// Fan-out drops a hashtag-follow candidate when its owner muted the
    /// matched tag.
    pub async fn mutes_for_tags(&self, tags: &[String]) -> AppResult<Vec<tag_mute::Model>> {
        if tags.is_empty() {
            return Ok(Vec::new());
        }

        TagMute::find()
            .filter(tag_mute::Column::Tag.is_in(tags.iter().map(String::as_str)))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

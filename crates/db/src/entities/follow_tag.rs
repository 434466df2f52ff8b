//! Hashtag follow entity.

use sea_orm::entity::prelude::*;

/// A subscription to all posts carrying a given tag, independent of
/// authorship.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "follow_tag")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// The following account.
    pub account_id: String,

    /// Lowercase tag name.
    pub tag: String,

    /// Destination list; `None` delivers to the follower's home feed.
    #[sea_orm(nullable)]
    pub list_id: Option<String>,

    /// Deliver only posts with media attached.
    pub media_only: bool,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::account::Entity",
        from = "Column::AccountId",
        to = "super::account::Column::Id",
        on_delete = "Cascade"
    )]
    Follower,
}

impl ActiveModelBehavior for ActiveModel {}

//! Account subscription entity.

use sea_orm::entity::prelude::*;

/// A one-directional, non-follow subscription to another account's posts.
/// Targets the subscriber's home feed, or one of their lists when `list_id`
/// is set.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "account_subscribe")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// The subscribing account.
    pub account_id: String,

    /// The account whose posts are subscribed to.
    pub target_account_id: String,

    /// Destination list; `None` delivers to the subscriber's home feed.
    #[sea_orm(nullable)]
    pub list_id: Option<String>,

    /// Whether reblogs by the target are delivered.
    pub show_reblogs: bool,

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
    Subscriber,

    #[sea_orm(
        belongs_to = "super::account::Entity",
        from = "Column::TargetAccountId",
        to = "super::account::Column::Id",
        on_delete = "Cascade"
    )]
    Target,
}

impl ActiveModelBehavior for ActiveModel {}

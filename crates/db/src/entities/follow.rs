//! Follow entity (follow relationships between accounts).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "follow")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// The account that is following.
    pub account_id: String,

    /// The account being followed.
    pub target_account_id: String,

    /// Follower's domain (denormalized for local-distribution queries).
    #[sea_orm(nullable)]
    pub account_domain: Option<String>,

    /// Whether reblogs by the followed account are delivered.
    pub show_reblogs: bool,

    /// Whether new posts by the followed account trigger a notification.
    pub notify: bool,

    /// Whether posts are delivered to the follower's home feed at all.
    pub delivery: bool,

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

    #[sea_orm(
        belongs_to = "super::account::Entity",
        from = "Column::TargetAccountId",
        to = "super::account::Column::Id",
        on_delete = "Cascade"
    )]
    Target,
}

impl ActiveModelBehavior for ActiveModel {}

//! Keyword subscription entity.

use sea_orm::entity::prelude::*;

/// A subscription matching posts by keyword against their normalized
/// searchable text. Reblogs never match keyword subscriptions.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "keyword_subscribe")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// The subscribing account (rule owner).
    pub account_id: String,

    /// Destination list; `None` delivers to the subscriber's home feed.
    #[sea_orm(nullable)]
    pub list_id: Option<String>,

    /// Display name of the rule.
    pub name: String,

    /// Substring matched case-insensitively against the searchable text.
    pub keyword: String,

    /// When set, a matching exclude keyword vetoes the rule.
    #[sea_orm(nullable)]
    pub exclude_keyword: Option<String>,

    /// Inactive rules are never evaluated.
    pub active: bool,

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
}

impl ActiveModelBehavior for ActiveModel {}

//! Domain subscription entity.

use sea_orm::entity::prelude::*;

/// A subscription to every post authored on a remote domain. Never matches
/// locally-authored statuses.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "domain_subscribe")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// The subscribing account.
    pub account_id: String,

    /// The remote domain whose posts are subscribed to.
    pub domain: String,

    /// Destination list; `None` delivers to the subscriber's home feed.
    #[sea_orm(nullable)]
    pub list_id: Option<String>,

    /// Skip reblogs authored on the domain.
    pub exclude_reblog: bool,

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

//! Account conversation entity.

use sea_orm::entity::prelude::*;

/// Direct-message threading aggregate. One row is created on the author's
/// side when a direct status is first published; updates never add rows.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "account_conversation")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// The account whose conversation view this row belongs to.
    pub account_id: String,

    /// The status that started or advanced the conversation.
    pub status_id: String,

    /// Participant account ids (JSON array of strings).
    pub participant_ids: Json,

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
    Account,
}

impl ActiveModelBehavior for ActiveModel {}

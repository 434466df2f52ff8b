//! Status entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Privacy/audience class gating who may receive a status.
///
/// The set is closed and fixed at status creation; routing matches on it
/// exhaustively.
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    /// Visible to everyone, shown on public timelines.
    #[sea_orm(string_value = "public")]
    Public,
    /// Visible to everyone, but excluded from public timelines.
    #[sea_orm(string_value = "unlisted")]
    Unlisted,
    /// Visible to followers only.
    #[sea_orm(string_value = "private")]
    Private,
    /// Visible to mentioned followers only.
    #[sea_orm(string_value = "limited")]
    Limited,
    /// Visible to mentioned accounts only, threaded as a conversation.
    #[sea_orm(string_value = "direct")]
    Direct,
    /// Visible to the author only.
    #[sea_orm(string_value = "personal")]
    Personal,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "status")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// The authoring account.
    pub account_id: String,

    /// Audience class. `None` until the publish transaction commits it;
    /// fan-out refuses to run on a `None` visibility.
    #[sea_orm(nullable)]
    pub visibility: Option<Visibility>,

    /// The original status when this one is a reblog.
    #[sea_orm(nullable)]
    pub reblog_of_id: Option<String>,

    /// Author of the status this one replies to.
    #[sea_orm(nullable)]
    pub in_reply_to_account_id: Option<String>,

    /// Plain, markup-stripped text produced by the external normalizer.
    pub searchable_text: String,

    /// Lowercase tag names (JSON array of strings).
    pub tags: Json,

    /// Mentioned account ids (JSON array of strings).
    pub mentions: Json,

    /// Whether the status carries media attachments.
    pub has_media: bool,

    pub created_at: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub updated_at: Option<DateTimeWithTimeZone>,
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

impl Related<super::account::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Account.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Whether this status is a reblog of another.
    #[must_use]
    pub const fn is_reblog(&self) -> bool {
        self.reblog_of_id.is_some()
    }

    /// Whether this status replies to another account's status.
    #[must_use]
    pub const fn is_reply(&self) -> bool {
        self.in_reply_to_account_id.is_some()
    }

    /// Whether this status replies to the author's own thread.
    #[must_use]
    pub fn is_self_reply(&self) -> bool {
        self.in_reply_to_account_id.as_deref() == Some(self.account_id.as_str())
    }

    /// Lowercase tag names carried by this status.
    #[must_use]
    pub fn tag_names(&self) -> Vec<String> {
        serde_json::from_value(self.tags.clone()).unwrap_or_default()
    }

    /// Account ids mentioned by this status.
    #[must_use]
    pub fn mentioned_account_ids(&self) -> Vec<String> {
        serde_json::from_value(self.mentions.clone()).unwrap_or_default()
    }
}

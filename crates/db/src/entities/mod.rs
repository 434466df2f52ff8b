//! Database entities.

pub mod account;
pub mod account_conversation;
pub mod account_subscribe;
pub mod domain_subscribe;
pub mod follow;
pub mod follow_tag;
pub mod keyword_subscribe;
pub mod list;
pub mod list_account;
pub mod status;
pub mod tag_mute;

pub use status::Visibility;

/// Entity alias.
pub type Account = account::Entity;
/// Entity alias.
pub type AccountConversation = account_conversation::Entity;
/// Entity alias.
pub type AccountSubscribe = account_subscribe::Entity;
/// Entity alias.
pub type DomainSubscribe = domain_subscribe::Entity;
/// Entity alias.
pub type Follow = follow::Entity;
/// Entity alias.
pub type FollowTag = follow_tag::Entity;
/// Entity alias.
pub type KeywordSubscribe = keyword_subscribe::Entity;
/// Entity alias.
pub type List = list::Entity;
/// Entity alias.
pub type ListAccount = list_account::Entity;
/// Entity alias.
pub type Status = status::Entity;
/// Entity alias.
pub type TagMute = tag_mute::Entity;

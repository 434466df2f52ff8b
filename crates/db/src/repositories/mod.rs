//! Database repositories.

mod account;
mod conversation;
mod follow;
mod follow_tag;
mod list;
mod status;
mod subscription;

pub use account::AccountRepository;
pub use conversation::ConversationRepository;
pub use follow::FollowRepository;
pub use follow_tag::FollowTagRepository;
pub use list::ListRepository;
pub use status::StatusRepository;
pub use subscription::{SubscriptionFilter, SubscriptionRepository};

//! Fan-out engine services.

pub mod broadcast;
pub mod conversation;
pub mod enqueue;
pub mod fan_out;
pub mod feed;
pub mod keyword;
pub mod notification;
pub mod recipients;

pub use broadcast::{Broadcaster, NoOpStreamPublisher, StreamPublisher, StreamPublisherHandle};
pub use conversation::ConversationService;
pub use enqueue::{BulkEnqueuer, BulkJobQueue, BulkJobQueueHandle, FeedInsertJob, FEED_INSERT_JOB};
pub use fan_out::{FanOutOptions, FanOutService};
pub use feed::{FeedKind, FeedStore, FeedStoreHandle, NoOpFeedStore};
pub use keyword::KeywordMatcher;
pub use notification::{
    NoOpNotifier, NotificationDispatcher, NotificationKind, Notifier, NotifierHandle,
};
pub use recipients::{AudienceGuard, RecipientResolver};

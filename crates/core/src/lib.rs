//! Status fan-out and timeline-distribution engine for petrel.
//!
//! Given one published or edited status, the [`FanOutService`] resolves
//! every feed, subscriber and live stream that should carry it and hands
//! the deliveries to the injected ports: a [`FeedStore`] for synchronous
//! self-delivery, a [`BulkJobQueue`] for the durable batched insertions,
//! a [`StreamPublisher`] for best-effort broadcasts and a [`Notifier`]
//! for mention and edit notifications.

pub mod services;

pub use services::{
    AudienceGuard, Broadcaster, BulkEnqueuer, BulkJobQueue, BulkJobQueueHandle,
    ConversationService, FanOutOptions, FanOutService, FeedInsertJob, FeedKind, FeedStore,
    FeedStoreHandle,
    KeywordMatcher, NoOpFeedStore, NoOpNotifier, NoOpStreamPublisher, NotificationDispatcher,
    NotificationKind, Notifier, NotifierHandle, RecipientResolver, StreamPublisher,
    StreamPublisherHandle,
};

//! Fan-out orchestrator.
//!
//! Routes one published (or edited) status to every feed, subscriber and
//! live stream that should carry it. The only fatal condition is a status
//! observed before its visibility was committed; every delivery channel
//! after that check fails independently.

use petrel_common::{AppError, AppResult};
use petrel_db::entities::{account, status, status::Visibility};
use petrel_db::repositories::{AccountRepository, StatusRepository};

use crate::services::broadcast::Broadcaster;
use crate::services::conversation::ConversationService;
use crate::services::feed::{FeedKind, FeedStoreHandle};
use crate::services::notification::{NotificationDispatcher, NotificationKind};
use crate::services::recipients::{AudienceGuard, RecipientResolver};

/// Per-call fan-out options.
#[derive(Debug, Clone, Default)]
pub struct FanOutOptions {
    /// The status is an edit of an already-distributed revision.
    pub update: bool,
    /// Accounts excluded from notifications for this call.
    pub silenced_account_ids: Vec<String>,
}

/// Orchestrates the distribution of a single status.
#[derive(Clone)]
pub struct FanOutService {
    accounts: AccountRepository,
    statuses: StatusRepository,
    recipients: RecipientResolver,
    feed_store: FeedStoreHandle,
    broadcaster: Broadcaster,
    notifications: NotificationDispatcher,
    conversations: ConversationService,
}

impl FanOutService {
    /// Create a new fan-out service.
    #[must_use]
    pub fn new(
        accounts: AccountRepository,
        statuses: StatusRepository,
        recipients: RecipientResolver,
        feed_store: FeedStoreHandle,
        broadcaster: Broadcaster,
        notifications: NotificationDispatcher,
        conversations: ConversationService,
    ) -> Self {
        Self {
            accounts,
            statuses,
            recipients,
            feed_store,
            broadcaster,
            notifications,
            conversations,
        }
    }

    /// Fan a status out to feeds, subscribers and live streams.
    ///
    /// Fails with [`AppError::RaceCondition`] before any side effect when
    /// the status's visibility has not been committed yet; callers retry
    /// such jobs. Anything else that goes wrong inside one delivery
    /// channel is logged and skipped.
    pub async fn fan_out(&self, status: &status::Model, options: &FanOutOptions) -> AppResult<()> {
        let Some(visibility) = status.visibility else {
            return Err(AppError::RaceCondition(format!(
                "status {} observed before visibility was set",
                status.id
            )));
        };

        let author = self.accounts.get_by_id(&status.account_id).await?;

        tracing::debug!(
            status_id = %status.id,
            account_id = %author.id,
            visibility = ?visibility,
            update = options.update,
            "Fanning out status"
        );

        self.deliver_to_self(status, &author, options.update).await;
        self.notify_mentioned(status, options).await;
        if options.update {
            self.notify_rebloggers(status, options).await;
        }

        match visibility {
            Visibility::Public | Visibility::Unlisted | Visibility::Private => {
                if let Err(e) = self.recipients.deliver_to_followers(status, options.update).await
                {
                    tracing::warn!(status_id = %status.id, error = %e, "Skipped follower fan-out");
                }
                if let Err(e) = self.recipients.deliver_to_lists(status, options.update).await {
                    tracing::warn!(status_id = %status.id, error = %e, "Skipped list fan-out");
                }

                self.deliver_to_subscriptions(status, &author, visibility, options.update)
                    .await;

                if !status.is_reblog() {
                    if let Err(e) = self
                        .recipients
                        .deliver_to_hashtag_followers(status, options.update)
                        .await
                    {
                        tracing::warn!(status_id = %status.id, error = %e, "Skipped hashtag fan-out");
                    }
                }
            }
            Visibility::Limited => {
                if let Err(e) = self
                    .recipients
                    .deliver_to_mentioned_followers(status, options.update)
                    .await
                {
                    tracing::warn!(status_id = %status.id, error = %e, "Skipped limited fan-out");
                }
            }
            Visibility::Direct | Visibility::Personal => {
                if let Err(e) = self
                    .recipients
                    .deliver_to_mentioned_followers(status, options.update)
                    .await
                {
                    tracing::warn!(status_id = %status.id, error = %e, "Skipped direct fan-out");
                }

                if visibility == Visibility::Direct && !options.update {
                    if let Err(e) = self.conversations.add_status(status).await {
                        tracing::warn!(status_id = %status.id, error = %e, "Skipped conversation entry");
                    }
                }
            }
        }

        if Self::broadcastable(status, &author, visibility) {
            if let Err(e) = self
                .broadcaster
                .broadcast_status(status, &author, options.update)
                .await
            {
                tracing::warn!(status_id = %status.id, error = %e, "Skipped live broadcast");
            }
        }

        Ok(())
    }

    /// Synchronous insert into the local author's own home feed.
    async fn deliver_to_self(&self, status: &status::Model, author: &account::Model, update: bool) {
        if !author.is_local() {
            return;
        }

        if let Err(e) = self
            .feed_store
            .push(&author.id, FeedKind::Home, &status.id, update)
            .await
        {
            tracing::warn!(status_id = %status.id, error = %e, "Skipped self delivery");
        }
    }

    async fn notify_mentioned(&self, status: &status::Model, options: &FanOutOptions) {
        let mentioned = status.mentioned_account_ids();
        if let Err(e) = self
            .notifications
            .dispatch(
                &mentioned,
                &options.silenced_account_ids,
                NotificationKind::Mention,
                &status.id,
            )
            .await
        {
            tracing::warn!(status_id = %status.id, error = %e, "Skipped mention notifications");
        }
    }

    /// On edit, tell local accounts that reblogged the status.
    async fn notify_rebloggers(&self, status: &status::Model, options: &FanOutOptions) {
        let rebloggers = match self.statuses.find_reblogs_of(&status.id).await {
            Ok(reblogs) => reblogs.into_iter().map(|s| s.account_id).collect::<Vec<_>>(),
            Err(e) => {
                tracing::warn!(status_id = %status.id, error = %e, "Skipped reblogger notifications");
                return;
            }
        };

        if let Err(e) = self
            .notifications
            .dispatch(
                &rebloggers,
                &options.silenced_account_ids,
                NotificationKind::Update,
                &status.id,
            )
            .await
        {
            tracing::warn!(status_id = %status.id, error = %e, "Skipped reblogger notifications");
        }
    }

    /// Account, domain and keyword subscription fan-out.
    ///
    /// Follower-gated visibilities and silenced authors restrict domain
    /// and keyword candidates to the author, the mentioned accounts and
    /// the author's local followers.
    async fn deliver_to_subscriptions(
        &self,
        status: &status::Model,
        author: &account::Model,
        visibility: Visibility,
        update: bool,
    ) {
        if let Err(e) = self.recipients.deliver_to_subscribers(status, update).await {
            tracing::warn!(status_id = %status.id, error = %e, "Skipped account-subscription fan-out");
        }

        let restricted = matches!(visibility, Visibility::Unlisted | Visibility::Private)
            || author.silenced;
        let guard = AudienceGuard::new(status, restricted);

        if let Err(e) = self
            .recipients
            .deliver_to_domain_subscribers(status, author, update, &guard)
            .await
        {
            tracing::warn!(status_id = %status.id, error = %e, "Skipped domain-subscription fan-out");
        }

        if let Err(e) = self
            .recipients
            .deliver_to_keyword_subscribers(status, update, &guard)
            .await
        {
            tracing::warn!(status_id = %status.id, error = %e, "Skipped keyword-subscription fan-out");
        }
    }

    /// Only clean public posts reach the live streams: no silenced author,
    /// no reblog, and replies only when the author replies to themself.
    fn broadcastable(
        status: &status::Model,
        author: &account::Model,
        visibility: Visibility,
    ) -> bool {
        visibility == Visibility::Public
            && !author.silenced
            && !status.is_reblog()
            && (!status.is_reply() || status.is_self_reply())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::services::broadcast::tests::RecordingPublisher;
    use crate::services::broadcast::StreamPublisher;
    use crate::services::enqueue::tests::RecordingQueue;
    use crate::services::feed::FeedStore;
    use crate::services::notification::tests::RecordingNotifier;
    use crate::services::notification::Notifier;
    use async_trait::async_trait;
    use chrono::Utc;
    use petrel_common::IdGenerator;
    use petrel_db::entities::{
        account_conversation, account_subscribe, follow, keyword_subscribe, list,
    };
    use petrel_db::repositories::{
        ConversationRepository, FollowRepository, FollowTagRepository, ListRepository,
        SubscriptionRepository,
    };
    use petrel_db::test_utils::{keyword_rule, local_account, local_follow, public_status};
    use sea_orm::ActiveValue::Set;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    /// Feed store fake that records every push.
    #[derive(Default)]
    struct RecordingFeedStore {
        pushes: Mutex<Vec<(String, FeedKind, String, bool)>>,
    }

    #[async_trait]
    impl FeedStore for RecordingFeedStore {
        async fn push(
            &self,
            target_id: &str,
            kind: FeedKind,
            status_id: &str,
            update: bool,
        ) -> AppResult<()> {
            self.pushes.lock().unwrap().push((
                target_id.to_string(),
                kind,
                status_id.to_string(),
                update,
            ));
            Ok(())
        }
    }

    struct Mocks {
        accounts: MockDatabase,
        statuses: MockDatabase,
        follows: MockDatabase,
        lists: MockDatabase,
        subscriptions: MockDatabase,
        follow_tags: MockDatabase,
        conversations: MockDatabase,
    }

    struct Harness {
        service: FanOutService,
        queue: Arc<RecordingQueue>,
        feed: Arc<RecordingFeedStore>,
        publisher: Arc<RecordingPublisher>,
        notifier: Arc<RecordingNotifier>,
        conversation_repo: ConversationRepository,
    }

    impl Mocks {
        fn new() -> Self {
            Self {
                accounts: MockDatabase::new(DatabaseBackend::Postgres),
                statuses: MockDatabase::new(DatabaseBackend::Postgres),
                follows: MockDatabase::new(DatabaseBackend::Postgres),
                lists: MockDatabase::new(DatabaseBackend::Postgres),
                subscriptions: MockDatabase::new(DatabaseBackend::Postgres),
                follow_tags: MockDatabase::new(DatabaseBackend::Postgres),
                conversations: MockDatabase::new(DatabaseBackend::Postgres),
            }
        }

        fn build(self) -> Harness {
            let queue = Arc::new(RecordingQueue::default());
            let feed = Arc::new(RecordingFeedStore::default());
            let publisher = Arc::new(RecordingPublisher::default());
            let notifier = Arc::new(RecordingNotifier::default());

            let accounts = AccountRepository::new(Arc::new(self.accounts.into_connection()));
            let conversation_repo =
                ConversationRepository::new(Arc::new(self.conversations.into_connection()));

            let recipients = RecipientResolver::new(
                FollowRepository::new(Arc::new(self.follows.into_connection())),
                ListRepository::new(Arc::new(self.lists.into_connection())),
                SubscriptionRepository::new(Arc::new(self.subscriptions.into_connection())),
                FollowTagRepository::new(Arc::new(self.follow_tags.into_connection())),
                queue.clone() as Arc<dyn crate::services::enqueue::BulkJobQueue>,
                100,
            );

            let service = FanOutService::new(
                accounts.clone(),
                StatusRepository::new(Arc::new(self.statuses.into_connection())),
                recipients,
                feed.clone() as Arc<dyn FeedStore>,
                Broadcaster::new(publisher.clone() as Arc<dyn StreamPublisher>),
                NotificationDispatcher::new(accounts, notifier.clone() as Arc<dyn Notifier>),
                ConversationService::new(conversation_repo.clone(), IdGenerator::new()),
            );

            Harness {
                service,
                queue,
                feed,
                publisher,
                notifier,
                conversation_repo,
            }
        }
    }

    fn empty_follow_pages() -> Vec<Vec<follow::Model>> {
        vec![Vec::new()]
    }

    fn conversation_row() -> account_conversation::Model {
        account_conversation::Model {
            id: "c1".to_string(),
            account_id: "author".to_string(),
            status_id: "s1".to_string(),
            participant_ids: json!([]),
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_unset_visibility_fails_without_side_effects() {
        let harness = Mocks::new().build();
        let mut status = public_status("s1", "author");
        status.visibility = None;

        let err = harness
            .service
            .fan_out(&status, &FanOutOptions::default())
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::RaceCondition(_)));
        assert!(harness.queue.jobs().is_empty());
        assert!(harness.feed.pushes.lock().unwrap().is_empty());
        assert!(harness.publisher.messages.lock().unwrap().is_empty());
        assert!(harness.notifier.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_public_status_reaches_self_followers_and_streams() {
        let mut mocks = Mocks::new();
        mocks.accounts = mocks
            .accounts
            .append_query_results([vec![local_account("author")]]);
        mocks.follows = mocks
            .follows
            .append_query_results([vec![local_follow("f1", "a1", "author")]]);
        mocks.lists = mocks.lists.append_query_results([Vec::<list::Model>::new()]);
        mocks.subscriptions = mocks.subscriptions.append_query_results([
            Vec::<account_subscribe::Model>::new(),
            Vec::<account_subscribe::Model>::new(),
        ]);
        let harness = mocks.build();

        let status = public_status("s1", "author");
        harness
            .service
            .fan_out(&status, &FanOutOptions::default())
            .await
            .unwrap();

        let pushes = harness.feed.pushes.lock().unwrap();
        assert_eq!(pushes.len(), 1);
        assert_eq!(pushes[0], ("author".to_string(), FeedKind::Home, "s1".to_string(), false));

        let jobs = harness.queue.jobs();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].target_id, "a1");
        assert_eq!(jobs[0].feed_kind, FeedKind::Home);

        assert!(harness
            .publisher
            .channels()
            .contains(&"timeline:public".to_string()));
    }

    #[tokio::test]
    async fn test_direct_status_creates_one_conversation_entry() {
        let mut mocks = Mocks::new();
        mocks.accounts = mocks.accounts.append_query_results([
            vec![local_account("author")],
            vec![local_account("m1")],
        ]);
        mocks.follows = mocks
            .follows
            .append_query_results([Vec::<follow::Model>::new()]);
        mocks.conversations = mocks
            .conversations
            .append_query_results([vec![conversation_row()]])
            .append_exec_results([MockExecResult {
                last_insert_id: 1,
                rows_affected: 1,
            }]);
        let harness = mocks.build();

        let mut status = public_status("s1", "author");
        status.visibility = Some(Visibility::Direct);
        status.mentions = json!(["m1"]);

        harness
            .service
            .fan_out(&status, &FanOutOptions::default())
            .await
            .unwrap();

        // The single mocked insert was consumed by the fan-out: a second
        // insert against the same mock has nothing left to return.
        let leftover = harness
            .conversation_repo
            .create(account_conversation::ActiveModel {
                id: Set("c2".to_string()),
                account_id: Set("author".to_string()),
                status_id: Set("s1".to_string()),
                participant_ids: Set(json!([])),
                created_at: Set(Utc::now().into()),
            })
            .await;
        assert!(leftover.is_err());

        let calls = harness.notifier.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "m1");
        assert_eq!(calls[0].1, NotificationKind::Mention);
    }

    #[tokio::test]
    async fn test_direct_update_adds_no_conversation_entry() {
        let mut mocks = Mocks::new();
        mocks.accounts = mocks.accounts.append_query_results([
            vec![local_account("author")],
            vec![local_account("m1")],
        ]);
        mocks.statuses = mocks
            .statuses
            .append_query_results([Vec::<petrel_db::entities::status::Model>::new()]);
        mocks.follows = mocks
            .follows
            .append_query_results([Vec::<follow::Model>::new()]);
        mocks.conversations = mocks
            .conversations
            .append_query_results([vec![conversation_row()]])
            .append_exec_results([MockExecResult {
                last_insert_id: 1,
                rows_affected: 1,
            }]);
        let harness = mocks.build();

        let mut status = public_status("s1", "author");
        status.visibility = Some(Visibility::Direct);
        status.mentions = json!(["m1"]);

        let options = FanOutOptions {
            update: true,
            silenced_account_ids: Vec::new(),
        };
        harness.service.fan_out(&status, &options).await.unwrap();

        // The mocked insert is still available: the update path never
        // touched the conversation store.
        let leftover = harness
            .conversation_repo
            .create(account_conversation::ActiveModel {
                id: Set("c2".to_string()),
                account_id: Set("author".to_string()),
                status_id: Set("s1".to_string()),
                participant_ids: Set(json!([])),
                created_at: Set(Utc::now().into()),
            })
            .await;
        assert!(leftover.is_ok());
    }

    #[tokio::test]
    async fn test_limited_status_reaches_only_mentioned_followers() {
        let mut mocks = Mocks::new();
        mocks.accounts = mocks.accounts.append_query_results([
            vec![local_account("author")],
            vec![local_account("m1"), local_account("m2")],
        ]);
        // m1 follows the author, m2 does not.
        mocks.follows = mocks
            .follows
            .append_query_results([vec![local_follow("f1", "m1", "author")]]);
        let harness = mocks.build();

        let mut status = public_status("s1", "author");
        status.visibility = Some(Visibility::Limited);
        status.mentions = json!(["m1", "m2"]);

        harness
            .service
            .fan_out(&status, &FanOutOptions::default())
            .await
            .unwrap();

        let jobs = harness.queue.jobs();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].target_id, "m1");
        assert_eq!(jobs[0].feed_kind, FeedKind::Home);
        assert!(harness.publisher.messages.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_reblog_skips_hashtags_and_streams() {
        let mut mocks = Mocks::new();
        mocks.accounts = mocks
            .accounts
            .append_query_results([vec![local_account("author")]]);
        mocks.follows = mocks.follows.append_query_results(empty_follow_pages());
        mocks.lists = mocks.lists.append_query_results([Vec::<list::Model>::new()]);
        mocks.subscriptions = mocks.subscriptions.append_query_results([
            Vec::<account_subscribe::Model>::new(),
            Vec::<account_subscribe::Model>::new(),
        ]);
        // follow_tags mock is empty: a hashtag query would fail the test.
        let harness = mocks.build();

        let mut status = public_status("s1", "author");
        status.reblog_of_id = Some("orig".to_string());
        status.tags = json!(["ruby"]);

        harness
            .service
            .fan_out(&status, &FanOutOptions::default())
            .await
            .unwrap();

        assert!(harness.queue.jobs().is_empty());
        assert!(harness.publisher.messages.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_silenced_author_is_not_broadcast() {
        let mut mocks = Mocks::new();
        let mut author = local_account("author");
        author.silenced = true;
        mocks.accounts = mocks.accounts.append_query_results([vec![author]]);
        mocks.follows = mocks.follows.append_query_results(empty_follow_pages());
        mocks.lists = mocks.lists.append_query_results([Vec::<list::Model>::new()]);
        mocks.subscriptions = mocks.subscriptions.append_query_results([
            Vec::<account_subscribe::Model>::new(),
            Vec::<account_subscribe::Model>::new(),
        ]);
        let harness = mocks.build();

        let status = public_status("s1", "author");
        harness
            .service
            .fan_out(&status, &FanOutOptions::default())
            .await
            .unwrap();

        assert!(harness.publisher.messages.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_notifies_local_rebloggers() {
        let mut mocks = Mocks::new();
        mocks.accounts = mocks.accounts.append_query_results([
            vec![local_account("author")],
            vec![local_account("rb1")],
        ]);
        let mut reblog = public_status("s2", "rb1");
        reblog.reblog_of_id = Some("s1".to_string());
        mocks.statuses = mocks.statuses.append_query_results([vec![reblog]]);
        mocks.follows = mocks.follows.append_query_results(empty_follow_pages());
        mocks.lists = mocks.lists.append_query_results([Vec::<list::Model>::new()]);
        mocks.subscriptions = mocks.subscriptions.append_query_results([
            Vec::<account_subscribe::Model>::new(),
            Vec::<account_subscribe::Model>::new(),
        ]);
        let harness = mocks.build();

        let status = public_status("s1", "author");
        let options = FanOutOptions {
            update: true,
            silenced_account_ids: Vec::new(),
        };
        harness.service.fan_out(&status, &options).await.unwrap();

        let calls = harness.notifier.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "rb1");
        assert_eq!(calls[0].1, NotificationKind::Update);

        // Edits reach the streams under the dedicated event name.
        let messages = harness.publisher.messages.lock().unwrap();
        assert!(messages[0].1.contains("status.update"));
    }

    #[tokio::test]
    async fn test_end_to_end_keyword_overlap_dedup() {
        // Public "#ruby" post; F1 and F2 follow the author; F2 also has a
        // keyword rule on "ruby". Each follower gets exactly one home
        // insertion and the streams carry public and hashtag channels.
        let mut mocks = Mocks::new();
        mocks.accounts = mocks
            .accounts
            .append_query_results([vec![local_account("author")]]);
        mocks.follows = mocks.follows.append_query_results([
            // follower home-feed page
            vec![
                local_follow("f2", "F2", "author"),
                local_follow("f1", "F1", "author"),
            ],
            // keyword overlap check: F2 already follows the author
            vec![local_follow("f2", "F2", "author")],
        ]);
        mocks.lists = mocks.lists.append_query_results([Vec::<list::Model>::new()]);
        mocks.subscriptions = mocks.subscriptions.append_query_results([
            Vec::<account_subscribe::Model>::new(),
            Vec::<account_subscribe::Model>::new(),
        ]);
        mocks.subscriptions = mocks.subscriptions.append_query_results([
            vec![keyword_rule("k1", "F2", "ruby")],
            Vec::<keyword_subscribe::Model>::new(),
        ]);
        mocks.follow_tags = mocks.follow_tags.append_query_results([
            Vec::<petrel_db::entities::tag_mute::Model>::new(),
        ]);
        mocks.follow_tags = mocks.follow_tags.append_query_results([
            Vec::<petrel_db::entities::follow_tag::Model>::new(),
            Vec::<petrel_db::entities::follow_tag::Model>::new(),
        ]);
        let harness = mocks.build();

        let mut status = public_status("s1", "author");
        status.searchable_text = "shipping ruby today".to_string();
        status.tags = json!(["ruby"]);

        harness
            .service
            .fan_out(&status, &FanOutOptions::default())
            .await
            .unwrap();

        let jobs = harness.queue.jobs();
        let mut pairs: Vec<(String, FeedKind)> = jobs
            .iter()
            .map(|j| (j.target_id.clone(), j.feed_kind))
            .collect();
        pairs.sort_by(|a, b| a.0.cmp(&b.0));
        pairs.dedup();
        assert_eq!(
            pairs,
            vec![
                ("F1".to_string(), FeedKind::Home),
                ("F2".to_string(), FeedKind::Home),
            ]
        );
        assert_eq!(jobs.len(), 2);

        let channels = harness.publisher.channels();
        assert!(channels.contains(&"timeline:public".to_string()));
        assert!(channels.contains(&"timeline:hashtag:ruby".to_string()));
    }
}

//! Recipient resolution.
//!
//! Materializes the recipient sets of a status page-by-page and hands each
//! page straight to the bulk enqueuer, so a large audience never sits in
//! memory as one collection. Every resolution path is independent; callers
//! isolate failures between paths.

use std::collections::HashSet;

use petrel_common::AppResult;
use petrel_db::entities::{account, status};
use petrel_db::repositories::{
    FollowRepository, FollowTagRepository, ListRepository, SubscriptionRepository,
    SubscriptionFilter,
};

use crate::services::enqueue::{BulkEnqueuer, BulkJobQueueHandle, FeedInsertJob};
use crate::services::feed::FeedKind;
use crate::services::keyword::KeywordMatcher;

/// Audience restriction for domain and keyword subscription candidates.
///
/// When restricted (follower-gated visibility or silenced author), only
/// the author, the mentioned accounts and the author's local followers
/// may receive the status through those paths. Follower membership is
/// checked in SQL against each candidate page; the full follower set is
/// never materialized.
#[derive(Debug, Clone)]
pub struct AudienceGuard {
    author_id: String,
    mentioned: HashSet<String>,
    restricted: bool,
}

impl AudienceGuard {
    /// Build the guard for a status. An unrestricted guard passes every
    /// candidate through.
    #[must_use]
    pub fn new(status: &status::Model, restricted: bool) -> Self {
        Self {
            author_id: status.account_id.clone(),
            mentioned: status.mentioned_account_ids().into_iter().collect(),
            restricted,
        }
    }

    fn passes_without_follow(&self, account_id: &str) -> bool {
        account_id == self.author_id || self.mentioned.contains(account_id)
    }
}

/// Resolves follower, list, subscription and hashtag recipients.
#[derive(Clone)]
pub struct RecipientResolver {
    follows: FollowRepository,
    lists: ListRepository,
    subscriptions: SubscriptionRepository,
    follow_tags: FollowTagRepository,
    enqueuer: BulkEnqueuer,
    batch_size: u64,
}

impl RecipientResolver {
    /// Create a new resolver over the relationship repositories.
    #[must_use]
    pub fn new(
        follows: FollowRepository,
        lists: ListRepository,
        subscriptions: SubscriptionRepository,
        follow_tags: FollowTagRepository,
        queue: BulkJobQueueHandle,
        batch_size: u64,
    ) -> Self {
        Self {
            follows,
            lists,
            subscriptions,
            follow_tags,
            enqueuer: BulkEnqueuer::new(queue),
            batch_size,
        }
    }

    fn job(status: &status::Model, target_id: &str, kind: FeedKind, update: bool) -> FeedInsertJob {
        FeedInsertJob {
            status_id: status.id.clone(),
            target_id: target_id.to_string(),
            feed_kind: kind,
            update,
        }
    }

    /// Deliver to the home feeds of the author's eligible local followers.
    pub async fn deliver_to_followers(
        &self,
        status: &status::Model,
        update: bool,
    ) -> AppResult<()> {
        let mut until_id: Option<String> = None;

        loop {
            let page = self
                .follows
                .followers_for_local_distribution(
                    &status.account_id,
                    status.is_reblog(),
                    self.batch_size,
                    until_id.as_deref(),
                )
                .await?;
            let short_page = (page.len() as u64) < self.batch_size;

            self.enqueuer
                .push_bulk(&page, |f| {
                    Self::job(status, &f.account_id, FeedKind::Home, update)
                })
                .await?;

            match page.last() {
                Some(last) if !short_page => until_id = Some(last.id.clone()),
                _ => break,
            }
        }

        Ok(())
    }

    /// Deliver to every list the author is a member of.
    pub async fn deliver_to_lists(&self, status: &status::Model, update: bool) -> AppResult<()> {
        let mut until_id: Option<String> = None;

        loop {
            let page = self
                .lists
                .lists_with_member(&status.account_id, self.batch_size, until_id.as_deref())
                .await?;
            let short_page = (page.len() as u64) < self.batch_size;

            self.enqueuer
                .push_bulk(&page, |l| Self::job(status, &l.id, FeedKind::List, update))
                .await?;

            match page.last() {
                Some(last) if !short_page => until_id = Some(last.id.clone()),
                _ => break,
            }
        }

        Ok(())
    }

    /// Deliver to the home feeds of followers that are also mentioned.
    ///
    /// This is the whole audience for limited, direct and personal
    /// statuses.
    pub async fn deliver_to_mentioned_followers(
        &self,
        status: &status::Model,
        update: bool,
    ) -> AppResult<()> {
        let mentioned = status.mentioned_account_ids();
        if mentioned.is_empty() {
            return Ok(());
        }

        let mut until_id: Option<String> = None;

        loop {
            let page = self
                .follows
                .mentioned_followers(
                    &status.account_id,
                    &mentioned,
                    self.batch_size,
                    until_id.as_deref(),
                )
                .await?;
            let short_page = (page.len() as u64) < self.batch_size;

            self.enqueuer
                .push_bulk(&page, |f| {
                    Self::job(status, &f.account_id, FeedKind::Home, update)
                })
                .await?;

            match page.last() {
                Some(last) if !short_page => until_id = Some(last.id.clone()),
                _ => break,
            }
        }

        Ok(())
    }

    /// Deliver to accounts subscribed to the author, home and list feeds.
    pub async fn deliver_to_subscribers(
        &self,
        status: &status::Model,
        update: bool,
    ) -> AppResult<()> {
        let filter = Self::subscription_filter(status);

        let mut until_id: Option<String> = None;
        loop {
            let page = self
                .subscriptions
                .account_subscribers_home(
                    &status.account_id,
                    filter,
                    self.batch_size,
                    until_id.as_deref(),
                )
                .await?;
            let short_page = (page.len() as u64) < self.batch_size;

            self.enqueuer
                .push_bulk(&page, |s| {
                    Self::job(status, &s.account_id, FeedKind::Home, update)
                })
                .await?;

            match page.last() {
                Some(last) if !short_page => until_id = Some(last.id.clone()),
                _ => break,
            }
        }

        let mut until_id: Option<String> = None;
        loop {
            let page = self
                .subscriptions
                .account_subscribers_list(
                    &status.account_id,
                    filter,
                    self.batch_size,
                    until_id.as_deref(),
                )
                .await?;
            let short_page = (page.len() as u64) < self.batch_size;

            let list_ids: Vec<String> = page.iter().filter_map(|s| s.list_id.clone()).collect();
            self.enqueuer
                .push_bulk(&list_ids, |id| Self::job(status, id, FeedKind::List, update))
                .await?;

            match page.last() {
                Some(last) if !short_page => until_id = Some(last.id.clone()),
                _ => break,
            }
        }

        Ok(())
    }

    /// Deliver to accounts subscribed to the author's domain.
    ///
    /// Local authors have no domain, so this resolves nothing for them.
    /// A restricted guard drops candidates outside the allowed audience,
    /// checking follower membership in SQL one page at a time.
    pub async fn deliver_to_domain_subscribers(
        &self,
        status: &status::Model,
        author: &account::Model,
        update: bool,
        guard: &AudienceGuard,
    ) -> AppResult<()> {
        let Some(domain) = author.domain.as_deref() else {
            return Ok(());
        };
        let filter = Self::subscription_filter(status);

        let mut until_id: Option<String> = None;
        loop {
            let page = self
                .subscriptions
                .domain_subscribers_home(domain, filter, self.batch_size, until_id.as_deref())
                .await?;
            let short_page = (page.len() as u64) < self.batch_size;

            let candidates: Vec<String> = page.iter().map(|s| s.account_id.clone()).collect();
            let allowed = self.allowed_ids(guard, &candidates).await?;
            let targets: Vec<String> = page
                .iter()
                .filter(|s| Self::is_allowed(allowed.as_ref(), &s.account_id))
                .map(|s| s.account_id.clone())
                .collect();
            self.enqueuer
                .push_bulk(&targets, |id| Self::job(status, id, FeedKind::Home, update))
                .await?;

            match page.last() {
                Some(last) if !short_page => until_id = Some(last.id.clone()),
                _ => break,
            }
        }

        let mut until_id: Option<String> = None;
        loop {
            let page = self
                .subscriptions
                .domain_subscribers_list(domain, filter, self.batch_size, until_id.as_deref())
                .await?;
            let short_page = (page.len() as u64) < self.batch_size;

            let candidates: Vec<String> = page.iter().map(|s| s.account_id.clone()).collect();
            let allowed = self.allowed_ids(guard, &candidates).await?;
            let list_ids: Vec<String> = page
                .iter()
                .filter(|s| Self::is_allowed(allowed.as_ref(), &s.account_id))
                .filter_map(|s| s.list_id.clone())
                .collect();
            self.enqueuer
                .push_bulk(&list_ids, |id| Self::job(status, id, FeedKind::List, update))
                .await?;

            match page.last() {
                Some(last) if !short_page => until_id = Some(last.id.clone()),
                _ => break,
            }
        }

        Ok(())
    }

    /// Deliver to keyword-subscription owners whose rules match the text.
    ///
    /// Home-feed candidates that already follow the author are dropped so
    /// a post never lands in the same home feed through both paths; list
    /// candidates keep the overlap because list feeds are separate. The
    /// follow checks run in SQL over the rule owners, one bounded set per
    /// variant.
    pub async fn deliver_to_keyword_subscribers(
        &self,
        status: &status::Model,
        update: bool,
        guard: &AudienceGuard,
    ) -> AppResult<()> {
        let text = &status.searchable_text;
        if text.is_empty() {
            return Ok(());
        }

        let mut home_rules = self
            .subscriptions
            .active_keyword_subscribes_home(status.has_media)
            .await?;
        home_rules.retain(|r| r.account_id != status.account_id);

        let owner_ids: Vec<String> = home_rules.iter().map(|r| r.account_id.clone()).collect();
        let follower_owners: HashSet<String> = self
            .follows
            .local_followers_among(&status.account_id, &owner_ids)
            .await?
            .into_iter()
            .map(|f| f.account_id)
            .collect();
        home_rules.retain(|r| {
            !follower_owners.contains(&r.account_id)
                && (!guard.restricted || guard.mentioned.contains(&r.account_id))
        });
        let owners = KeywordMatcher::first_match_per_owner(&home_rules, text, |r| {
            Some(r.account_id.as_str())
        });
        self.enqueuer
            .push_bulk(&owners, |id| Self::job(status, id, FeedKind::Home, update))
            .await?;

        let mut list_rules = self
            .subscriptions
            .active_keyword_subscribes_list(status.has_media)
            .await?;
        let owner_ids: Vec<String> = list_rules.iter().map(|r| r.account_id.clone()).collect();
        let allowed = self.allowed_ids(guard, &owner_ids).await?;
        list_rules.retain(|r| Self::is_allowed(allowed.as_ref(), &r.account_id));
        let list_ids =
            KeywordMatcher::first_match_per_owner(&list_rules, text, |r| r.list_id.as_deref());
        self.enqueuer
            .push_bulk(&list_ids, |id| Self::job(status, id, FeedKind::List, update))
            .await?;

        Ok(())
    }

    /// Deliver to accounts and lists following any of the status's tags.
    ///
    /// A candidate is dropped when its owner has muted the matched tag.
    /// Targets are deduplicated so a post carrying two followed tags lands
    /// once per feed.
    pub async fn deliver_to_hashtag_followers(
        &self,
        status: &status::Model,
        update: bool,
    ) -> AppResult<()> {
        let tags = status.tag_names();
        if tags.is_empty() {
            return Ok(());
        }

        let muted: HashSet<(String, String)> = self
            .follow_tags
            .mutes_for_tags(&tags)
            .await?
            .into_iter()
            .map(|m| (m.account_id, m.tag))
            .collect();

        let home = self
            .follow_tags
            .home_follows_for_tags(&tags, status.has_media)
            .await?;
        let targets = Self::dedup_targets(home.iter().filter_map(|f| {
            (!muted.contains(&(f.account_id.clone(), f.tag.clone())))
                .then(|| f.account_id.clone())
        }));
        self.enqueuer
            .push_bulk(&targets, |id| Self::job(status, id, FeedKind::Home, update))
            .await?;

        let list = self
            .follow_tags
            .list_follows_for_tags(&tags, status.has_media)
            .await?;
        let targets = Self::dedup_targets(list.iter().filter_map(|f| {
            if muted.contains(&(f.account_id.clone(), f.tag.clone())) {
                None
            } else {
                f.list_id.clone()
            }
        }));
        self.enqueuer
            .push_bulk(&targets, |id| Self::job(status, id, FeedKind::List, update))
            .await?;

        Ok(())
    }

    /// Resolve the guarded subset of one candidate page.
    ///
    /// `None` means unrestricted (everything passes). Candidates that are
    /// neither the author nor mentioned are checked against the follow
    /// table in a single query, so memory stays bounded by the page size.
    async fn allowed_ids(
        &self,
        guard: &AudienceGuard,
        candidates: &[String],
    ) -> AppResult<Option<HashSet<String>>> {
        if !guard.restricted {
            return Ok(None);
        }

        let unknown: Vec<String> = candidates
            .iter()
            .filter(|id| !guard.passes_without_follow(id))
            .cloned()
            .collect();
        let mut allowed: HashSet<String> = self
            .follows
            .local_followers_among(&guard.author_id, &unknown)
            .await?
            .into_iter()
            .map(|f| f.account_id)
            .collect();
        allowed.extend(
            candidates
                .iter()
                .filter(|id| guard.passes_without_follow(id))
                .cloned(),
        );

        Ok(Some(allowed))
    }

    const fn subscription_filter(status: &status::Model) -> SubscriptionFilter {
        SubscriptionFilter {
            is_reblog: status.is_reblog(),
            has_media: status.has_media,
        }
    }

    fn is_allowed(allowed: Option<&HashSet<String>>, account_id: &str) -> bool {
        allowed.is_none_or(|set| set.contains(account_id))
    }

    fn dedup_targets<I: Iterator<Item = String>>(iter: I) -> Vec<String> {
        let mut seen = HashSet::new();
        iter.filter(|id| seen.insert(id.clone())).collect()
    }
}

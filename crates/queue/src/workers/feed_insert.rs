//! Feed insert worker.

use apalis::prelude::*;
use petrel_common::AppResult;
use petrel_core::{FeedInsertJob, FeedStoreHandle};
use petrel_db::repositories::StatusRepository;
use tracing::{debug, error};

/// Context for the feed insert worker.
#[derive(Clone)]
pub struct FeedInsertContext {
    pub statuses: StatusRepository,
    pub feed_store: FeedStoreHandle,
}

impl FeedInsertContext {
    /// Create a new feed insert context.
    #[must_use]
    pub const fn new(statuses: StatusRepository, feed_store: FeedStoreHandle) -> Self {
        Self {
            statuses,
            feed_store,
        }
    }
}

/// Worker function for inserting a status into one feed.
///
/// # Errors
/// Returns an error when the insertion fails; apalis retries the job.
pub async fn feed_insert_worker(
    job: FeedInsertJob,
    ctx: Data<FeedInsertContext>,
) -> Result<(), Error> {
    match insert_into_feed(&job, &ctx).await {
        Ok(true) => {
            debug!(
                status_id = %job.status_id,
                target_id = %job.target_id,
                feed_kind = %job.feed_kind,
                "Inserted status into feed"
            );
            Ok(())
        }
        Ok(false) => {
            // The status was deleted between enqueue and execution.
            debug!(status_id = %job.status_id, "Status gone, dropping feed insertion");
            Ok(())
        }
        Err(e) => {
            error!(status_id = %job.status_id, error = %e, "Failed to insert status into feed");
            let boxed: Box<dyn std::error::Error + Send + Sync> = Box::new(e);
            Err(Error::Failed(std::sync::Arc::new(boxed)))
        }
    }
}

/// Returns `Ok(false)` when the status no longer exists.
///
/// The store push is idempotent per `(target, kind, status)` key, so a
/// redelivered job inserts nothing new.
async fn insert_into_feed(job: &FeedInsertJob, ctx: &FeedInsertContext) -> AppResult<bool> {
    if ctx.statuses.find_by_id(&job.status_id).await?.is_none() {
        return Ok(false);
    }

    ctx.feed_store
        .push(&job.target_id, job.feed_kind, &job.status_id, job.update)
        .await?;

    Ok(true)
}

/// Spawn the feed insert worker on the given storage backend.
pub fn spawn_feed_insert_worker(
    storage: apalis_redis::RedisStorage<FeedInsertJob>,
    ctx: FeedInsertContext,
) {
    tokio::spawn(async move {
        let monitor = Monitor::new().register(
            WorkerBuilder::new("feed_insert")
                .data(ctx)
                .backend(storage)
                .build_fn(feed_insert_worker),
        );

        if let Err(e) = monitor.run().await {
            tracing::error!(error = %e, "Feed insert worker failed");
        }
    });
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use petrel_core::{FeedKind, FeedStore};
    use petrel_db::test_utils::public_status;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::collections::HashSet;
    use std::sync::{Arc, Mutex};

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

    /// Store keyed like the real timeline cache: one entry per
    /// `(target, kind, status)`.
    #[derive(Default)]
    struct DedupFeedStore {
        keys: Mutex<HashSet<(String, FeedKind, String)>>,
        push_count: Mutex<usize>,
    }

    #[async_trait]
    impl FeedStore for DedupFeedStore {
        async fn push(
            &self,
            target_id: &str,
            kind: FeedKind,
            status_id: &str,
            _update: bool,
        ) -> AppResult<()> {
            *self.push_count.lock().unwrap() += 1;
            self.keys.lock().unwrap().insert((
                target_id.to_string(),
                kind,
                status_id.to_string(),
            ));
            Ok(())
        }
    }

    fn job() -> FeedInsertJob {
        FeedInsertJob {
            status_id: "s1".to_string(),
            target_id: "a1".to_string(),
            feed_kind: FeedKind::Home,
            update: false,
        }
    }

    #[tokio::test]
    async fn test_insert_pushes_existing_status() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![public_status("s1", "author")]])
            .into_connection();
        let feed = Arc::new(RecordingFeedStore::default());
        let ctx = FeedInsertContext::new(
            StatusRepository::new(Arc::new(db)),
            feed.clone() as Arc<dyn FeedStore>,
        );

        let inserted = insert_into_feed(&job(), &ctx).await.unwrap();

        assert!(inserted);
        let pushes = feed.pushes.lock().unwrap();
        assert_eq!(pushes.len(), 1);
        assert_eq!(
            pushes[0],
            ("a1".to_string(), FeedKind::Home, "s1".to_string(), false)
        );
    }

    #[tokio::test]
    async fn test_missing_status_is_a_no_op() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<petrel_db::entities::status::Model>::new()])
            .into_connection();
        let feed = Arc::new(RecordingFeedStore::default());
        let ctx = FeedInsertContext::new(
            StatusRepository::new(Arc::new(db)),
            feed.clone() as Arc<dyn FeedStore>,
        );

        let inserted = insert_into_feed(&job(), &ctx).await.unwrap();

        assert!(!inserted);
        assert!(feed.pushes.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_redelivered_job_adds_no_new_feed_keys() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([
                vec![public_status("s1", "author")],
                vec![public_status("s1", "author")],
            ])
            .into_connection();
        let feed = Arc::new(DedupFeedStore::default());
        let ctx = FeedInsertContext::new(
            StatusRepository::new(Arc::new(db)),
            feed.clone() as Arc<dyn FeedStore>,
        );

        assert!(insert_into_feed(&job(), &ctx).await.unwrap());
        assert!(insert_into_feed(&job(), &ctx).await.unwrap());

        assert_eq!(*feed.push_count.lock().unwrap(), 2);
        let keys = feed.keys.lock().unwrap();
        assert_eq!(keys.len(), 1);
        assert!(keys.contains(&("a1".to_string(), FeedKind::Home, "s1".to_string())));
    }
}

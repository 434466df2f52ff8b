//! Bulk enqueuer.
//!
//! Submits durable feed-insertion jobs in paged batches, so a fan-out call
//! never blocks on individual recipients and never materializes a large
//! recipient set as one queue payload.

use async_trait::async_trait;
use petrel_common::AppResult;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::services::feed::FeedKind;

/// Queue name for feed insertion jobs.
pub const FEED_INSERT_JOB: &str = "feed_insert";

/// Jobs per `enqueue_bulk` submission.
pub const BATCH_SIZE: usize = 1000;

/// A durable feed-insertion job.
///
/// The consuming worker must insert idempotently, keyed by
/// `(target_id, feed_kind, status_id)`, and treat a missing status as a
/// benign no-op.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FeedInsertJob {
    /// The status to insert.
    pub status_id: String,
    /// The receiving feed's owner (account id or list id).
    pub target_id: String,
    /// Which kind of feed the target identifies.
    pub feed_kind: FeedKind,
    /// Whether this insertion replaces an earlier revision of the status.
    pub update: bool,
}

/// Trait for at-least-once batch job submission.
#[async_trait]
pub trait BulkJobQueue: Send + Sync {
    /// Submit a batch of job arguments under the given job name.
    async fn enqueue_bulk(&self, job: &str, args: Vec<serde_json::Value>) -> AppResult<()>;
}

/// Shared handle to a bulk job queue.
pub type BulkJobQueueHandle = Arc<dyn BulkJobQueue>;

/// Maps recipient collections onto feed-insertion jobs and submits them in
/// batches of at most [`BATCH_SIZE`].
#[derive(Clone)]
pub struct BulkEnqueuer {
    queue: BulkJobQueueHandle,
}

impl BulkEnqueuer {
    /// Create a new bulk enqueuer on the given queue.
    #[must_use]
    pub fn new(queue: BulkJobQueueHandle) -> Self {
        Self { queue }
    }

    /// Submit one feed-insertion job per source item.
    ///
    /// Empty collections submit nothing. Either the whole batch is handed
    /// to the queue or an error is returned; per-item blocking never
    /// happens.
    pub async fn push_bulk<T, F>(&self, items: &[T], mapper: F) -> AppResult<()>
    where
        F: Fn(&T) -> FeedInsertJob,
    {
        if items.is_empty() {
            return Ok(());
        }

        for chunk in items.chunks(BATCH_SIZE) {
            let args = chunk
                .iter()
                .map(|item| serde_json::to_value(mapper(item)))
                .collect::<Result<Vec<_>, _>>()?;

            self.queue.enqueue_bulk(FEED_INSERT_JOB, args).await?;
        }

        tracing::debug!(count = items.len(), "Submitted feed insertion jobs");

        Ok(())
    }
}

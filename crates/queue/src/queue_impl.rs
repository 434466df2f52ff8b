//! Redis-backed bulk feed-insertion queue.
//!
//! Implements the engine's batch job port on top of apalis-redis, so the
//! fan-out call returns once jobs are durably queued and the feed-insert
//! worker does the actual timeline writes.

use async_trait::async_trait;
use petrel_common::{AppError, AppResult};
use petrel_core::{BulkJobQueue, FeedInsertJob};
use serde_json::Value;

/// Redis-backed bulk job queue.
#[derive(Clone)]
pub struct RedisBulkQueue {
    storage: apalis_redis::RedisStorage<FeedInsertJob>,
}

impl RedisBulkQueue {
    /// Create a new queue over the given apalis storage.
    #[must_use]
    pub const fn new(storage: apalis_redis::RedisStorage<FeedInsertJob>) -> Self {
        Self { storage }
    }
}

/// Connect an apalis Redis storage for feed-insertion jobs.
pub async fn connect_storage(
    redis_url: &str,
) -> AppResult<apalis_redis::RedisStorage<FeedInsertJob>> {
    let client = redis::Client::open(redis_url).map_err(|e| AppError::Redis(e.to_string()))?;
    let conn = redis::aio::ConnectionManager::new(client)
        .await
        .map_err(|e| AppError::Redis(e.to_string()))?;

    Ok(apalis_redis::RedisStorage::new(conn))
}

#[async_trait]
impl BulkJobQueue for RedisBulkQueue {
    async fn enqueue_bulk(&self, job: &str, args: Vec<Value>) -> AppResult<()> {
        use apalis::prelude::*;

        let count = args.len();

        // Submit the whole batch concurrently so one slow push never
        // stalls the rest of the page.
        let pushes = args.into_iter().map(|arg| {
            let mut storage = self.storage.clone();
            async move {
                let queued: FeedInsertJob = serde_json::from_value(arg)?;
                storage
                    .push(queued)
                    .await
                    .map_err(|e| AppError::Queue(format!("Failed to queue job: {e}")))?;
                Ok::<(), AppError>(())
            }
        });
        futures::future::try_join_all(pushes).await?;

        tracing::debug!(job = %job, count = count, "Queued feed insertions");
        Ok(())
    }
}

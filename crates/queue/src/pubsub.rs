//! Redis Pub/Sub stream publisher.
//!
//! Backs the engine's best-effort broadcast port with Redis Pub/Sub so
//! streaming frontends on any instance can pick up timeline events.

use async_trait::async_trait;
use fred::clients::Client;
use fred::error::Error as RedisError;
use fred::interfaces::{ClientLike, PubsubInterface};
use fred::types::config::Config as RedisConfig;
use petrel_common::{AppError, AppResult};
use petrel_core::StreamPublisher;
use tracing::info;

/// Redis-backed stream publisher.
#[derive(Clone)]
pub struct RedisStreamPublisher {
    publisher: Client,
}

impl RedisStreamPublisher {
    /// Connect a new publisher to the given Redis instance.
    pub async fn new(redis_url: &str) -> Result<Self, RedisError> {
        let config = RedisConfig::from_url(redis_url)?;

        let publisher = Client::new(config, None, None, None);
        publisher.init().await?;

        info!("Redis stream publisher initialized");

        Ok(Self { publisher })
    }

    /// Close the underlying connection.
    pub async fn shutdown(&self) -> Result<(), RedisError> {
        self.publisher.quit().await?;
        info!("Redis stream publisher shutdown");
        Ok(())
    }
}

#[async_trait]
impl StreamPublisher for RedisStreamPublisher {
    async fn publish(&self, channel: &str, payload: &str) -> AppResult<()> {
        let _: () = self
            .publisher
            .publish(channel, payload)
            .await
            .map_err(|e| AppError::Redis(e.to_string()))?;

        tracing::debug!(channel = %channel, "Published stream event");
        Ok(())
    }
}

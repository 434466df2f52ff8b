//! Redis adapters for the petrel fan-out engine.
//!
//! This crate backs the engine's ports with Redis:
//!
//! - **Queue**: durable batched feed insertions over apalis-redis
//! - **Workers**: the feed-insert worker consuming those jobs
//! - **Pub/Sub**: best-effort timeline broadcasts over Redis Pub/Sub

pub mod pubsub;
pub mod queue_impl;
pub mod workers;

pub use pubsub::RedisStreamPublisher;
pub use queue_impl::{RedisBulkQueue, connect_storage};
pub use workers::*;

//! Feed store port.
//!
//! The timeline cache itself (capped length, eviction) is an external
//! collaborator; this trait is the engine's view of it.

use async_trait::async_trait;
use petrel_common::AppResult;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// The kind of feed a recipient target identifies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedKind {
    /// An account's personal home timeline.
    Home,
    /// A curated list feed.
    List,
}

impl fmt::Display for FeedKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Home => write!(f, "home"),
            Self::List => write!(f, "list"),
        }
    }
}

/// Trait for pushing a status into a feed.
///
/// Implementations must be idempotent per `(target, kind, status)` key;
/// the engine may submit the same insertion more than once.
#[async_trait]
pub trait FeedStore: Send + Sync {
    /// Push a status into the given feed.
    async fn push(
        &self,
        target_id: &str,
        kind: FeedKind,
        status_id: &str,
        update: bool,
    ) -> AppResult<()>;
}

/// A no-op implementation for testing or when feeds are disabled.
#[derive(Clone, Default)]
pub struct NoOpFeedStore;

#[async_trait]
impl FeedStore for NoOpFeedStore {
    async fn push(
        &self,
        _target_id: &str,
        _kind: FeedKind,
        _status_id: &str,
        _update: bool,
    ) -> AppResult<()> {
        Ok(())
    }
}

/// Shared handle to a feed store.
pub type FeedStoreHandle = Arc<dyn FeedStore>;

//! Notification dispatch for mentions and edits.

use async_trait::async_trait;
use petrel_common::AppResult;
use petrel_db::repositories::AccountRepository;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// What a notification is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// The account was mentioned in the status.
    Mention,
    /// A status the account interacted with was edited.
    Update,
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mention => write!(f, "mention"),
            Self::Update => write!(f, "update"),
        }
    }
}

/// Fire-and-forget notification sink.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Notify a local account about a status.
    async fn notify(&self, account_id: &str, kind: NotificationKind, status_id: &str)
    -> AppResult<()>;
}

/// Shared handle to a notifier.
pub type NotifierHandle = Arc<dyn Notifier>;

/// A notifier that drops everything, for tests and disabled setups.
#[derive(Clone, Default)]
pub struct NoOpNotifier;

#[async_trait]
impl Notifier for NoOpNotifier {
    async fn notify(
        &self,
        _account_id: &str,
        _kind: NotificationKind,
        _status_id: &str,
    ) -> AppResult<()> {
        Ok(())
    }
}

/// Resolves notification targets and hands them to the [`Notifier`].
#[derive(Clone)]
pub struct NotificationDispatcher {
    accounts: AccountRepository,
    notifier: NotifierHandle,
}

impl NotificationDispatcher {
    /// Create a new dispatcher.
    #[must_use]
    pub fn new(accounts: AccountRepository, notifier: NotifierHandle) -> Self {
        Self { accounts, notifier }
    }

    /// Notify the local accounts among `candidate_ids`, minus `excluded_ids`.
    ///
    /// Remote and suspended candidates are dropped at the store level.
    /// Notifier failures are logged per target and do not abort the batch.
    pub async fn dispatch(
        &self,
        candidate_ids: &[String],
        excluded_ids: &[String],
        kind: NotificationKind,
        status_id: &str,
    ) -> AppResult<()> {
        let candidates: Vec<String> = candidate_ids
            .iter()
            .filter(|id| !excluded_ids.contains(*id))
            .cloned()
            .collect();

        let targets = self.accounts.find_local_by_ids(&candidates).await?;

        for target in targets {
            if let Err(e) = self.notifier.notify(&target.id, kind, status_id).await {
                tracing::warn!(
                    account_id = %target.id,
                    kind = %kind,
                    error = %e,
                    "Dropped notification"
                );
            }
        }

        Ok(())
    }
}

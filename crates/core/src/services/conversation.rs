//! Conversation tracking for direct statuses.

use chrono::Utc;
use petrel_common::{AppResult, IdGenerator};
use petrel_db::entities::{account_conversation, status};
use petrel_db::repositories::ConversationRepository;
use sea_orm::ActiveValue::Set;
use serde_json::json;

/// Records the author-side conversation row for direct statuses.
#[derive(Clone)]
pub struct ConversationService {
    conversations: ConversationRepository,
    id_gen: IdGenerator,
}

impl ConversationService {
    /// Create a new conversation service.
    #[must_use]
    pub fn new(conversations: ConversationRepository, id_gen: IdGenerator) -> Self {
        Self {
            conversations,
            id_gen,
        }
    }

    /// Insert the author-side conversation row for a direct status.
    ///
    /// Participants are the mentioned accounts; the author is implicit as
    /// the row owner. Callers gate on initial publish so edits never add
    /// duplicate rows.
    pub async fn add_status(&self, status: &status::Model) -> AppResult<()> {
        let participants = status.mentioned_account_ids();

        let row = account_conversation::ActiveModel {
            id: Set(self.id_gen.generate()),
            account_id: Set(status.account_id.clone()),
            status_id: Set(status.id.clone()),
            participant_ids: Set(json!(participants)),
            created_at: Set(Utc::now().into()),
        };

        let created = self.conversations.create(row).await?;
        tracing::debug!(
            status_id = %status.id,
            conversation_id = %created.id,
            "Recorded direct conversation"
        );

        Ok(())
    }
}

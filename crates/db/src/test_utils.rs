//! Test utilities for database-backed tests.
//!
//! Provides model factories and a mock-connection helper shared by the
//! repository and service tests.

#![allow(clippy::unwrap_used, missing_docs)]

use std::sync::Arc;

use chrono::Utc;
use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase};
use serde_json::json;

use crate::entities::{account, follow, keyword_subscribe, status, status::Visibility};

/// An empty mock Postgres connection.
#[must_use]
pub fn mock_db() -> Arc<DatabaseConnection> {
    Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection())
}

/// A local, unremarkable account.
#[must_use]
pub fn local_account(id: &str) -> account::Model {
    account::Model {
        id: id.to_string(),
        username: format!("user_{id}"),
        domain: None,
        silenced: false,
        bot: false,
        group: false,
        suspended: false,
        created_at: Utc::now().into(),
    }
}

/// A remote account on the given domain.
#[must_use]
pub fn remote_account(id: &str, domain: &str) -> account::Model {
    account::Model {
        domain: Some(domain.to_string()),
        ..local_account(id)
    }
}

/// A plain public status with no tags, mentions or media.
#[must_use]
pub fn public_status(id: &str, account_id: &str) -> status::Model {
    status::Model {
        id: id.to_string(),
        account_id: account_id.to_string(),
        visibility: Some(Visibility::Public),
        reblog_of_id: None,
        in_reply_to_account_id: None,
        searchable_text: String::new(),
        tags: json!([]),
        mentions: json!([]),
        has_media: false,
        created_at: Utc::now().into(),
        updated_at: None,
    }
}

/// A local follow relationship with default delivery toggles.
#[must_use]
pub fn local_follow(id: &str, account_id: &str, target_account_id: &str) -> follow::Model {
    follow::Model {
        id: id.to_string(),
        account_id: account_id.to_string(),
        target_account_id: target_account_id.to_string(),
        account_domain: None,
        show_reblogs: true,
        notify: false,
        delivery: true,
        created_at: Utc::now().into(),
    }
}

/// An active home-feed keyword subscription rule.
#[must_use]
pub fn keyword_rule(id: &str, account_id: &str, keyword: &str) -> keyword_subscribe::Model {
    keyword_subscribe::Model {
        id: id.to_string(),
        account_id: account_id.to_string(),
        list_id: None,
        name: keyword.to_string(),
        keyword: keyword.to_string(),
        exclude_keyword: None,
        active: true,
        media_only: false,
        created_at: Utc::now().into(),
    }
}

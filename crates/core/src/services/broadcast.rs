//! Real-time broadcaster.
//!
//! Renders a status payload exactly once per fan-out call and publishes it
//! to hierarchical pub/sub channels. Best-effort only: a missed broadcast
//! delays live-client visibility, while the durable queue path still
//! guarantees eventual feed presence.

use async_trait::async_trait;
use petrel_common::AppResult;
use petrel_db::entities::{account, status};
use serde_json::json;
use std::sync::Arc;

/// Trait for best-effort publish/subscribe transport.
///
/// No delivery guarantee, no backpressure reported to the publisher.
#[async_trait]
pub trait StreamPublisher: Send + Sync {
    /// Publish a serialized payload to a channel.
    async fn publish(&self, channel: &str, payload: &str) -> AppResult<()>;
}

/// Shared handle to a stream publisher.
pub type StreamPublisherHandle = Arc<dyn StreamPublisher>;

/// Stream event names.
mod events {
    pub const UPDATE: &str = "update";
    pub const STATUS_UPDATE: &str = "status.update";
}

/// Real-time broadcaster over a [`StreamPublisher`].
#[derive(Clone)]
pub struct Broadcaster {
    publisher: StreamPublisherHandle,
}

impl Broadcaster {
    /// Create a new broadcaster on the given transport.
    #[must_use]
    pub fn new(publisher: StreamPublisherHandle) -> Self {
        Self { publisher }
    }

    /// Broadcast a status to the public and hashtag streams.
    ///
    /// The caller has already applied the gating rules (public visibility,
    /// non-silenced author, not a reblog, not a foreign reply); this method
    /// only fans the rendered envelope out to channels. Individual publish
    /// failures are logged and swallowed.
    pub async fn broadcast_status(
        &self,
        status: &status::Model,
        author: &account::Model,
        update: bool,
    ) -> AppResult<()> {
        let payload = render_envelope(status, update)?;

        let mut channels = public_channels(author, status.has_media);
        channels.extend(hashtag_channels(&status.tag_names(), author, status.has_media));
        if author.group {
            channels.extend(group_channels(
                &author.id,
                &status.tag_names(),
                status.has_media,
            ));
        }

        for channel in &channels {
            if let Err(e) = self.publisher.publish(channel, &payload).await {
                tracing::warn!(channel = %channel, error = %e, "Dropped stream broadcast");
            }
        }

        tracing::debug!(
            status_id = %status.id,
            channel_count = channels.len(),
            "Broadcast status to live streams"
        );

        Ok(())
    }
}

/// Serialize the `{event, payload}` envelope once for the whole call.
fn render_envelope(status: &status::Model, update: bool) -> AppResult<String> {
    let event = if update {
        events::STATUS_UPDATE
    } else {
        events::UPDATE
    };

    let envelope = json!({
        "event": event,
        "payload": {
            "id": status.id,
            "account_id": status.account_id,
            "text": status.searchable_text,
            "tags": status.tag_names(),
            "has_media": status.has_media,
        },
    });

    Ok(serde_json::to_string(&envelope)?)
}

/// Public timeline channels for the given author and media flag.
fn public_channels(author: &account::Model, has_media: bool) -> Vec<String> {
    let mut channels = vec!["timeline:public".to_string()];

    if !author.bot {
        channels.push("timeline:public:nobot".to_string());
    }

    if let Some(ref domain) = author.domain {
        channels.push("timeline:public:remote".to_string());
        channels.push(format!("timeline:public:domain:{}", domain.to_lowercase()));
    } else {
        channels.push("timeline:public:local".to_string());
    }

    if has_media {
        channels.push("timeline:public:media".to_string());
    } else {
        channels.push("timeline:public:nomedia".to_string());
    }

    channels
}

/// Per-hashtag channels, with nobot, local and media sub-variants.
fn hashtag_channels(tags: &[String], author: &account::Model, has_media: bool) -> Vec<String> {
    let mut channels = Vec::new();

    for tag in tags {
        let tag = tag.to_lowercase();
        channels.push(format!("timeline:hashtag:{tag}"));
        if !author.bot {
            channels.push(format!("timeline:hashtag:nobot:{tag}"));
        }
        if author.is_local() {
            channels.push(format!("timeline:hashtag:{tag}:local"));
        }
        if has_media {
            channels.push(format!("timeline:hashtag:{tag}:media"));
        }
    }

    channels
}

/// Per-group-actor channels, with media variants and per-hashtag
/// sub-channels.
fn group_channels(group_account_id: &str, tags: &[String], has_media: bool) -> Vec<String> {
    let media_prefix = if has_media { "media" } else { "nomedia" };
    let mut channels = vec![
        format!("timeline:group:{group_account_id}"),
        format!("timeline:group:{media_prefix}:{group_account_id}"),
    ];

    for tag in tags {
        let tag = tag.to_lowercase();
        channels.push(format!("timeline:group:{group_account_id}:{tag}"));
        channels.push(format!(
            "timeline:group:{media_prefix}:{group_account_id}:{tag}"
        ));
    }

    channels
}

/// A no-op publisher for testing or when streaming is disabled.
#[derive(Clone, Default)]
pub struct NoOpStreamPublisher;

#[async_trait]
impl StreamPublisher for NoOpStreamPublisher {
    async fn publish(&self, _channel: &str, _payload: &str) -> AppResult<()> {
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use super::*;
    use petrel_db::test_utils::{local_account, public_status, remote_account};
    use serde_json::json;
    use std::sync::Mutex;

    /// Publisher fake that records every message.
    #[derive(Default)]
    pub(crate) struct RecordingPublisher {
        pub messages: Mutex<Vec<(String, String)>>,
    }

    impl RecordingPublisher {
        pub fn channels(&self) -> Vec<String> {
            self.messages
                .lock()
                .unwrap()
                .iter()
                .map(|(c, _)| c.clone())
                .collect()
        }
    }

    #[async_trait]
    impl StreamPublisher for RecordingPublisher {
        async fn publish(&self, channel: &str, payload: &str) -> AppResult<()> {
            self.messages
                .lock()
                .unwrap()
                .push((channel.to_string(), payload.to_string()));
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_local_status_channels() {
        let publisher = Arc::new(RecordingPublisher::default());
        let broadcaster = Broadcaster::new(publisher.clone());

        let author = local_account("a1");
        let mut status = public_status("s1", "a1");
        status.tags = json!(["ruby"]);

        broadcaster
            .broadcast_status(&status, &author, false)
            .await
            .unwrap();

        let channels = publisher.channels();
        assert!(channels.contains(&"timeline:public".to_string()));
        assert!(channels.contains(&"timeline:public:local".to_string()));
        assert!(channels.contains(&"timeline:public:nomedia".to_string()));
        assert!(channels.contains(&"timeline:public:nobot".to_string()));
        assert!(channels.contains(&"timeline:hashtag:ruby".to_string()));
        assert!(channels.contains(&"timeline:hashtag:nobot:ruby".to_string()));
        assert!(channels.contains(&"timeline:hashtag:ruby:local".to_string()));
        assert!(!channels.iter().any(|c| c.contains("remote")));
    }

    #[tokio::test]
    async fn test_remote_bot_channels() {
        let publisher = Arc::new(RecordingPublisher::default());
        let broadcaster = Broadcaster::new(publisher.clone());

        let mut author = remote_account("a1", "Example.Social");
        author.bot = true;
        let mut status = public_status("s1", "a1");
        status.has_media = true;
        status.tags = json!(["ruby"]);

        broadcaster
            .broadcast_status(&status, &author, false)
            .await
            .unwrap();

        let channels = publisher.channels();
        assert!(channels.contains(&"timeline:public:remote".to_string()));
        assert!(channels.contains(&"timeline:public:domain:example.social".to_string()));
        assert!(channels.contains(&"timeline:public:media".to_string()));
        assert!(channels.contains(&"timeline:hashtag:ruby:media".to_string()));
        assert!(!channels.contains(&"timeline:public:nobot".to_string()));
        assert!(!channels.contains(&"timeline:hashtag:nobot:ruby".to_string()));
        assert!(!channels.contains(&"timeline:public:local".to_string()));
    }

    #[tokio::test]
    async fn test_group_actor_channels() {
        let publisher = Arc::new(RecordingPublisher::default());
        let broadcaster = Broadcaster::new(publisher.clone());

        let mut author = local_account("g1");
        author.group = true;
        let mut status = public_status("s1", "g1");
        status.tags = json!(["news"]);

        broadcaster
            .broadcast_status(&status, &author, false)
            .await
            .unwrap();

        let channels = publisher.channels();
        assert!(channels.contains(&"timeline:group:g1".to_string()));
        assert!(channels.contains(&"timeline:group:g1:news".to_string()));
        assert!(channels.contains(&"timeline:group:nomedia:g1".to_string()));
        assert!(channels.contains(&"timeline:group:nomedia:g1:news".to_string()));
        assert!(!channels.contains(&"timeline:group:media:g1".to_string()));
    }

    #[tokio::test]
    async fn test_payload_rendered_once() {
        let publisher = Arc::new(RecordingPublisher::default());
        let broadcaster = Broadcaster::new(publisher.clone());

        let author = local_account("a1");
        let mut status = public_status("s1", "a1");
        status.tags = json!(["ruby", "rust"]);

        broadcaster
            .broadcast_status(&status, &author, false)
            .await
            .unwrap();

        let messages = publisher.messages.lock().unwrap();
        assert!(messages.len() > 1);
        let first = &messages[0].1;
        assert!(messages.iter().all(|(_, p)| p == first));
        assert!(first.contains("\"event\":\"update\""));
    }

    #[tokio::test]
    async fn test_update_event_name() {
        let publisher = Arc::new(RecordingPublisher::default());
        let broadcaster = Broadcaster::new(publisher.clone());

        let author = local_account("a1");
        let status = public_status("s1", "a1");

        broadcaster
            .broadcast_status(&status, &author, true)
            .await
            .unwrap();

        let messages = publisher.messages.lock().unwrap();
        assert!(messages[0].1.contains("\"event\":\"status.update\""));
    }
}

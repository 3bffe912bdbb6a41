use teloxide::types::{ChatId, FileId};

use crate::errors::PersistenceError;
use crate::registry::ChannelRegistry;
use crate::transport::Transport;

/// One authored message, as submitted by an operator. Media always wins over
/// text: a message carrying both becomes a photo/video payload with the text
/// as caption.
#[derive(Clone, Debug)]
pub enum BroadcastPayload {
    Text { text: String },
    Photo { file: FileId, caption: String },
    Video { file: FileId, caption: String },
}

/// Aggregate outcome of one fan-out run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Chats that accepted the delivery.
    pub delivered: usize,
    /// Chats the run tried to reach (registry size at start).
    pub attempted: usize,
    /// Sum of last-known member counts over delivered chats only.
    pub reach: i64,
}

/// Fans the payload out to every registered chat, one at a time.
///
/// The chat list is read once up front; chats registered mid-run are not
/// picked up. A failed delivery is logged and counted as a miss, never
/// aborting the rest of the batch. A successful video delivery bumps that
/// chat's `videos_sent` counter; text and photo deliveries do not.
pub async fn run(
    transport: &impl Transport,
    registry: &ChannelRegistry,
    payload: &BroadcastPayload,
) -> Result<BroadcastReport, PersistenceError> {
    let chats = registry.list().await?;
    let mut report = BroadcastReport {
        attempted: chats.len(),
        ..BroadcastReport::default()
    };

    for chat in &chats {
        let chat_id = ChatId(chat.id);
        let outcome = match payload {
            BroadcastPayload::Text { text } => transport.deliver_text(chat_id, text).await,
            BroadcastPayload::Photo { file, caption } => {
                transport.deliver_photo(chat_id, file, caption).await
            }
            BroadcastPayload::Video { file, caption } => {
                transport.deliver_video(chat_id, file, caption).await
            }
        };

        match outcome {
            Ok(()) => {
                report.delivered += 1;
                report.reach += chat.members;
                if matches!(payload, BroadcastPayload::Video { .. }) {
                    if let Err(e) = registry.increment_video_count(chat.id).await {
                        log::warn!("failed to bump video counter for {}: {}", chat.id, e);
                    }
                }
            }
            Err(e) => {
                log::warn!("{}", e);
            }
        }
    }

    Ok(report)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::errors::DeliveryError;
    use crate::registry::tests::registry_at;
    use crate::transport::ChatProbe;
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::sync::Mutex;

    /// Records every delivery and fails the chat ids it is told to.
    pub(crate) struct MockTransport {
        pub failing: HashSet<i64>,
        pub sent: Mutex<Vec<(i64, String)>>,
    }

    impl MockTransport {
        pub(crate) fn failing(ids: &[i64]) -> Self {
            Self {
                failing: ids.iter().copied().collect(),
                sent: Mutex::new(Vec::new()),
            }
        }

        fn record(&self, chat: ChatId, what: &str) -> Result<(), DeliveryError> {
            if self.failing.contains(&chat.0) {
                return Err(DeliveryError {
                    chat,
                    source: teloxide::RequestError::Api(teloxide::ApiError::BotBlocked),
                });
            }
            self.sent.lock().unwrap().push((chat.0, what.to_string()));
            Ok(())
        }
    }

    #[async_trait]
    impl Transport for MockTransport {
        async fn deliver_text(&self, chat: ChatId, text: &str) -> Result<(), DeliveryError> {
            self.record(chat, text)
        }

        async fn deliver_photo(
            &self,
            chat: ChatId,
            _file: &FileId,
            caption: &str,
        ) -> Result<(), DeliveryError> {
            self.record(chat, caption)
        }

        async fn deliver_video(
            &self,
            chat: ChatId,
            _file: &FileId,
            caption: &str,
        ) -> Result<(), DeliveryError> {
            self.record(chat, caption)
        }

        async fn probe_chat(&self, chat: ChatId) -> Result<ChatProbe, DeliveryError> {
            if self.failing.contains(&chat.0) {
                return Err(DeliveryError {
                    chat,
                    source: teloxide::RequestError::Api(teloxide::ApiError::BotKicked),
                });
            }
            Ok(ChatProbe {
                title: format!("chat {}", chat.0),
                members: 100,
                username: None,
            })
        }

        async fn depart_chat(&self, chat: ChatId) -> Result<(), DeliveryError> {
            self.record(chat, "leave")
        }
    }

    #[tokio::test]
    async fn one_failing_chat_does_not_abort_the_batch() {
        let dir = tempfile::tempdir().expect("tempdir");
        let registry = registry_at(&dir.path().join("channels.db"));
        registry
            .upsert(100, "big".into(), 50, "member".into(), "group".into(), "".into())
            .await
            .expect("insert");
        registry
            .upsert(200, "small".into(), 5, "member".into(), "group".into(), "".into())
            .await
            .expect("insert");

        let transport = MockTransport::failing(&[200]);
        let payload = BroadcastPayload::Text { text: "hello".into() };
        let report = run(&transport, &registry, &payload).await.expect("run");

        assert_eq!(
            report,
            BroadcastReport { delivered: 1, attempted: 2, reach: 50 }
        );
        assert_eq!(*transport.sent.lock().unwrap(), vec![(100, "hello".to_string())]);
    }

    #[tokio::test]
    async fn video_success_bumps_the_counter_once() {
        let dir = tempfile::tempdir().expect("tempdir");
        let registry = registry_at(&dir.path().join("channels.db"));
        registry
            .upsert(1, "a".into(), 10, "member".into(), "group".into(), "".into())
            .await
            .expect("insert");
        registry
            .upsert(2, "b".into(), 20, "member".into(), "group".into(), "".into())
            .await
            .expect("insert");

        let transport = MockTransport::failing(&[2]);
        let payload = BroadcastPayload::Video {
            file: FileId("vid".to_string()),
            caption: String::new(),
        };
        let report = run(&transport, &registry, &payload).await.expect("run");
        assert_eq!(report.delivered, 1);

        let counters: Vec<(i64, i64)> = registry
            .list()
            .await
            .expect("list")
            .into_iter()
            .map(|r| (r.id, r.videos_sent))
            .collect();
        assert_eq!(counters, vec![(1, 1), (2, 0)]);
    }

    #[tokio::test]
    async fn photo_and_text_do_not_touch_the_video_counter() {
        let dir = tempfile::tempdir().expect("tempdir");
        let registry = registry_at(&dir.path().join("channels.db"));
        registry
            .upsert(9, "c".into(), 7, "member".into(), "group".into(), "".into())
            .await
            .expect("insert");

        let transport = MockTransport::failing(&[]);
        let photo = BroadcastPayload::Photo {
            file: FileId("pic".to_string()),
            caption: "cap".into(),
        };
        run(&transport, &registry, &photo).await.expect("photo run");

        let text = BroadcastPayload::Text { text: "t".into() };
        run(&transport, &registry, &text).await.expect("text run");

        assert_eq!(registry.list().await.expect("list")[0].videos_sent, 0);
    }

    #[tokio::test]
    async fn empty_registry_reports_zeroes() {
        let dir = tempfile::tempdir().expect("tempdir");
        let registry = registry_at(&dir.path().join("channels.db"));

        let transport = MockTransport::failing(&[]);
        let payload = BroadcastPayload::Text { text: "x".into() };
        let report = run(&transport, &registry, &payload).await.expect("run");
        assert_eq!(report, BroadcastReport::default());
    }
}

use teloxide::types::ChatId;

use crate::errors::PersistenceError;
use crate::registry::ChannelRegistry;
use crate::transport::Transport;

/// Departs every registered chat and purges the rows of the chats actually
/// left. A failed departure leaves its row untouched so the chat is not
/// silently forgotten. Returns how many chats were left.
pub async fn leave_all(
    transport: &impl Transport,
    registry: &ChannelRegistry,
) -> Result<usize, PersistenceError> {
    let chats = registry.list().await?;
    let mut left = 0usize;

    for chat in &chats {
        match transport.depart_chat(ChatId(chat.id)).await {
            Ok(()) => {
                left += 1;
                if let Err(e) = registry.delete(chat.id).await {
                    log::warn!("left {} but could not purge its record: {}", chat.id, e);
                }
            }
            Err(e) => {
                log::warn!("could not leave {}: {}", chat.id, e);
            }
        }
    }

    Ok(left)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broadcast::tests::MockTransport;
    use crate::registry::tests::registry_at;

    #[tokio::test]
    async fn successful_departures_are_purged_failures_kept() {
        let dir = tempfile::tempdir().expect("tempdir");
        let registry = registry_at(&dir.path().join("channels.db"));
        for id in [1, 2, 3] {
            registry
                .upsert(id, format!("chat {id}"), 5, "member".into(), "group".into(), "".into())
                .await
                .expect("insert");
        }

        let transport = MockTransport::failing(&[2]);
        let left = leave_all(&transport, &registry).await.expect("leave");
        assert_eq!(left, 2);

        let remaining = registry.list().await.expect("list");
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, 2);
        assert_eq!(remaining[0].membership, "member", "failed row is untouched");
    }

    #[tokio::test]
    async fn empty_registry_leaves_nothing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let registry = registry_at(&dir.path().join("channels.db"));
        let transport = MockTransport::failing(&[]);
        assert_eq!(leave_all(&transport, &registry).await.expect("leave"), 0);
    }
}

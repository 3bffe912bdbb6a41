use std::sync::Arc;

use rusqlite::params;
use rusqlite::types::Value;

use crate::database::DatabasePool;
use crate::errors::PersistenceError;

/// One row per chat the bot currently believes it is a member of.
#[derive(Clone, Debug, PartialEq)]
pub struct ChatRecord {
    pub id: i64,
    pub title: String,
    pub members: i64,
    pub videos_sent: i64,
    /// `datetime('now')` text, UTC, `YYYY-MM-DD HH:MM:SS`.
    pub date_added: String,
    /// Role/lifecycle: unknown, member, administrator, owner, restricted,
    /// left, kicked.
    pub membership: String,
    /// Chat kind tag: group, supergroup, channel, unknown.
    pub chat_type: String,
    pub invite_link: String,
}

/// Partial update for `update_fields`; `None` leaves the column alone.
#[derive(Clone, Debug, Default)]
pub struct ChatPatch {
    pub title: Option<String>,
    pub members: Option<i64>,
    pub membership: Option<String>,
    pub chat_type: Option<String>,
    pub invite_link: Option<String>,
}

impl ChatPatch {
    pub fn membership(value: &str) -> Self {
        Self {
            membership: Some(value.to_string()),
            ..Self::default()
        }
    }
}

pub struct ChannelRegistry {
    pool: Arc<DatabasePool>,
}

impl ChannelRegistry {
    pub fn new(pool: Arc<DatabasePool>) -> Self {
        Self { pool }
    }

    /// Insert a chat or refresh its mutable columns. `videos_sent` and
    /// `date_added` are never touched by an upsert.
    pub async fn upsert(
        &self,
        id: i64,
        title: String,
        members: i64,
        membership: String,
        chat_type: String,
        invite_link: String,
    ) -> Result<(), PersistenceError> {
        self.pool
            .execute_with_timeout(move |conn| {
                conn.execute(
                    "INSERT INTO channels (id, title, members, membership, chat_type, invite_link)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                     ON CONFLICT(id) DO UPDATE SET
                        title = excluded.title,
                        members = excluded.members,
                        membership = excluded.membership,
                        chat_type = excluded.chat_type,
                        invite_link = excluded.invite_link",
                    params![id, title, members, membership, chat_type, invite_link],
                )?;
                Ok(())
            })
            .await
    }

    /// Partial update; a patch with no fields set is a no-op.
    pub async fn update_fields(&self, id: i64, patch: ChatPatch) -> Result<(), PersistenceError> {
        self.pool
            .execute_with_timeout(move |conn| {
                let mut sets: Vec<&str> = Vec::new();
                let mut values: Vec<Value> = Vec::new();

                if let Some(title) = patch.title {
                    sets.push("title = ?");
                    values.push(Value::Text(title));
                }
                if let Some(members) = patch.members {
                    sets.push("members = ?");
                    values.push(Value::Integer(members));
                }
                if let Some(membership) = patch.membership {
                    sets.push("membership = ?");
                    values.push(Value::Text(membership));
                }
                if let Some(chat_type) = patch.chat_type {
                    sets.push("chat_type = ?");
                    values.push(Value::Text(chat_type));
                }
                if let Some(link) = patch.invite_link {
                    sets.push("invite_link = ?");
                    values.push(Value::Text(link));
                }

                if sets.is_empty() {
                    return Ok(());
                }

                values.push(Value::Integer(id));
                let sql = format!("UPDATE channels SET {} WHERE id = ?", sets.join(", "));
                conn.execute(&sql, rusqlite::params_from_iter(values))?;
                Ok(())
            })
            .await
    }

    /// `videos_sent += 1`; a missing id affects no rows and is not an error.
    pub async fn increment_video_count(&self, id: i64) -> Result<(), PersistenceError> {
        self.pool
            .execute_with_timeout(move |conn| {
                conn.execute(
                    "UPDATE channels SET videos_sent = videos_sent + 1 WHERE id = ?1",
                    params![id],
                )?;
                Ok(())
            })
            .await
    }

    /// Full scan, oldest first. Ties broken by id so the order is stable.
    pub async fn list(&self) -> Result<Vec<ChatRecord>, PersistenceError> {
        self.pool
            .execute_with_timeout(|conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, title, members, videos_sent, date_added,
                            membership, chat_type, invite_link
                     FROM channels
                     ORDER BY date_added ASC, id ASC",
                )?;
                let rows = stmt.query_map([], |row| {
                    Ok(ChatRecord {
                        id: row.get(0)?,
                        title: row.get(1)?,
                        members: row.get(2)?,
                        videos_sent: row.get(3)?,
                        date_added: row.get(4)?,
                        membership: row.get(5)?,
                        chat_type: row.get(6)?,
                        invite_link: row.get(7)?,
                    })
                })?;

                let mut records = Vec::new();
                for row in rows {
                    records.push(row?);
                }
                Ok(records)
            })
            .await
    }

    /// Idempotent: deleting an unknown id affects no rows.
    pub async fn delete(&self, id: i64) -> Result<(), PersistenceError> {
        self.pool
            .execute_with_timeout(move |conn| {
                conn.execute("DELETE FROM channels WHERE id = ?1", params![id])?;
                Ok(())
            })
            .await
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::database;
    use std::path::Path;

    pub(crate) fn registry_at(path: &Path) -> ChannelRegistry {
        database::init_schema(path).expect("schema");
        ChannelRegistry::new(Arc::new(DatabasePool::new(path, 2)))
    }

    async fn get(registry: &ChannelRegistry, id: i64) -> Option<ChatRecord> {
        registry
            .list()
            .await
            .expect("list")
            .into_iter()
            .find(|r| r.id == id)
    }

    #[tokio::test]
    async fn upsert_preserves_counters_and_creation_date() {
        let dir = tempfile::tempdir().expect("tempdir");
        let registry = registry_at(&dir.path().join("channels.db"));

        registry
            .upsert(1, "A".into(), 10, "member".into(), "group".into(), "".into())
            .await
            .expect("insert");
        registry.increment_video_count(1).await.expect("bump");

        let before = get(&registry, 1).await.expect("record");
        assert_eq!(before.videos_sent, 1);

        registry
            .upsert(1, "A2".into(), 12, "administrator".into(), "supergroup".into(), "l".into())
            .await
            .expect("update");

        let after = get(&registry, 1).await.expect("record");
        assert_eq!(after.title, "A2");
        assert_eq!(after.members, 12);
        assert_eq!(after.membership, "administrator");
        assert_eq!(after.chat_type, "supergroup");
        assert_eq!(after.invite_link, "l");
        assert_eq!(after.videos_sent, 1, "upsert must not reset the counter");
        assert_eq!(after.date_added, before.date_added);
    }

    #[tokio::test]
    async fn increment_is_exact_and_ignores_unknown_ids() {
        let dir = tempfile::tempdir().expect("tempdir");
        let registry = registry_at(&dir.path().join("channels.db"));

        registry
            .upsert(7, "C".into(), 3, "member".into(), "group".into(), "".into())
            .await
            .expect("insert");

        for _ in 0..4 {
            registry.increment_video_count(7).await.expect("bump");
        }
        assert_eq!(get(&registry, 7).await.expect("record").videos_sent, 4);

        // Unknown id: no row affected, no error.
        registry.increment_video_count(999).await.expect("no-op");
        assert!(get(&registry, 999).await.is_none());
    }

    #[tokio::test]
    async fn empty_patch_is_a_no_op() {
        let dir = tempfile::tempdir().expect("tempdir");
        let registry = registry_at(&dir.path().join("channels.db"));

        registry
            .upsert(5, "B".into(), 20, "member".into(), "channel".into(), "x".into())
            .await
            .expect("insert");
        let before = get(&registry, 5).await.expect("record");

        registry
            .update_fields(5, ChatPatch::default())
            .await
            .expect("no-op");
        assert_eq!(get(&registry, 5).await.expect("record"), before);
    }

    #[tokio::test]
    async fn partial_update_touches_only_named_fields() {
        let dir = tempfile::tempdir().expect("tempdir");
        let registry = registry_at(&dir.path().join("channels.db"));

        registry
            .upsert(3, "Old".into(), 8, "member".into(), "group".into(), "".into())
            .await
            .expect("insert");
        registry
            .update_fields(
                3,
                ChatPatch {
                    title: Some("New".into()),
                    members: Some(80),
                    ..ChatPatch::default()
                },
            )
            .await
            .expect("patch");

        let record = get(&registry, 3).await.expect("record");
        assert_eq!(record.title, "New");
        assert_eq!(record.members, 80);
        assert_eq!(record.membership, "member");
        assert_eq!(record.chat_type, "group");
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let dir = tempfile::tempdir().expect("tempdir");
        let registry = registry_at(&dir.path().join("channels.db"));

        registry
            .upsert(2, "D".into(), 4, "member".into(), "group".into(), "".into())
            .await
            .expect("insert");
        registry.delete(2).await.expect("delete");
        registry.delete(2).await.expect("second delete");
        assert!(registry.list().await.expect("list").is_empty());
    }

    #[tokio::test]
    async fn list_order_is_deterministic() {
        let dir = tempfile::tempdir().expect("tempdir");
        let registry = registry_at(&dir.path().join("channels.db"));

        for id in [30, 10, 20] {
            registry
                .upsert(id, format!("chat {id}"), 1, "member".into(), "group".into(), "".into())
                .await
                .expect("insert");
        }

        // Same second of insertion, so ordering falls back to id.
        let first: Vec<i64> = registry.list().await.expect("list").iter().map(|r| r.id).collect();
        let second: Vec<i64> = registry.list().await.expect("list").iter().map(|r| r.id).collect();
        assert_eq!(first, second);
        assert_eq!(first, vec![10, 20, 30]);
    }
}

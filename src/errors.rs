use teloxide::types::ChatId;

/// Failure of the backing store (unreachable, busy, or a bad query).
///
/// Batch callers (broadcast, refresh, mass-leave) must treat a per-record
/// persistence failure as a miss and keep going; only startup treats these
/// as fatal.
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("query failed: {0}")]
    Query(#[from] rusqlite::Error),

    #[error("database operation timed out")]
    Timeout,

    #[error("database worker interrupted")]
    Interrupted,
}

/// Per-chat transport failure: send, probe or leave rejected by the
/// messaging platform (bot removed, chat gone, rate limited, network).
#[derive(Debug, thiserror::Error)]
#[error("delivery to {chat} failed: {source}")]
pub struct DeliveryError {
    pub chat: ChatId,
    #[source]
    pub source: teloxide::RequestError,
}

pub type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

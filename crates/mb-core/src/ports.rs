use async_trait::async_trait;

use crate::{domain::ChatId, Result};

/// Persistent set of chats subscribed to broadcasts.
///
/// Implementations report every failure as [`crate::Error::Storage`].
#[async_trait]
pub trait ChatRegistry: Send + Sync {
    /// Create the backing table if it does not exist. Idempotent.
    async fn ensure_schema(&self) -> Result<()>;

    /// Add `chat_id`. Registering a present id leaves the registry unchanged.
    async fn register(&self, chat_id: ChatId) -> Result<()>;

    /// Remove `chat_id`. Absent ids are not an error.
    async fn unregister(&self, chat_id: ChatId) -> Result<()>;

    /// Every registered id, in no particular order.
    async fn list_all(&self) -> Result<Vec<ChatId>>;
}

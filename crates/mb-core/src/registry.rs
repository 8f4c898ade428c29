use std::collections::BTreeSet;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::{domain::ChatId, ports::ChatRegistry, Result};

/// In-process registry, lost on restart. Used by tests and local runs.
#[derive(Debug, Default)]
pub struct MemoryChatRegistry {
    ids: Mutex<BTreeSet<ChatId>>,
}

impl MemoryChatRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_chats(ids: impl IntoIterator<Item = ChatId>) -> Self {
        Self {
            ids: Mutex::new(ids.into_iter().collect()),
        }
    }
}

#[async_trait]
impl ChatRegistry for MemoryChatRegistry {
    async fn ensure_schema(&self) -> Result<()> {
        Ok(())
    }

    async fn register(&self, chat_id: ChatId) -> Result<()> {
        self.ids.lock().await.insert(chat_id);
        Ok(())
    }

    async fn unregister(&self, chat_id: ChatId) -> Result<()> {
        self.ids.lock().await.remove(&chat_id);
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<ChatId>> {
        Ok(self.ids.lock().await.iter().copied().collect())
    }
}

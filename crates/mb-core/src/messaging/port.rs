use async_trait::async_trait;

use crate::{
    domain::{ChatId, ChatInfo},
    Result,
};

/// Outbound port to the chat platform.
///
/// Telegram is the only implementation. Errors surface as
/// [`crate::Error::Platform`] and are never retried by callers.
#[async_trait]
pub trait PlatformClient: Send + Sync {
    async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<()>;

    /// Fails when the chat is gone or the bot can no longer see it.
    async fn get_chat(&self, chat_id: ChatId) -> Result<ChatInfo>;
}

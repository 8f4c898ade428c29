//! Telegram adapter (teloxide).
//!
//! This crate implements the `mb-core` PlatformClient port over the Telegram
//! Bot API and hosts the webhook receiver that feeds the relay.

use async_trait::async_trait;
use reqwest::Url;
use teloxide::prelude::*;
use tracing::{info, warn};

pub mod convert;
pub mod webhook;

use mb_core::{
    domain::{BotIdentity, ChatId, ChatInfo, UserId},
    errors::Error,
    messaging::port::PlatformClient,
    Result,
};

#[derive(Clone)]
pub struct TelegramPlatform {
    bot: Bot,
}

impl TelegramPlatform {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }

    pub fn from_token(token: impl Into<String>) -> Self {
        Self::new(Bot::new(token))
    }

    fn tg_chat(chat_id: ChatId) -> teloxide::types::ChatId {
        teloxide::types::ChatId(chat_id.0)
    }

    fn map_err(e: teloxide::RequestError) -> Error {
        Error::Platform(format!("telegram error: {e}"))
    }

    /// Point Telegram at our public endpoint (`setWebhook`).
    pub async fn register_webhook(&self, url: Url, secret: Option<&str>) -> Result<()> {
        let mut req = self.bot.set_webhook(url.clone());
        if let Some(s) = secret {
            req = req.secret_token(s.to_string());
        }
        req.await.map_err(Self::map_err)?;
        info!(%url, "webhook registered");
        Ok(())
    }

    /// Resolve the bot's own identity via `getMe`.
    ///
    /// Best-effort: when the call fails only `display_name` is matched.
    pub async fn identity(&self, display_name: &str) -> BotIdentity {
        let identity = BotIdentity::by_name(display_name);
        match self.bot.get_me().await {
            Ok(me) => {
                info!(
                    bot_id = me.user.id.0,
                    username = %me.username(),
                    "resolved bot identity"
                );
                if me.user.first_name != display_name {
                    warn!(
                        first_name = %me.user.first_name,
                        expected = %display_name,
                        "bot first name differs from configured display name"
                    );
                }
                identity.with_id(UserId(me.user.id.0 as i64))
            }
            Err(e) => {
                warn!(error = %e, "getMe failed, matching by display name only");
                identity
            }
        }
    }
}

#[async_trait]
impl PlatformClient for TelegramPlatform {
    async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<()> {
        self.bot
            .send_message(Self::tg_chat(chat_id), text.to_string())
            .await
            .map_err(Self::map_err)?;
        Ok(())
    }

    async fn get_chat(&self, chat_id: ChatId) -> Result<ChatInfo> {
        let chat = self
            .bot
            .get_chat(Self::tg_chat(chat_id))
            .await
            .map_err(Self::map_err)?;
        Ok(ChatInfo {
            id: ChatId(chat.id.0),
            title: chat.title().map(str::to_string),
        })
    }
}

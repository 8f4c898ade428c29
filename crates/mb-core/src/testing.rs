//! Recording fakes for the ports.

use std::{collections::HashSet, sync::Mutex};

use async_trait::async_trait;

use crate::{
    domain::{ChatId, ChatInfo},
    errors::Error,
    messaging::port::PlatformClient,
    ports::ChatRegistry,
    Result,
};

#[derive(Default)]
pub struct FakePlatform {
    pub sends: Mutex<Vec<(ChatId, String)>>,
    pub lookups: Mutex<Vec<ChatId>>,
    failing_sends: HashSet<ChatId>,
    missing_chats: HashSet<ChatId>,
}

impl FakePlatform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_sends_to(mut self, ids: impl IntoIterator<Item = i64>) -> Self {
        self.failing_sends = ids.into_iter().map(ChatId).collect();
        self
    }

    pub fn missing_chats(mut self, ids: impl IntoIterator<Item = i64>) -> Self {
        self.missing_chats = ids.into_iter().map(ChatId).collect();
        self
    }

    pub fn sent(&self) -> Vec<(ChatId, String)> {
        self.sends.lock().unwrap().clone()
    }
}

#[async_trait]
impl PlatformClient for FakePlatform {
    async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<()> {
        self.sends.lock().unwrap().push((chat_id, text.to_string()));
        if self.failing_sends.contains(&chat_id) {
            return Err(Error::Platform(format!("bot was kicked from {chat_id}")));
        }
        Ok(())
    }

    async fn get_chat(&self, chat_id: ChatId) -> Result<ChatInfo> {
        self.lookups.lock().unwrap().push(chat_id);
        if self.missing_chats.contains(&chat_id) {
            return Err(Error::Platform("chat not found".to_string()));
        }
        Ok(ChatInfo {
            id: chat_id,
            title: None,
        })
    }
}

/// Registry whose every call fails, as if the database were unreachable.
#[derive(Default)]
pub struct BrokenRegistry;

#[async_trait]
impl ChatRegistry for BrokenRegistry {
    async fn ensure_schema(&self) -> Result<()> {
        Err(Error::Storage("connection refused".to_string()))
    }

    async fn register(&self, _chat_id: ChatId) -> Result<()> {
        Err(Error::Storage("connection refused".to_string()))
    }

    async fn unregister(&self, _chat_id: ChatId) -> Result<()> {
        Err(Error::Storage("connection refused".to_string()))
    }

    async fn list_all(&self) -> Result<Vec<ChatId>> {
        Err(Error::Storage("connection refused".to_string()))
    }
}

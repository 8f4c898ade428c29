//! PostgreSQL adapter (sqlx).
//!
//! This crate implements the `mb-core` ChatRegistry port over a single
//! `ChatIDs` table.

use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, PgPool};
use tracing::debug;

use mb_core::{domain::ChatId, errors::Error, ports::ChatRegistry, Result};

const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS ChatIDs (id BIGSERIAL PRIMARY KEY)";
const INSERT_CHAT: &str = "INSERT INTO ChatIDs (id) VALUES ($1) ON CONFLICT (id) DO NOTHING";
const DELETE_CHAT: &str = "DELETE FROM ChatIDs WHERE id = $1";
const SELECT_CHATS: &str = "SELECT id FROM ChatIDs";

#[derive(Clone)]
pub struct PgChatRegistry {
    pool: PgPool,
}

impl PgChatRegistry {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open a pool against `database_url`.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(|e| Self::map_err("connect", e))?;
        Ok(Self::new(pool))
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    fn map_err(op: &str, e: sqlx::Error) -> Error {
        Error::Storage(format!("{op} failed: {e}"))
    }
}

#[async_trait]
impl ChatRegistry for PgChatRegistry {
    async fn ensure_schema(&self) -> Result<()> {
        sqlx::query(CREATE_TABLE)
            .execute(&self.pool)
            .await
            .map_err(|e| Self::map_err("create table", e))?;
        Ok(())
    }

    async fn register(&self, chat_id: ChatId) -> Result<()> {
        let res = sqlx::query(INSERT_CHAT)
            .bind(chat_id.0)
            .execute(&self.pool)
            .await
            .map_err(|e| Self::map_err("insert", e))?;
        debug!(chat_id = chat_id.0, inserted = res.rows_affected(), "register");
        Ok(())
    }

    async fn unregister(&self, chat_id: ChatId) -> Result<()> {
        let res = sqlx::query(DELETE_CHAT)
            .bind(chat_id.0)
            .execute(&self.pool)
            .await
            .map_err(|e| Self::map_err("delete", e))?;
        debug!(chat_id = chat_id.0, deleted = res.rows_affected(), "unregister");
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<ChatId>> {
        let ids: Vec<i64> = sqlx::query_scalar(SELECT_CHATS)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| Self::map_err("select", e))?;
        Ok(ids.into_iter().map(ChatId).collect())
    }
}

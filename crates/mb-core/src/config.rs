use std::env;

use reqwest::Url;

use crate::{domain::DEFAULT_BOT_DISPLAY_NAME, errors::Error, Result};

const DEFAULT_DATABASE_MAX_CONNECTIONS: u32 = 5;

/// Typed configuration, read once at startup.
#[derive(Clone, Debug)]
pub struct Config {
    // Required
    pub database_url: String,
    pub bot_token: String,
    pub webhook_url: Url,
    pub port: u16,

    // Webhook
    pub webhook_secret: Option<String>,

    // Relay behavior
    pub admin_user_ids: Vec<i64>,
    pub bot_display_name: String,

    // Storage
    pub database_max_connections: u32,
}

impl Config {
    /// Load from the process environment, after applying `.env` if present.
    ///
    /// Values already set in the environment win over `.env`.
    pub fn load() -> Result<Self> {
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                return Err(Error::Config(format!("failed to read .env: {e}")));
            }
        }
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Empty values count as missing.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).and_then(non_empty);
        let require = |key: &str| {
            get(key).ok_or_else(|| {
                Error::Config(format!("{key} environment variable is required"))
            })
        };

        let database_url = require("DATABASE_URL")?;
        let bot_token = require("BOT_TOKEN")?;

        let raw_webhook_url = require("WEBHOOK_URL")?;
        let webhook_url = Url::parse(raw_webhook_url.trim())
            .map_err(|e| Error::Config(format!("WEBHOOK_URL is not a valid URL: {e}")))?;

        let raw_port = require("PORT")?;
        let port = raw_port
            .trim()
            .parse::<u16>()
            .map_err(|_| Error::Config(format!("PORT is not a valid port: {raw_port}")))?;

        let webhook_secret = get("WEBHOOK_SECRET").map(|s| s.trim().to_string());
        let admin_user_ids = parse_csv_i64(get("ADMIN_USER_IDS"))?;
        let bot_display_name =
            get("BOT_DISPLAY_NAME").unwrap_or_else(|| DEFAULT_BOT_DISPLAY_NAME.to_string());

        let database_max_connections = match get("DATABASE_MAX_CONNECTIONS") {
            Some(v) => v.trim().parse::<u32>().ok().filter(|n| *n > 0).ok_or_else(|| {
                Error::Config(format!("DATABASE_MAX_CONNECTIONS is not a positive integer: {v}"))
            })?,
            None => DEFAULT_DATABASE_MAX_CONNECTIONS,
        };

        Ok(Self {
            database_url,
            bot_token,
            webhook_url,
            port,
            webhook_secret,
            admin_user_ids,
            bot_display_name,
            database_max_connections,
        })
    }
}

fn parse_csv_i64(v: Option<String>) -> Result<Vec<i64>> {
    v.unwrap_or_default()
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<i64>()
                .map_err(|_| Error::Config(format!("ADMIN_USER_IDS has an invalid id: {s}")))
        })
        .collect()
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}

//! Environment-driven configuration
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0
//!
//! ## Changelog
//! - 1.0.0: Platform selection, credentials, data directory and poll interval

use anyhow::{anyhow, bail, Result};
use std::path::PathBuf;
use std::time::Duration;

/// Default scheduler poll interval in seconds
pub const DEFAULT_POLL_SECONDS: u64 = 30;

/// Messaging platform the bot connects to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Discord,
    Slack,
}

impl Platform {
    pub fn parse(value: &str) -> Result<Self> {
        match value.trim().to_lowercase().as_str() {
            "discord" => Ok(Platform::Discord),
            "slack" => Ok(Platform::Slack),
            other => Err(anyhow!(
                "Unsupported CHAT_PLATFORM '{other}' (expected 'discord' or 'slack')"
            )),
        }
    }
}

/// Platform credentials, validated once at startup
#[derive(Debug, Clone)]
pub enum Credentials {
    Discord {
        token: String,
    },
    Slack {
        bot_token: String,
        /// Socket Mode token; only the long-running bot needs it
        app_token: Option<String>,
    },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub platform: Platform,
    pub credentials: Credentials,
    pub data_dir: PathBuf,
    pub poll_interval: Duration,
    pub log_level: String,
}

impl Config {
    /// Load configuration from the process environment.
    ///
    /// `.env` is read first unless running under GitHub Actions, where only the
    /// real environment is trusted.
    pub fn from_env() -> Result<Self> {
        if std::env::var("GITHUB_ACTIONS").as_deref() != Ok("true") {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let platform = match get("CHAT_PLATFORM") {
            Some(value) => Platform::parse(&value)?,
            None => Platform::Discord,
        };

        let credentials = match platform {
            Platform::Discord => Credentials::Discord {
                token: get("DISCORD_TOKEN")
                    .ok_or_else(|| anyhow!("DISCORD_TOKEN is not set"))?,
            },
            Platform::Slack => Credentials::Slack {
                bot_token: get("SLACK_BOT_TOKEN")
                    .ok_or_else(|| anyhow!("SLACK_BOT_TOKEN is not set"))?,
                app_token: get("APP_LEVEL_TOKEN").or_else(|| get("SLACK_APP_TOKEN")),
            },
        };

        let poll_seconds = match get("DAILY_POST_POLL_SECONDS") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .map_err(|e| anyhow!("Invalid DAILY_POST_POLL_SECONDS '{raw}': {e}"))?,
            None => DEFAULT_POLL_SECONDS,
        };
        // Must stay under the one-minute matching window
        if !(1..60).contains(&poll_seconds) {
            bail!("DAILY_POST_POLL_SECONDS must be between 1 and 59, got {poll_seconds}");
        }

        Ok(Config {
            platform,
            credentials,
            data_dir: PathBuf::from(get("DAILY_POST_DATA_DIR").unwrap_or_else(|| ".".to_string())),
            poll_interval: Duration::from_secs(poll_seconds),
            log_level: get("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        })
    }

    /// The Socket Mode token, required only when receiving events from Slack
    pub fn require_slack_app_token(&self) -> Result<&str> {
        match &self.credentials {
            Credentials::Slack {
                app_token: Some(token),
                ..
            } => Ok(token),
            Credentials::Slack { app_token: None, .. } => {
                Err(anyhow!("APP_LEVEL_TOKEN is not set"))
            }
            Credentials::Discord { .. } => Err(anyhow!("Not configured for Slack")),
        }
    }
}

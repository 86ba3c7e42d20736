//! # Platform Layer
//!
//! The messaging-platform capabilities the bot depends on, and the concrete
//! Discord and Slack transports that provide them.
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.0.0: ChatClient trait with Discord (serenity) and Slack (Socket Mode) transports

pub mod discord;
pub mod slack;

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

use crate::core::Credentials;

pub use discord::{DiscordClient, DiscordGateway};
pub use slack::{SlackClient, SlackSocketMode};

/// A channel as listed by the platform directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryChannel {
    pub id: String,
    pub name: String,
}

/// Who the credentials authenticate as
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotIdentity {
    pub user_id: String,
    pub user_name: String,
    /// Workspace or server name when the platform reports one
    pub team: Option<String>,
}

/// A chat message delivered by a transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundEvent {
    pub channel_id: String,
    pub text: String,
    /// Authored by a bot account (including this one)
    pub from_bot: bool,
}

/// Outbound capabilities of a messaging platform
#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Post a text message to a channel
    async fn post_message(&self, channel_id: &str, text: &str) -> Result<()>;

    /// List channels visible to the bot (a single bounded page)
    async fn list_channels(&self) -> Result<Vec<DirectoryChannel>>;

    /// Resolve the identity behind the configured credentials
    async fn identity(&self) -> Result<BotIdentity>;
}

/// Build the REST client for the configured platform
pub fn client_for(credentials: &Credentials) -> Arc<dyn ChatClient> {
    match credentials {
        Credentials::Discord { token } => Arc::new(DiscordClient::new(token)),
        Credentials::Slack { bot_token, .. } => Arc::new(SlackClient::new(bot_token.clone())),
    }
}

//! Discord transport (serenity gateway + REST)
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0
//!
//! ## Changelog
//! - 1.0.0: ChatClient over serenity Http, gateway handler forwarding messages

use anyhow::{anyhow, Context as _, Result};
use log::{error, info};
use serenity::async_trait;
use serenity::http::Http;
use serenity::model::channel::{ChannelType, Message};
use serenity::model::gateway::Ready;
use serenity::model::id::ChannelId;
use serenity::prelude::*;
use std::sync::Arc;

use super::{BotIdentity, ChatClient, DirectoryChannel, InboundEvent};
use crate::commands::InboundEventHandler;
use crate::core::{chunk_text, DISCORD_MESSAGE_LIMIT};

/// Guilds fetched per directory lookup (one page)
pub const GUILD_PAGE_SIZE: u64 = 100;

/// Discord REST client
#[derive(Clone)]
pub struct DiscordClient {
    http: Arc<Http>,
}

impl DiscordClient {
    pub fn new(token: &str) -> Self {
        DiscordClient {
            http: Arc::new(Http::new(token)),
        }
    }

    fn parse_channel_id(channel_id: &str) -> Result<ChannelId> {
        channel_id
            .parse::<u64>()
            .map(ChannelId)
            .map_err(|_| anyhow!("Invalid Discord channel ID '{channel_id}'"))
    }
}

#[async_trait]
impl ChatClient for DiscordClient {
    async fn post_message(&self, channel_id: &str, text: &str) -> Result<()> {
        let channel = Self::parse_channel_id(channel_id)?;
        for chunk in chunk_text(text, DISCORD_MESSAGE_LIMIT) {
            channel
                .say(&self.http, &chunk)
                .await
                .with_context(|| format!("Failed to send message to channel {channel_id}"))?;
        }
        Ok(())
    }

    async fn list_channels(&self) -> Result<Vec<DirectoryChannel>> {
        let guilds = self
            .http
            .get_guilds(None, Some(GUILD_PAGE_SIZE))
            .await
            .context("Failed to list guilds")?;

        let mut directory = Vec::new();
        for guild in guilds {
            let channels = guild
                .id
                .channels(&self.http)
                .await
                .with_context(|| format!("Failed to list channels of guild {}", guild.id))?;

            let mut text_channels: Vec<_> = channels
                .into_values()
                .filter(|c| matches!(c.kind, ChannelType::Text | ChannelType::News))
                .collect();
            // HashMap order is arbitrary; sidebar order keeps "first match" stable
            text_channels.sort_by_key(|c| (c.position, c.id.0));

            directory.extend(text_channels.into_iter().map(|c| DirectoryChannel {
                id: c.id.to_string(),
                name: c.name,
            }));
        }
        Ok(directory)
    }

    async fn identity(&self) -> Result<BotIdentity> {
        let user = self
            .http
            .get_current_user()
            .await
            .context("Discord rejected the bot token")?;
        Ok(BotIdentity {
            user_id: user.id.to_string(),
            user_name: user.name,
            team: None,
        })
    }
}

struct Handler {
    inbound: Arc<dyn InboundEventHandler>,
}

#[async_trait]
impl EventHandler for Handler {
    async fn message(&self, _ctx: Context, msg: Message) {
        let event = InboundEvent {
            channel_id: msg.channel_id.to_string(),
            text: msg.content,
            from_bot: msg.author.bot,
        };
        self.inbound.on_event(event).await;
    }

    async fn ready(&self, _ctx: Context, ready: Ready) {
        info!("🎉 {} is connected and ready!", ready.user.name);
        info!("📡 Connected to {} guilds", ready.guilds.len());
        info!("🤖 Bot ID: {}", ready.user.id);
    }
}

/// Gateway connection delivering messages to an [`InboundEventHandler`]
pub struct DiscordGateway {
    token: String,
    inbound: Arc<dyn InboundEventHandler>,
}

impl DiscordGateway {
    pub fn new(token: impl Into<String>, inbound: Arc<dyn InboundEventHandler>) -> Self {
        DiscordGateway {
            token: token.into(),
            inbound,
        }
    }

    /// Connect and process events until the gateway closes
    pub async fn run(self) -> Result<()> {
        let intents = GatewayIntents::GUILDS
            | GatewayIntents::GUILD_MESSAGES
            | GatewayIntents::MESSAGE_CONTENT;

        let mut client = Client::builder(&self.token, intents)
            .event_handler(Handler {
                inbound: self.inbound,
            })
            .await
            .map_err(|e| {
                error!("Failed to create Discord client: {e}");
                anyhow!("Client creation failed: {}", e)
            })?;

        info!("Establishing WebSocket connection to Discord gateway...");
        info!("Gateway intents: {intents:?}");

        if let Err(why) = client.start().await {
            error!("Gateway connection failed: {why:?}");
            return Err(anyhow!("Failed to establish gateway connection: {}", why));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_channel_id() {
        assert_eq!(
            DiscordClient::parse_channel_id("123456789012345678").unwrap(),
            ChannelId(123456789012345678)
        );
        assert!(DiscordClient::parse_channel_id("C12345").is_err());
        assert!(DiscordClient::parse_channel_id("").is_err());
    }
}

//! Slack transport (Socket Mode events + Web API)
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0
//!
//! ## Changelog
//! - 1.0.0: chat.postMessage, conversations.list, auth.test and a reconnecting
//!   Socket Mode loop that acknowledges every envelope

use anyhow::{anyhow, bail, Context as _, Result};
use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use log::{debug, info, warn};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio_tungstenite::tungstenite::Message as WsMessage;

use super::{BotIdentity, ChatClient, DirectoryChannel, InboundEvent};
use crate::commands::InboundEventHandler;
use crate::core::{chunk_text, SLACK_MESSAGE_LIMIT};

const SLACK_API_BASE: &str = "https://slack.com/api";

/// Channels fetched per directory lookup (one page)
pub const CONVERSATIONS_PAGE_SIZE: u32 = 1000;

/// Reject a Web API response whose `ok` flag is not true
fn check_ok(method: &str, body: Value) -> Result<Value> {
    if body.get("ok").and_then(Value::as_bool) != Some(true) {
        let error = body
            .get("error")
            .and_then(Value::as_str)
            .unwrap_or("unknown");
        bail!("Slack API {method} failed: {error}");
    }
    Ok(body)
}

/// Channels the bot has joined. `conversations.list` also returns public
/// channels the bot is not in, and posting there fails with `not_in_channel`.
fn parse_channel_list(body: &Value) -> Vec<DirectoryChannel> {
    body.get("channels")
        .and_then(Value::as_array)
        .map(|channels| {
            channels
                .iter()
                .filter(|c| c.get("is_member").and_then(Value::as_bool) == Some(true))
                .filter_map(|c| {
                    Some(DirectoryChannel {
                        id: c.get("id")?.as_str()?.to_string(),
                        name: c.get("name")?.as_str()?.to_string(),
                    })
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Slack Web API client authenticated with the bot token
#[derive(Clone)]
pub struct SlackClient {
    http: reqwest::Client,
    bot_token: String,
}

impl SlackClient {
    pub fn new(bot_token: impl Into<String>) -> Self {
        SlackClient {
            http: reqwest::Client::new(),
            bot_token: bot_token.into(),
        }
    }

    fn url(method: &str) -> String {
        format!("{SLACK_API_BASE}/{method}")
    }

    async fn api_post(&self, method: &str, body: &Value) -> Result<Value> {
        let resp = self
            .http
            .post(Self::url(method))
            .bearer_auth(&self.bot_token)
            .json(body)
            .send()
            .await
            .with_context(|| format!("Slack API {method} request failed"))?;
        check_ok(method, resp.json().await?)
    }

    async fn api_get(&self, method: &str, query: &[(&str, String)]) -> Result<Value> {
        let resp = self
            .http
            .get(Self::url(method))
            .bearer_auth(&self.bot_token)
            .query(query)
            .send()
            .await
            .with_context(|| format!("Slack API {method} request failed"))?;
        check_ok(method, resp.json().await?)
    }
}

#[async_trait]
impl ChatClient for SlackClient {
    async fn post_message(&self, channel_id: &str, text: &str) -> Result<()> {
        for chunk in chunk_text(text, SLACK_MESSAGE_LIMIT) {
            self.api_post(
                "chat.postMessage",
                &json!({ "channel": channel_id, "text": chunk }),
            )
            .await?;
        }
        Ok(())
    }

    async fn list_channels(&self) -> Result<Vec<DirectoryChannel>> {
        let body = self
            .api_get(
                "conversations.list",
                &[
                    ("types", "public_channel,private_channel".to_string()),
                    ("exclude_archived", "true".to_string()),
                    ("limit", CONVERSATIONS_PAGE_SIZE.to_string()),
                ],
            )
            .await?;

        let has_more = body
            .pointer("/response_metadata/next_cursor")
            .and_then(Value::as_str)
            .is_some_and(|cursor| !cursor.is_empty());
        if has_more {
            warn!("conversations.list has more than one page; only the first {CONVERSATIONS_PAGE_SIZE} channels are searched");
        }

        Ok(parse_channel_list(&body))
    }

    async fn identity(&self) -> Result<BotIdentity> {
        let body = self.api_post("auth.test", &json!({})).await?;
        let field = |key: &str| body.get(key).and_then(Value::as_str).map(str::to_string);
        Ok(BotIdentity {
            user_id: field("user_id").unwrap_or_default(),
            user_name: field("user").unwrap_or_default(),
            team: field("team"),
        })
    }
}

/// Extract a chat message from a Socket Mode envelope.
///
/// Only plain `message` events qualify; edits, joins and other subtypes are
/// skipped.
pub fn event_from_envelope(envelope: &Value) -> Option<InboundEvent> {
    if envelope.get("type")?.as_str()? != "events_api" {
        return None;
    }
    let event = envelope.pointer("/payload/event")?;
    if event.get("type")?.as_str()? != "message" || event.get("subtype").is_some() {
        return None;
    }

    Some(InboundEvent {
        channel_id: event.get("channel")?.as_str()?.to_string(),
        text: event
            .get("text")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        from_bot: event.get("bot_id").is_some(),
    })
}

/// Socket Mode connection delivering messages to an [`InboundEventHandler`]
pub struct SlackSocketMode {
    http: reqwest::Client,
    app_token: String,
    inbound: Arc<dyn InboundEventHandler>,
}

impl SlackSocketMode {
    pub fn new(app_token: impl Into<String>, inbound: Arc<dyn InboundEventHandler>) -> Self {
        SlackSocketMode {
            http: reqwest::Client::new(),
            app_token: app_token.into(),
            inbound,
        }
    }

    /// Keep a Socket Mode connection open, reconnecting with backoff
    pub async fn run_with_retry(self: Arc<Self>) {
        let initial_backoff = Duration::from_secs(5);
        let max_backoff = Duration::from_secs(60);
        let stable_threshold = Duration::from_secs(60);
        let mut backoff = initial_backoff;

        loop {
            info!("Starting Slack Socket Mode client");
            let started = tokio::time::Instant::now();
            if let Err(e) = self.clone().run().await {
                warn!("Slack client error: {e:#}");
            }
            if started.elapsed() >= stable_threshold {
                backoff = initial_backoff;
            }

            warn!(
                "Slack connection closed after {}s, reconnecting in {}s",
                started.elapsed().as_secs(),
                backoff.as_secs()
            );
            tokio::time::sleep(backoff).await;
            backoff = std::cmp::min(backoff * 2, max_backoff);
        }
    }

    /// One connection lifetime: open, read envelopes, return when closed
    async fn run(self: Arc<Self>) -> Result<()> {
        let wss_url = self.open_connection().await?;
        let (ws_stream, _) = tokio_tungstenite::connect_async(wss_url.as_str())
            .await
            .map_err(|e| anyhow!("WebSocket connect failed: {}", e))?;
        info!("🔗 Slack Socket Mode connected");

        let (mut ws_tx, mut ws_rx) = ws_stream.split();

        while let Some(frame) = ws_rx.next().await {
            let frame = match frame {
                Ok(frame) => frame,
                Err(e) => {
                    warn!("WebSocket read error: {e}");
                    break;
                }
            };

            match frame {
                WsMessage::Text(text) => {
                    let envelope: Value = match serde_json::from_str(&text) {
                        Ok(v) => v,
                        Err(e) => {
                            warn!("Failed to parse Slack envelope: {e}");
                            continue;
                        }
                    };

                    if let Some(envelope_id) = envelope.get("envelope_id").and_then(Value::as_str)
                    {
                        let ack = json!({ "envelope_id": envelope_id });
                        if let Err(e) = ws_tx.send(WsMessage::Text(ack.to_string())).await {
                            warn!("Failed to ack envelope {envelope_id}: {e}");
                        }
                    }

                    match envelope.get("type").and_then(Value::as_str) {
                        Some("hello") => info!("Slack Socket Mode hello received"),
                        Some("disconnect") => {
                            let reason = envelope
                                .get("reason")
                                .and_then(Value::as_str)
                                .unwrap_or("unknown");
                            info!("Slack requested disconnect ({reason})");
                            break;
                        }
                        _ => {
                            // Handled inline so commands apply in arrival order
                            if let Some(event) = event_from_envelope(&envelope) {
                                self.inbound.on_event(event).await;
                            } else {
                                debug!("Ignoring Slack envelope: {}", envelope["type"]);
                            }
                        }
                    }
                }
                WsMessage::Ping(data) => {
                    let _ = ws_tx.send(WsMessage::Pong(data)).await;
                }
                WsMessage::Close(_) => {
                    info!("Slack WebSocket closed by server");
                    break;
                }
                _ => {}
            }
        }

        Ok(())
    }

    /// Call `apps.connections.open` to get a WebSocket URL
    async fn open_connection(&self) -> Result<String> {
        let resp = self
            .http
            .post(format!("{SLACK_API_BASE}/apps.connections.open"))
            .bearer_auth(&self.app_token)
            .header("Content-Type", "application/x-www-form-urlencoded")
            .send()
            .await
            .context("apps.connections.open request failed")?;

        let body = check_ok("apps.connections.open", resp.json().await?)?;
        body.get("url")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| anyhow!("No URL in apps.connections.open response"))
    }
}

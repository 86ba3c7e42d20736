//! The single entry point transports call for inbound chat messages
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0
//!
//! ## Changelog
//! - 1.0.0: Initial implementation

use async_trait::async_trait;
use log::{debug, error, info};
use std::sync::Arc;
use uuid::Uuid;

use super::daily_post::CommandInterpreter;
use crate::platform::{ChatClient, InboundEvent};

/// Trait implemented by whatever consumes inbound chat events.
///
/// Transports own the connection; they convert each platform message into an
/// [`InboundEvent`] and hand it over here.
///
/// # Example
///
/// ```ignore
/// let handled = bot.on_event(InboundEvent {
///     channel_id: "C12345".to_string(),
///     text: "!毎日投稿停止".to_string(),
///     from_bot: false,
/// }).await;
/// ```
#[async_trait]
pub trait InboundEventHandler: Send + Sync {
    /// Process one event. Returns whether it was a command for this bot.
    async fn on_event(&self, event: InboundEvent) -> bool;
}

/// Command interpreter wired to the platform for replies
pub struct DailyPostBot {
    interpreter: CommandInterpreter,
    client: Arc<dyn ChatClient>,
}

impl DailyPostBot {
    pub fn new(interpreter: CommandInterpreter, client: Arc<dyn ChatClient>) -> Self {
        DailyPostBot {
            interpreter,
            client,
        }
    }
}

#[async_trait]
impl InboundEventHandler for DailyPostBot {
    async fn on_event(&self, event: InboundEvent) -> bool {
        if event.from_bot {
            return false;
        }

        let request_id = Uuid::new_v4();
        debug!(
            "[{request_id}] 📥 Message received | Channel: {} | Content: '{}'",
            event.channel_id,
            event.text.chars().take(100).collect::<String>()
        );

        let Some(reply) = self.interpreter.interpret(&event.text, request_id).await else {
            return false;
        };

        if let Err(e) = self.client.post_message(&event.channel_id, &reply).await {
            error!(
                "[{request_id}] Failed to send reply to {}: {e:#}",
                event.channel_id
            );
        } else {
            info!("[{request_id}] ✅ Reply sent to {}", event.channel_id);
        }
        true
    }
}

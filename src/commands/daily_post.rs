//! Daily post chat commands
//!
//! Handles: `!毎日投稿停止`, `!毎日投稿設定`, `!毎日投稿内容`
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0
//!
//! ## Changelog
//! - 1.0.0: Two-step setup dialog with validation and stop

use anyhow::Result;
use chrono::NaiveTime;
use log::{error, info};
use uuid::Uuid;

use crate::features::daily_post::messages::{
    self, CONFIGURE_COMMAND, CONTENT_COMMAND, STOP_COMMAND,
};
use crate::features::daily_post::scheduler::TIME_FORMAT;
use crate::features::daily_post::{
    ChannelReference, ChannelResolver, PendingSetup, Rejection, StateStore,
};

/// A recognised command with its unparsed arguments
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command<'a> {
    Stop,
    Configure(&'a str),
    SetContent(&'a str),
}

impl<'a> Command<'a> {
    /// Recognise a command. Ordinary chat yields `None`.
    ///
    /// The command must open the message. A prefix only matches when followed
    /// by whitespace or the end of the text, so longer words that merely start
    /// with a command are ignored.
    pub fn parse(text: &'a str) -> Option<Self> {
        if strip_command(text, STOP_COMMAND).is_some() {
            return Some(Command::Stop);
        }
        if let Some(rest) = strip_command(text, CONFIGURE_COMMAND) {
            return Some(Command::Configure(rest));
        }
        strip_command(text, CONTENT_COMMAND).map(Command::SetContent)
    }
}

fn strip_command<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    let rest = text.strip_prefix(prefix)?;
    if rest.is_empty() || rest.starts_with(char::is_whitespace) {
        Some(rest)
    } else {
        None
    }
}

/// Normalise a user-supplied time to zero-padded `HH:MM`
pub fn normalize_time(raw: &str) -> Option<String> {
    NaiveTime::parse_from_str(raw, "%H:%M")
        .ok()
        .map(|time| time.format(TIME_FORMAT).to_string())
}

type Outcome = std::result::Result<String, Rejection>;

/// Runs the setup dialog against the store
#[derive(Clone)]
pub struct CommandInterpreter {
    store: StateStore,
    resolver: ChannelResolver,
}

impl CommandInterpreter {
    pub fn new(store: StateStore, resolver: ChannelResolver) -> Self {
        CommandInterpreter { store, resolver }
    }

    /// Interpret a chat message and return the reply, if any.
    ///
    /// Never fails: store or lookup errors are logged and answered with a
    /// generic failure message.
    pub async fn interpret(&self, text: &str, request_id: Uuid) -> Option<String> {
        let command = Command::parse(text)?;
        info!("[{request_id}] 🎯 Processing daily post command: {command:?}");

        let reply = match self.execute(command).await {
            Ok(Ok(reply)) => reply,
            Ok(Err(rejection)) => {
                info!("[{request_id}] Command rejected: {rejection:?}");
                rejection.reply()
            }
            Err(e) => {
                error!("[{request_id}] ❌ Daily post command failed: {e:#}");
                messages::GENERIC_FAILURE.to_string()
            }
        };
        Some(reply)
    }

    async fn execute(&self, command: Command<'_>) -> Result<Outcome> {
        match command {
            Command::Stop => self.stop().await,
            Command::Configure(args) => self.configure(args).await,
            Command::SetContent(body) => self.set_content(body).await,
        }
    }

    async fn stop(&self) -> Result<Outcome> {
        self.store.clear_all().await?;
        info!("Daily post stopped and configuration cleared");
        Ok(Ok(messages::STOPPED.to_string()))
    }

    async fn configure(&self, args: &str) -> Result<Outcome> {
        let mut parts = args.trim().splitn(2, char::is_whitespace);
        let time_arg = parts.next().filter(|s| !s.is_empty());
        let channel_arg = parts.next().map(str::trim).filter(|s| !s.is_empty());
        let (Some(time_arg), Some(channel_arg)) = (time_arg, channel_arg) else {
            return Ok(Err(Rejection::Usage));
        };

        let Some(time_of_day) = normalize_time(time_arg) else {
            return Ok(Err(Rejection::InvalidTime(time_arg.to_string())));
        };
        let Some(reference) = ChannelReference::parse(channel_arg) else {
            return Ok(Err(Rejection::ChannelFormat(channel_arg.to_string())));
        };
        let Some(channel_id) = self.resolver.resolve(&reference).await else {
            return Ok(Err(Rejection::ChannelNotFound(channel_arg.to_string())));
        };

        self.store
            .save_pending(&PendingSetup {
                time_of_day: time_of_day.clone(),
                channel_id: channel_id.clone(),
            })
            .await?;
        info!("Pending daily post saved: {time_of_day} -> {channel_id}");
        Ok(Ok(messages::CONFIGURE_ACCEPTED.to_string()))
    }

    async fn set_content(&self, body: &str) -> Result<Outcome> {
        if self.store.load_pending().await?.is_none() {
            return Ok(Err(Rejection::OutOfOrder));
        }

        let message = body.trim();
        if message.is_empty() {
            return Ok(Err(Rejection::EmptyContent));
        }

        let Some(config) = self.store.activate_pending(message).await? else {
            // Stopped between the check and the promotion
            return Ok(Err(Rejection::OutOfOrder));
        };
        info!(
            "Daily post activated: {} -> {} ({} chars)",
            config.time_of_day,
            config.channel_id,
            config.message.chars().count()
        );
        Ok(Ok(messages::activated(
            &config.time_of_day,
            &config.channel_id,
            &config.message,
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::daily_post::store::{ActiveConfig, PENDING_FILE};
    use crate::platform::testing::FakeChatClient;
    use std::sync::Arc;
    use tempfile::TempDir;

    struct Fixture {
        dir: TempDir,
        store: StateStore,
        client: Arc<FakeChatClient>,
        interpreter: CommandInterpreter,
    }

    fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::new(dir.path());
        let client = Arc::new(FakeChatClient::with_directory(&[
            ("C100", "general"),
            ("C200", "announcements"),
        ]));
        let interpreter =
            CommandInterpreter::new(store.clone(), ChannelResolver::new(client.clone()));
        Fixture {
            dir,
            store,
            client,
            interpreter,
        }
    }

    async fn send(fx: &Fixture, text: &str) -> Option<String> {
        fx.interpreter.interpret(text, Uuid::new_v4()).await
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(Command::parse("!毎日投稿停止"), Some(Command::Stop));
        assert_eq!(
            Command::parse("!毎日投稿設定 09:00 #general"),
            Some(Command::Configure(" 09:00 #general"))
        );
        assert_eq!(
            Command::parse("!毎日投稿内容 おはよう"),
            Some(Command::SetContent(" おはよう"))
        );
        assert_eq!(
            Command::parse("!毎日投稿内容\nline1\nline2"),
            Some(Command::SetContent("\nline1\nline2"))
        );
    }

    #[test]
    fn test_parse_ignores_ordinary_chat() {
        assert_eq!(Command::parse("おはようございます"), None);
        assert_eq!(Command::parse(""), None);
        assert_eq!(Command::parse("!毎日投稿設定変更 09:00 #general"), None);
        assert_eq!(Command::parse("please run !毎日投稿停止"), None);
        assert_eq!(Command::parse("  !毎日投稿停止"), None);
        assert_eq!(Command::parse("\n!毎日投稿設定 09:00 #general"), None);
    }

    #[test]
    fn test_normalize_time() {
        assert_eq!(normalize_time("09:00"), Some("09:00".to_string()));
        assert_eq!(normalize_time("9:05"), Some("09:05".to_string()));
        assert_eq!(normalize_time("23:59"), Some("23:59".to_string()));
        assert_eq!(normalize_time("24:00"), None);
        assert_eq!(normalize_time("09:60"), None);
        assert_eq!(normalize_time("morning"), None);
    }

    #[tokio::test]
    async fn test_unrecognised_text_is_silent() {
        let fx = fixture();
        assert_eq!(send(&fx, "今日はいい天気ですね").await, None);
        assert!(fx.store.load_pending().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_indented_stop_is_ordinary_chat() {
        let fx = fixture();
        send(&fx, "!毎日投稿設定 09:00 #general").await;
        send(&fx, "!毎日投稿内容 hello").await;

        assert_eq!(send(&fx, "  !毎日投稿停止").await, None);
        assert!(fx.store.load_active().await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_full_setup_dialog() {
        let fx = fixture();

        let reply = send(&fx, "!毎日投稿設定 09:00 #general").await.unwrap();
        assert_eq!(reply, messages::CONFIGURE_ACCEPTED);
        assert_eq!(
            fx.store.load_pending().await.unwrap(),
            Some(PendingSetup {
                time_of_day: "09:00".to_string(),
                channel_id: "C100".to_string(),
            })
        );

        let reply = send(&fx, "!毎日投稿内容   おはようございます！  ")
            .await
            .unwrap();
        assert_eq!(
            reply,
            messages::activated("09:00", "C100", "おはようございます！")
        );
        assert_eq!(
            fx.store.load_active().await.unwrap(),
            Some(ActiveConfig {
                time_of_day: "09:00".to_string(),
                channel_id: "C100".to_string(),
                message: "おはようございます！".to_string(),
            })
        );
        assert!(fx.store.load_pending().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_configure_with_mention_skips_directory() {
        let fx = fixture();

        send(&fx, "!毎日投稿設定 7:30 <#C12345|general>").await.unwrap();
        let pending = fx.store.load_pending().await.unwrap().unwrap();
        assert_eq!(pending.time_of_day, "07:30");
        assert_eq!(pending.channel_id, "C12345");
        assert_eq!(fx.client.directory_calls(), 0);
    }

    #[tokio::test]
    async fn test_configure_missing_argument() {
        let fx = fixture();

        let reply = send(&fx, "!毎日投稿設定 09:00").await.unwrap();
        assert_eq!(reply, Rejection::Usage.reply());
        assert!(!fx.dir.path().join(PENDING_FILE).exists());

        let reply = send(&fx, "!毎日投稿設定").await.unwrap();
        assert_eq!(reply, Rejection::Usage.reply());
    }

    #[tokio::test]
    async fn test_configure_rejects_bad_time() {
        let fx = fixture();

        let reply = send(&fx, "!毎日投稿設定 25:00 #general").await.unwrap();
        assert_eq!(reply, Rejection::InvalidTime("25:00".to_string()).reply());
        assert!(fx.store.load_pending().await.unwrap().is_none());
        assert_eq!(fx.client.directory_calls(), 0);
    }

    #[tokio::test]
    async fn test_configure_rejects_bad_channel_format() {
        let fx = fixture();

        let reply = send(&fx, "!毎日投稿設定 09:00 general").await.unwrap();
        assert_eq!(
            reply,
            Rejection::ChannelFormat("general".to_string()).reply()
        );
        assert_eq!(fx.client.directory_calls(), 0);
    }

    #[tokio::test]
    async fn test_configure_unknown_channel() {
        let fx = fixture();

        let reply = send(&fx, "!毎日投稿設定 09:00 #nonexistent").await.unwrap();
        assert_eq!(
            reply,
            Rejection::ChannelNotFound("#nonexistent".to_string()).reply()
        );
        assert!(fx.store.load_pending().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_configure_overwrites_pending() {
        let fx = fixture();

        send(&fx, "!毎日投稿設定 09:00 #general").await;
        send(&fx, "!毎日投稿設定 18:00 #announcements").await;
        let pending = fx.store.load_pending().await.unwrap().unwrap();
        assert_eq!(pending.time_of_day, "18:00");
        assert_eq!(pending.channel_id, "C200");
    }

    #[tokio::test]
    async fn test_content_before_configure() {
        let fx = fixture();
        let existing = ActiveConfig {
            time_of_day: "08:00".to_string(),
            channel_id: "C100".to_string(),
            message: "old".to_string(),
        };
        fx.store.save_active(&existing).await.unwrap();

        let reply = send(&fx, "!毎日投稿内容 new message").await.unwrap();
        assert_eq!(reply, Rejection::OutOfOrder.reply());
        assert_eq!(fx.store.load_active().await.unwrap(), Some(existing));
    }

    #[tokio::test]
    async fn test_empty_content_keeps_pending() {
        let fx = fixture();
        send(&fx, "!毎日投稿設定 09:00 #general").await;

        let reply = send(&fx, "!毎日投稿内容    ").await.unwrap();
        assert_eq!(reply, Rejection::EmptyContent.reply());
        assert!(fx.store.load_pending().await.unwrap().is_some());
        assert!(fx.store.load_active().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_content_replaces_active_config() {
        let fx = fixture();
        send(&fx, "!毎日投稿設定 09:00 #general").await;
        send(&fx, "!毎日投稿内容 first").await;
        send(&fx, "!毎日投稿設定 10:00 #announcements").await;
        send(&fx, "!毎日投稿内容 second").await;

        let active = fx.store.load_active().await.unwrap().unwrap();
        assert_eq!(active.time_of_day, "10:00");
        assert_eq!(active.channel_id, "C200");
        assert_eq!(active.message, "second");
    }

    #[tokio::test]
    async fn test_stop_clears_everything_and_is_idempotent() {
        let fx = fixture();
        send(&fx, "!毎日投稿設定 09:00 #general").await;
        send(&fx, "!毎日投稿内容 hello").await;
        send(&fx, "!毎日投稿設定 10:00 #general").await;

        assert_eq!(send(&fx, "!毎日投稿停止").await.unwrap(), messages::STOPPED);
        assert!(fx.store.load_active().await.unwrap().is_none());
        assert!(fx.store.load_pending().await.unwrap().is_none());

        assert_eq!(send(&fx, "!毎日投稿停止").await.unwrap(), messages::STOPPED);
    }

    #[tokio::test]
    async fn test_store_failure_becomes_generic_reply() {
        let fx = fixture();
        std::fs::write(fx.dir.path().join(PENDING_FILE), "not json").unwrap();

        let reply = send(&fx, "!毎日投稿内容 hello").await.unwrap();
        assert_eq!(reply, messages::GENERIC_FAILURE);
    }
}

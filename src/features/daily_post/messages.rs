//! Command literals and the replies the bot sends back into the channel

/// Stop posting and clear any configuration
pub const STOP_COMMAND: &str = "!毎日投稿停止";
/// Begin configuration: `!毎日投稿設定 HH:MM #channel`
pub const CONFIGURE_COMMAND: &str = "!毎日投稿設定";
/// Supply the message body and activate
pub const CONTENT_COMMAND: &str = "!毎日投稿内容";

pub const STOPPED: &str = "✅ 毎日投稿を停止しました。";
pub const CONFIGURE_ACCEPTED: &str =
    "✅ 投稿時間とチャンネルを設定しました。\n続けて `!毎日投稿内容 メッセージ内容` を送信してください。";
pub const GENERIC_FAILURE: &str = "❌ エラーが発生しました。しばらくしてから再度お試しください。";

/// A command the bot understood but will not carry out
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// Configure without both arguments
    Usage,
    /// Time argument is not a 24-hour `HH:MM`
    InvalidTime(String),
    /// Channel argument is neither a mention nor `#name`
    ChannelFormat(String),
    /// No channel with that reference
    ChannelNotFound(String),
    /// Content supplied before Configure
    OutOfOrder,
    /// Content command with an empty body
    EmptyContent,
}

impl Rejection {
    pub fn reply(&self) -> String {
        match self {
            Rejection::Usage => "❌ 使用方法: `!毎日投稿設定 HH:MM #channel`".to_string(),
            Rejection::InvalidTime(raw) => {
                format!("❌ 時刻 `{raw}` は無効です。`HH:MM` 形式（例: `09:00`）で指定してください。")
            }
            Rejection::ChannelFormat(raw) => {
                format!("❌ チャンネル `{raw}` の形式が正しくありません。`#channel` の形式で指定してください。")
            }
            Rejection::ChannelNotFound(raw) => {
                format!("❌ チャンネル `{raw}` が見つかりません。")
            }
            Rejection::OutOfOrder => "⚠️ 先に `!毎日投稿設定` を使用してください。".to_string(),
            Rejection::EmptyContent => "❌ 投稿内容が空です。".to_string(),
        }
    }
}

/// Confirmation after the daily post has been activated
pub fn activated(time_of_day: &str, channel_id: &str, message: &str) -> String {
    format!("✅ 毎日 `{time_of_day}` に <#{channel_id}> へ以下の内容を投稿します。\n---\n{message}")
}

//! Channel reference resolution
//!
//! Turns what a user typed (`<#C123|general>`, `<#123456>` or `#general`) into a
//! channel ID the platform can post to.
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0
//!
//! ## Changelog
//! - 1.0.0: Mention tokens resolved locally, `#name` looked up in the directory

use log::{debug, warn};
use regex::Regex;
use std::sync::{Arc, OnceLock};

use crate::platform::ChatClient;

fn mention_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^<#([A-Za-z0-9]+)(?:\|[^>]*)?>$").expect("mention pattern is valid")
    })
}

/// A syntactically valid channel reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelReference {
    /// Platform mention token carrying the channel ID
    Mention(String),
    /// `#name`, stored without the sigil
    Name(String),
}

impl ChannelReference {
    /// Recognise a mention token or a `#name`. Anything else is not a reference.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if let Some(caps) = mention_pattern().captures(raw) {
            return Some(ChannelReference::Mention(caps[1].to_string()));
        }
        match raw.strip_prefix('#') {
            Some(name) if !name.is_empty() && !name.contains(char::is_whitespace) => {
                Some(ChannelReference::Name(name.to_string()))
            }
            _ => None,
        }
    }
}

/// Resolves channel references against the platform directory
#[derive(Clone)]
pub struct ChannelResolver {
    client: Arc<dyn ChatClient>,
}

impl ChannelResolver {
    pub fn new(client: Arc<dyn ChatClient>) -> Self {
        ChannelResolver { client }
    }

    /// Resolve a reference to a channel ID, or `None` when not found.
    ///
    /// Directory failures are logged and reported as not found.
    pub async fn resolve(&self, reference: &ChannelReference) -> Option<String> {
        match reference {
            ChannelReference::Mention(id) => Some(id.clone()),
            ChannelReference::Name(name) => {
                let channels = match self.client.list_channels().await {
                    Ok(channels) => channels,
                    Err(e) => {
                        warn!("Channel directory lookup for #{name} failed: {e:#}");
                        return None;
                    }
                };
                debug!("Directory returned {} channels", channels.len());
                channels
                    .into_iter()
                    .find(|channel| channel.name == *name)
                    .map(|channel| channel.id)
            }
        }
    }
}

//! # Core Module
//!
//! Configuration and outbound message utilities shared by every transport.
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.0.0: Config and response chunking

pub mod config;
pub mod response;

// Re-export commonly used items
pub use config::{Config, Credentials, Platform};
pub use response::{chunk_text, DISCORD_MESSAGE_LIMIT, SLACK_MESSAGE_LIMIT};

//! # Command System
//!
//! Text commands for configuring the daily post, and the event seam the
//! transports drive.
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.0.0: Daily post commands and InboundEventHandler

pub mod daily_post;
pub mod handler;

pub use daily_post::{normalize_time, Command, CommandInterpreter};
pub use handler::{DailyPostBot, InboundEventHandler};

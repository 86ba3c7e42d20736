//! # Features Layer
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0
//!
//! ## Changelog
//! - 1.0.0: Daily post feature

pub mod daily_post;

pub use daily_post::{
    ActiveConfig, ChannelReference, ChannelResolver, DailyScheduler, PendingSetup, PostCursor,
    Rejection, SchedulerHandle, StateStore, TickOutcome,
};

//! # Feature: Daily Post
//!
//! One recurring message per deployment: configured in two chat steps,
//! persisted to disk and posted by a polling scheduler once a day.
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.0.0: Store, channel resolver, scheduler and reply texts

pub mod channel_resolver;
pub mod messages;
pub mod scheduler;
pub mod store;

pub use channel_resolver::{ChannelReference, ChannelResolver};
pub use messages::Rejection;
pub use scheduler::{DailyScheduler, PostCursor, SchedulerHandle, TickOutcome};
pub use store::{ActiveConfig, PendingSetup, StateStore};

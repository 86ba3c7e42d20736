// Core layer - configuration and outbound message utilities
pub mod core;

// Features layer - the daily post store, resolver and scheduler
pub mod features;

// Application layer - chat commands and the inbound event seam
pub mod commands;

// Platform layer - ChatClient trait and Discord/Slack transports
pub mod platform;

pub use crate::core::Config;

pub use commands::{CommandInterpreter, DailyPostBot, InboundEventHandler};

pub use features::{
    ActiveConfig, ChannelReference, ChannelResolver, DailyScheduler, PendingSetup, PostCursor,
    Rejection, SchedulerHandle, StateStore, TickOutcome,
};

pub use platform::{BotIdentity, ChatClient, DirectoryChannel, InboundEvent};

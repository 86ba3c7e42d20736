//! Post the configured daily message once and exit.
//!
//! Meant for cron or CI runners that replace the long-running scheduler.

use anyhow::{Context, Result};
use log::{info, warn};

use daily_post::core::Config;
use daily_post::features::daily_post::StateStore;
use daily_post::platform::client_for;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&config.log_level))
        .init();

    let store = StateStore::new(&config.data_dir);
    let Some(active) = store.load_active().await? else {
        info!("No daily post configured in {}", store.data_dir().display());
        return Ok(());
    };

    if active.channel_id.trim().is_empty() || active.message.trim().is_empty() {
        warn!("Daily post configuration is missing a channel or message");
        return Ok(());
    }

    let client = client_for(&config.credentials);
    client
        .post_message(&active.channel_id, &active.message)
        .await
        .with_context(|| format!("Failed to post daily message to {}", active.channel_id))?;

    info!("📨 Posted daily message to {}", active.channel_id);
    Ok(())
}

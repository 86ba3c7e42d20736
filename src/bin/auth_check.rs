//! Verify the configured bot credentials against the platform.

use anyhow::{Context, Result};

use daily_post::core::Config;
use daily_post::platform::client_for;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&config.log_level))
        .init();

    let identity = client_for(&config.credentials)
        .identity()
        .await
        .context("Bot authentication failed")?;

    println!("Bot is installed correctly ({:?}).", config.platform);
    if let Some(team) = &identity.team {
        println!("Team: {team}");
    }
    println!("User: {} ({})", identity.user_name, identity.user_id);
    Ok(())
}

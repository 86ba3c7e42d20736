use anyhow::Result;
use log::{error, info, warn};
use std::sync::Arc;

use daily_post::commands::{CommandInterpreter, DailyPostBot, InboundEventHandler};
use daily_post::core::{Config, Credentials};
use daily_post::features::daily_post::{ChannelResolver, DailyScheduler, StateStore};
use daily_post::platform::{client_for, DiscordGateway, SlackSocketMode};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&config.log_level))
        .init();

    info!("Starting daily post bot ({:?})...", config.platform);

    // Socket Mode needs its own token; fail before anything is spawned
    if matches!(config.credentials, Credentials::Slack { .. }) {
        config.require_slack_app_token()?;
    }

    let client = client_for(&config.credentials);
    match client.identity().await {
        Ok(identity) => info!(
            "🤖 Authenticated as {} ({}){}",
            identity.user_name,
            identity.user_id,
            identity
                .team
                .map(|team| format!(" in {team}"))
                .unwrap_or_default()
        ),
        Err(e) => warn!("Could not verify bot identity: {e:#}"),
    }

    let store = StateStore::new(&config.data_dir);
    info!("💾 State directory: {}", store.data_dir().display());

    let interpreter = CommandInterpreter::new(store.clone(), ChannelResolver::new(client.clone()));
    let bot: Arc<dyn InboundEventHandler> = Arc::new(DailyPostBot::new(interpreter, client.clone()));

    let scheduler = DailyScheduler::new(store, client).spawn(config.poll_interval);

    let transport = async {
        match &config.credentials {
            Credentials::Discord { token } => DiscordGateway::new(token.clone(), bot).run().await,
            Credentials::Slack { .. } => {
                let app_token = config.require_slack_app_token()?.to_string();
                Arc::new(SlackSocketMode::new(app_token, bot))
                    .run_with_retry()
                    .await;
                Ok(())
            }
        }
    };

    let result = tokio::select! {
        result = transport => result,
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown requested");
            Ok(())
        }
    };

    scheduler.stop().await;
    if let Err(e) = &result {
        error!("Bot stopped with error: {e:#}");
    }
    result
}

//! Daily post scheduler
//!
//! Polls the active configuration and posts the message when the local
//! wall-clock minute matches, at most once per calendar date.
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0
//!
//! ## Changelog
//! - 1.0.0: Level-triggered poll with an owned PostCursor and a stop signal

use chrono::{Local, NaiveDate, NaiveDateTime};
use log::{debug, error, info, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::store::StateStore;
use crate::platform::ChatClient;

/// Format used both for stored times and for the current wall-clock minute
pub const TIME_FORMAT: &str = "%H:%M";

/// Source of the current local time
pub type Clock = Arc<dyn Fn() -> NaiveDateTime + Send + Sync>;

fn local_clock() -> Clock {
    Arc::new(|| Local::now().naive_local())
}

/// The last date the active message went out. In memory only, so a restart
/// inside the matching minute can post again.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostCursor {
    last_posted_date: Option<NaiveDate>,
}

impl PostCursor {
    pub fn last_posted_date(&self) -> Option<NaiveDate> {
        self.last_posted_date
    }

    pub fn posted_on(&self, date: NaiveDate) -> bool {
        self.last_posted_date == Some(date)
    }

    fn record(&mut self, date: NaiveDate) {
        self.last_posted_date = Some(date);
    }
}

/// What a single poll did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// No active configuration
    Idle,
    /// Configured, but not the scheduled minute
    Waiting,
    /// Scheduled minute, already sent today
    AlreadyPosted,
    /// Message sent
    Posted,
    /// Store read or send failed; the cursor is unchanged
    Failed,
}

pub struct DailyScheduler {
    store: StateStore,
    client: Arc<dyn ChatClient>,
    cursor: PostCursor,
    clock: Clock,
}

impl DailyScheduler {
    pub fn new(store: StateStore, client: Arc<dyn ChatClient>) -> Self {
        DailyScheduler {
            store,
            client,
            cursor: PostCursor::default(),
            clock: local_clock(),
        }
    }

    /// Replace the wall clock (tests, replays)
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn cursor(&self) -> &PostCursor {
        &self.cursor
    }

    /// Run one poll against the given local time
    pub async fn tick(&mut self, now: NaiveDateTime) -> TickOutcome {
        let config = match self.store.load_active().await {
            Ok(Some(config)) => config,
            Ok(None) => {
                debug!("No daily post configured");
                return TickOutcome::Idle;
            }
            Err(e) => {
                error!("Failed to read daily post configuration: {e:#}");
                return TickOutcome::Failed;
            }
        };

        let current_minute = now.format(TIME_FORMAT).to_string();
        if current_minute != config.time_of_day {
            debug!(
                "Daily post waiting: now {current_minute}, scheduled {}",
                config.time_of_day
            );
            return TickOutcome::Waiting;
        }

        let today = now.date();
        if self.cursor.posted_on(today) {
            return TickOutcome::AlreadyPosted;
        }

        match self
            .client
            .post_message(&config.channel_id, &config.message)
            .await
        {
            Ok(()) => {
                self.cursor.record(today);
                info!(
                    "📨 Posted daily message to {} for {today}",
                    config.channel_id
                );
                TickOutcome::Posted
            }
            Err(e) => {
                error!(
                    "Failed to post daily message to {}: {e:#}",
                    config.channel_id
                );
                TickOutcome::Failed
            }
        }
    }

    /// Start polling on a background task
    pub fn spawn(mut self, interval: Duration) -> SchedulerHandle {
        let (stop_tx, mut stop_rx) = watch::channel(false);

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            info!(
                "⏰ Daily post scheduler started (interval: {}s)",
                interval.as_secs()
            );

            loop {
                tokio::select! {
                    biased;
                    changed = stop_rx.changed() => {
                        if changed.is_err() || *stop_rx.borrow() {
                            break;
                        }
                    }
                    _ = ticker.tick() => {
                        let now = (self.clock)();
                        self.tick(now).await;
                    }
                }
            }

            info!("Daily post scheduler stopped");
        });

        SchedulerHandle { stop_tx, task }
    }
}

/// Handle to a running scheduler loop
pub struct SchedulerHandle {
    stop_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SchedulerHandle {
    /// Signal the loop to stop and wait for it to finish
    pub async fn stop(self) {
        let _ = self.stop_tx.send(true);
        self.join().await;
    }

    /// Wait for the loop to exit
    pub async fn join(self) {
        if let Err(e) = self.task.await {
            warn!("Daily post scheduler task ended abnormally: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::daily_post::store::{ActiveConfig, ACTIVE_FILE};
    use crate::platform::testing::FakeChatClient;

    fn at(date: &str, time: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(&format!("{date} {time}"), "%Y-%m-%d %H:%M:%S").unwrap()
    }

    async fn configured_store(dir: &tempfile::TempDir) -> StateStore {
        let store = StateStore::new(dir.path());
        store
            .save_active(&ActiveConfig {
                time_of_day: "09:00".to_string(),
                channel_id: "C12345".to_string(),
                message: "おはようございます".to_string(),
            })
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn test_fires_once_per_day() {
        let dir = tempfile::tempdir().unwrap();
        let store = configured_store(&dir).await;
        let client = Arc::new(FakeChatClient::default());
        let mut scheduler = DailyScheduler::new(store, client.clone());

        assert_eq!(
            scheduler.tick(at("2026-10-16", "08:59:40")).await,
            TickOutcome::Waiting
        );
        assert_eq!(
            scheduler.tick(at("2026-10-16", "09:00:10")).await,
            TickOutcome::Posted
        );
        assert_eq!(
            scheduler.tick(at("2026-10-16", "09:00:40")).await,
            TickOutcome::AlreadyPosted
        );
        assert_eq!(
            scheduler.tick(at("2026-10-16", "09:01:10")).await,
            TickOutcome::Waiting
        );

        assert_eq!(
            client.posts(),
            vec![("C12345".to_string(), "おはようございます".to_string())]
        );
        assert_eq!(
            scheduler.cursor().last_posted_date(),
            NaiveDate::from_ymd_opt(2026, 10, 16)
        );
    }

    #[tokio::test]
    async fn test_fires_again_next_day() {
        let dir = tempfile::tempdir().unwrap();
        let store = configured_store(&dir).await;
        let client = Arc::new(FakeChatClient::default());
        let mut scheduler = DailyScheduler::new(store, client.clone());

        scheduler.tick(at("2026-10-16", "09:00:00")).await;
        assert_eq!(
            scheduler.tick(at("2026-10-17", "09:00:05")).await,
            TickOutcome::Posted
        );
        assert_eq!(client.posts().len(), 2);
    }

    #[tokio::test]
    async fn test_idle_without_config() {
        let dir = tempfile::tempdir().unwrap();
        let client = Arc::new(FakeChatClient::default());
        let mut scheduler = DailyScheduler::new(StateStore::new(dir.path()), client.clone());

        for time in ["00:00:00", "09:00:00", "23:59:30"] {
            assert_eq!(
                scheduler.tick(at("2026-10-16", time)).await,
                TickOutcome::Idle
            );
        }
        assert!(client.posts().is_empty());
    }

    #[tokio::test]
    async fn test_failed_send_leaves_cursor_unset() {
        let dir = tempfile::tempdir().unwrap();
        let store = configured_store(&dir).await;
        let client = Arc::new(FakeChatClient::default());
        client.set_fail_posts(true);
        let mut scheduler = DailyScheduler::new(store, client.clone());

        assert_eq!(
            scheduler.tick(at("2026-10-16", "09:00:00")).await,
            TickOutcome::Failed
        );
        assert_eq!(scheduler.cursor().last_posted_date(), None);

        // A later poll inside the same minute still matches
        client.set_fail_posts(false);
        assert_eq!(
            scheduler.tick(at("2026-10-16", "09:00:30")).await,
            TickOutcome::Posted
        );
    }

    #[tokio::test]
    async fn test_unreadable_config_skips_tick() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(ACTIVE_FILE), "{ broken").unwrap();
        let client = Arc::new(FakeChatClient::default());
        let mut scheduler = DailyScheduler::new(StateStore::new(dir.path()), client.clone());

        assert_eq!(
            scheduler.tick(at("2026-10-16", "09:00:00")).await,
            TickOutcome::Failed
        );
        assert!(client.posts().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_spawned_loop_posts_once_and_stops() {
        let dir = tempfile::tempdir().unwrap();
        let store = configured_store(&dir).await;
        let client = Arc::new(FakeChatClient::default());
        let fixed_now = at("2026-10-16", "09:00:00");

        let handle = DailyScheduler::new(store, client.clone())
            .with_clock(Arc::new(move || fixed_now))
            .spawn(Duration::from_secs(30));

        tokio::time::sleep(Duration::from_secs(95)).await;
        handle.stop().await;

        assert_eq!(client.posts().len(), 1);
    }
}

//! File-backed storage for the pending setup and the active configuration
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0
//!
//! ## Changelog
//! - 1.0.0: JSON records with write-then-rename and a shared access lock

use anyhow::{Context, Result};
use log::debug;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;

/// File name of the pending-setup record
pub const PENDING_FILE: &str = "daily_post_temp.json";
/// File name of the active-configuration record
pub const ACTIVE_FILE: &str = "daily_post.json";

/// First half of the setup dialog: time and channel, no message yet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingSetup {
    #[serde(rename = "time")]
    pub time_of_day: String,
    pub channel_id: String,
}

/// The one recurring post this deployment sends
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveConfig {
    #[serde(rename = "time")]
    pub time_of_day: String,
    pub channel_id: String,
    pub message: String,
}

impl ActiveConfig {
    /// Promote a pending setup by attaching the message body
    pub fn from_pending(pending: PendingSetup, message: String) -> Self {
        ActiveConfig {
            time_of_day: pending.time_of_day,
            channel_id: pending.channel_id,
            message,
        }
    }
}

/// Storage for both records.
///
/// Clones share one lock, so the command interpreter and the scheduler never
/// interleave a read with a half-finished replace.
#[derive(Clone)]
pub struct StateStore {
    data_dir: PathBuf,
    lock: Arc<Mutex<()>>,
}

impl StateStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        StateStore {
            data_dir: data_dir.into(),
            lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub async fn load_pending(&self) -> Result<Option<PendingSetup>> {
        let _guard = self.lock.lock().await;
        self.read_record(PENDING_FILE).await
    }

    pub async fn save_pending(&self, pending: &PendingSetup) -> Result<()> {
        let _guard = self.lock.lock().await;
        self.write_record(PENDING_FILE, pending).await
    }

    pub async fn load_active(&self) -> Result<Option<ActiveConfig>> {
        let _guard = self.lock.lock().await;
        self.read_record(ACTIVE_FILE).await
    }

    pub async fn save_active(&self, config: &ActiveConfig) -> Result<()> {
        let _guard = self.lock.lock().await;
        self.write_record(ACTIVE_FILE, config).await
    }

    /// Promote the pending setup to the active configuration as one step.
    ///
    /// Returns `None` (and writes nothing) when there is no pending setup.
    pub async fn activate_pending(&self, message: &str) -> Result<Option<ActiveConfig>> {
        let _guard = self.lock.lock().await;
        let Some(pending) = self.read_record::<PendingSetup>(PENDING_FILE).await? else {
            return Ok(None);
        };
        let config = ActiveConfig::from_pending(pending, message.to_string());
        self.write_record(ACTIVE_FILE, &config).await?;
        self.delete_record(PENDING_FILE).await?;
        Ok(Some(config))
    }

    /// Remove both records. Missing records are fine.
    pub async fn clear_all(&self) -> Result<()> {
        let _guard = self.lock.lock().await;
        self.delete_record(ACTIVE_FILE).await?;
        self.delete_record(PENDING_FILE).await
    }

    fn path_for(&self, file: &str) -> PathBuf {
        self.data_dir.join(file)
    }

    async fn read_record<T: DeserializeOwned>(&self, file: &str) -> Result<Option<T>> {
        let path = self.path_for(file);
        let contents = match tokio::fs::read_to_string(&path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read {}", path.display()))
            }
        };
        let record = serde_json::from_str(&contents)
            .with_context(|| format!("Malformed record in {}", path.display()))?;
        Ok(Some(record))
    }

    async fn write_record<T: Serialize>(&self, file: &str, record: &T) -> Result<()> {
        tokio::fs::create_dir_all(&self.data_dir)
            .await
            .with_context(|| format!("Failed to create {}", self.data_dir.display()))?;

        let path = self.path_for(file);
        let tmp_path = path.with_extension("json.tmp");
        let json = serde_json::to_string_pretty(record)?;

        tokio::fs::write(&tmp_path, json)
            .await
            .with_context(|| format!("Failed to write {}", tmp_path.display()))?;
        tokio::fs::rename(&tmp_path, &path)
            .await
            .with_context(|| format!("Failed to replace {}", path.display()))?;

        debug!("Wrote {}", path.display());
        Ok(())
    }

    async fn delete_record(&self, file: &str) -> Result<()> {
        let path = self.path_for(file);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                debug!("Removed {}", path.display());
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("Failed to remove {}", path.display())),
        }
    }
}

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::error::Result;
use crate::json_file::{read_json, write_json_atomic};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ChangeInterval {
    #[value(name = "every-5-minutes")]
    #[serde(rename = "every-5-minutes")]
    EveryFiveMinutes,
    #[value(name = "every-15-minutes")]
    #[serde(rename = "every-15-minutes")]
    EveryFifteenMinutes,
    #[value(name = "every-30-minutes")]
    #[serde(rename = "every-30-minutes")]
    EveryThirtyMinutes,
    Hourly,
    #[value(name = "every-3-hours")]
    #[serde(rename = "every-3-hours")]
    EveryThreeHours,
    Daily,
    OnWake,
}

impl ChangeInterval {
    /// Timer period, or `None` for the event-driven wake trigger.
    #[must_use]
    pub fn period(self) -> Option<Duration> {
        let minutes = match self {
            Self::EveryFiveMinutes => 5,
            Self::EveryFifteenMinutes => 15,
            Self::EveryThirtyMinutes => 30,
            Self::Hourly => 60,
            Self::EveryThreeHours => 180,
            Self::Daily => 24 * 60,
            Self::OnWake => return None,
        };
        Some(Duration::from_secs(minutes * 60))
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::EveryFiveMinutes => "every-5-minutes",
            Self::EveryFifteenMinutes => "every-15-minutes",
            Self::EveryThirtyMinutes => "every-30-minutes",
            Self::Hourly => "hourly",
            Self::EveryThreeHours => "every-3-hours",
            Self::Daily => "daily",
            Self::OnWake => "on-wake",
        }
    }
}

impl std::fmt::Display for ChangeInterval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub auto_change_enabled: bool,
    pub change_interval: ChangeInterval,
    /// Highest listing page known to contain pictures.
    pub max_page: u32,
    pub last_wallpaper: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            auto_change_enabled: false,
            change_interval: ChangeInterval::Hourly,
            max_page: 1,
            last_wallpaper: None,
        }
    }
}

/// Key-value settings persisted as a single JSON document.
///
/// Read-modify-write goes through [`SettingsStore::update`], which serializes
/// writers within the process.
#[derive(Debug)]
pub struct SettingsStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn load(&self) -> Result<Settings> {
        let mut settings: Settings = read_json(&self.path).await?.unwrap_or_default();
        settings.max_page = settings.max_page.max(1);
        Ok(settings)
    }

    pub async fn update<F>(&self, apply: F) -> Result<Settings>
    where
        F: FnOnce(&mut Settings),
    {
        let _guard = self.lock.lock().await;
        let mut settings = self.load().await?;
        apply(&mut settings);
        write_json_atomic(&self.path, &settings).await?;
        tracing::debug!(path = %self.path.display(), ?settings, "saved settings");
        Ok(settings)
    }

    /// Raises the stored page maximum; lower values are ignored.
    pub async fn raise_max_page(&self, candidate: u32) -> Result<u32> {
        let settings = self
            .update(|settings| settings.max_page = settings.max_page.max(candidate))
            .await?;
        Ok(settings.max_page)
    }
}

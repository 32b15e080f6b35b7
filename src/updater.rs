use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Mutex, broadcast};

use crate::applier::WallpaperApplier;
use crate::error::{Error, Result};
use crate::picture::{PictureInfo, PictureRecord};
use crate::settings::SettingsStore;
use crate::source::PictureSource;
use crate::store::PictureStore;

#[async_trait]
pub trait PictureFetcher: Send + Sync {
    async fn fetch_random(&self, max_page: u32) -> Result<PictureInfo>;
}

#[async_trait]
impl PictureFetcher for PictureSource {
    async fn fetch_random(&self, max_page: u32) -> Result<PictureInfo> {
        PictureSource::fetch_random(self, max_page).await
    }
}

/// Progress of an update, published to every subscriber.
#[derive(Debug, Clone)]
pub enum UpdateEvent {
    Started { attempt: u32 },
    Fetched { picture: PictureInfo },
    Applied { record: PictureRecord, path: PathBuf },
    AttemptFailed { attempt: u32, kind: &'static str, error: String },
    Failed { error: String },
}

#[derive(Debug, Clone)]
pub struct UpdateOutcome {
    pub record: PictureRecord,
    pub path: PathBuf,
}

/// Runs fetch → store → apply. Updates never overlap: a second caller waits
/// for the running one to finish and then performs its own update.
pub struct Updater {
    fetcher: Arc<dyn PictureFetcher>,
    store: Arc<dyn PictureStore>,
    applier: Arc<WallpaperApplier>,
    settings: Arc<SettingsStore>,
    events: broadcast::Sender<UpdateEvent>,
    running: Mutex<()>,
    attempts: u32,
    retry_delay: Duration,
}

impl Updater {
    pub fn new(
        fetcher: Arc<dyn PictureFetcher>,
        store: Arc<dyn PictureStore>,
        applier: Arc<WallpaperApplier>,
        settings: Arc<SettingsStore>,
        attempts: u32,
    ) -> Self {
        let (events, _) = broadcast::channel(32);
        Self {
            fetcher,
            store,
            applier,
            settings,
            events,
            running: Mutex::new(()),
            attempts: attempts.max(1),
            retry_delay: Duration::from_secs(1),
        }
    }

    #[must_use]
    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    pub fn subscribe(&self) -> broadcast::Receiver<UpdateEvent> {
        self.events.subscribe()
    }

    pub fn applier(&self) -> &WallpaperApplier {
        &self.applier
    }

    /// User-initiated update: retries up to the configured attempt budget and
    /// reports the last error.
    pub async fn update_wallpaper(&self) -> Result<UpdateOutcome> {
        let _running = self.running.lock().await;

        let mut last_err = None;
        for attempt in 1..=self.attempts {
            match self.attempt(attempt).await {
                Ok(outcome) => return Ok(outcome),
                Err(err) => {
                    tracing::warn!(attempt, attempts = self.attempts, kind = err.kind(), %err, "update attempt failed");
                    self.publish(UpdateEvent::AttemptFailed {
                        attempt,
                        kind: err.kind(),
                        error: err.to_string(),
                    });
                    last_err = Some(err);
                    if attempt < self.attempts && !self.retry_delay.is_zero() {
                        tokio::time::sleep(self.retry_delay).await;
                    }
                }
            }
        }

        let err = last_err.unwrap_or_else(|| Error::Parse("no update attempt was made".to_owned()));
        self.publish(UpdateEvent::Failed {
            error: err.to_string(),
        });
        Err(err)
    }

    /// Scheduled update: a single attempt, the next fire is the retry.
    pub async fn update_once(&self) -> Result<UpdateOutcome> {
        let _running = self.running.lock().await;
        self.attempt(1).await.inspect_err(|err| {
            self.publish(UpdateEvent::Failed {
                error: err.to_string(),
            });
        })
    }

    /// Fetches and records a picture without touching the desktop.
    pub async fn fetch_and_record(&self) -> Result<PictureRecord> {
        let max_page = self.settings.load().await?.max_page;
        let picture = self.fetcher.fetch_random(max_page).await?;
        self.publish(UpdateEvent::Fetched {
            picture: picture.clone(),
        });
        Ok(self.store.upsert(&picture).await)
    }

    async fn attempt(&self, attempt: u32) -> Result<UpdateOutcome> {
        self.publish(UpdateEvent::Started { attempt });
        let record = self.fetch_and_record().await?;
        let path = self.applier.apply(&record).await?;
        self.publish(UpdateEvent::Applied {
            record: record.clone(),
            path: path.clone(),
        });
        Ok(UpdateOutcome { record, path })
    }

    fn publish(&self, event: UpdateEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}

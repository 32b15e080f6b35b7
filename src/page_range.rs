use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;
use crate::settings::SettingsStore;
use crate::source::PictureSource;

/// Anything that can report the picture links on a listing page.
#[async_trait]
pub trait ListingPages: Send + Sync {
    async fn page_links(&self, page: u32) -> Result<Vec<String>>;
}

#[async_trait]
impl ListingPages for PictureSource {
    async fn page_links(&self, page: u32) -> Result<Vec<String>> {
        self.fetch_page(page).await
    }
}

/// Probes pages after `start` one at a time and returns the last page that
/// still had pictures. Errors end the probe at the last confirmed page.
pub async fn probe_page_range(pages: &dyn ListingPages, start: u32, max_probe_pages: u32) -> u32 {
    let mut confirmed = start.max(1);

    for _ in 0..max_probe_pages {
        let Some(next) = confirmed.checked_add(1) else {
            break;
        };
        match pages.page_links(next).await {
            Ok(links) if !links.is_empty() => {
                tracing::debug!(page = next, links = links.len(), "page range expanded");
                confirmed = next;
            }
            Ok(_) => {
                tracing::debug!(page = next, "page is empty; page range settled");
                break;
            }
            Err(err) => {
                tracing::debug!(page = next, ?err, "page probe failed; keeping last confirmed page");
                break;
            }
        }
    }

    confirmed
}

/// Keeps the persisted page maximum in step with the listing source.
pub struct PageRangeTracker {
    pages: Arc<dyn ListingPages>,
    settings: Arc<SettingsStore>,
    max_probe_pages: u32,
}

impl PageRangeTracker {
    pub fn new(
        pages: Arc<dyn ListingPages>,
        settings: Arc<SettingsStore>,
        max_probe_pages: u32,
    ) -> Self {
        Self {
            pages,
            settings,
            max_probe_pages,
        }
    }

    /// Probes forward from the stored maximum and persists the result.
    pub async fn refresh(&self) -> Result<u32> {
        let start = self.settings.load().await?.max_page;
        let probed = probe_page_range(self.pages.as_ref(), start, self.max_probe_pages).await;
        let stored = self.settings.raise_max_page(probed).await?;
        if stored > start {
            tracing::info!(from = start, to = stored, "page range grew");
        }
        Ok(stored)
    }

    /// Runs [`Self::refresh`] in the background; failures are logged only.
    pub fn spawn_refresh(self: Arc<Self>) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            if let Err(err) = self.refresh().await {
                tracing::warn!(?err, "page range refresh failed");
            }
        })
    }
}

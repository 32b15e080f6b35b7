use std::sync::LazyLock;

use rand::Rng;
use rand::seq::IndexedRandom as _;
use reqwest::header::{ACCEPT, USER_AGENT};
use scraper::{Html, Selector};
use url::Url;

use crate::config::{AppConfig, PAGE_PLACEHOLDER};
use crate::error::{Error, Result};
use crate::picture::{PREVIEW_SUFFIX, PictureInfo};

pub const CLIENT_USER_AGENT: &str = concat!("wallfetch/", env!("CARGO_PKG_VERSION"));

static IMAGE_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("img[src]").expect("valid img selector"));

/// HTTP client for the paginated listing source.
#[derive(Debug, Clone)]
pub struct PictureSource {
    client: reqwest::Client,
    listing_url: String,
    name_marker: String,
}

impl PictureSource {
    pub fn new(config: &AppConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .map_err(|err| Error::network(&config.listing_url, err))?;

        Ok(Self::with_client(client, config))
    }

    pub fn with_client(client: reqwest::Client, config: &AppConfig) -> Self {
        Self {
            client,
            listing_url: config.listing_url.clone(),
            name_marker: config.name_marker.clone(),
        }
    }

    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    pub fn listing_url(&self, page: u32) -> String {
        self.listing_url
            .replace(PAGE_PLACEHOLDER, &page.to_string())
    }

    /// Fetches one listing page and returns its picture preview links.
    pub async fn fetch_page(&self, page: u32) -> Result<Vec<String>> {
        let url = self.listing_url(page);
        let response = self
            .client
            .get(&url)
            .header(USER_AGENT, CLIENT_USER_AGENT)
            .header(ACCEPT, "text/html,application/xhtml+xml;q=0.9,*/*;q=0.8")
            .send()
            .await
            .map_err(|err| Error::network(&url, err))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::network(&url, format!("unexpected status {status}")));
        }

        let base = response.url().clone();
        let html = response
            .text()
            .await
            .map_err(|err| Error::network(&url, err))?;

        let links = extract_image_links(&html, &base);
        tracing::debug!(page, url = %url, links = links.len(), "fetched listing page");
        Ok(links)
    }

    /// Picks a uniformly random page in `[1, max_page]` and returns one random
    /// picture from it.
    pub async fn fetch_random(&self, max_page: u32) -> Result<PictureInfo> {
        let page = rand::rng().random_range(1..=max_page.max(1));
        tracing::info!(page, max_page, "fetching random picture");

        let links = self.fetch_page(page).await?;
        self.pick_picture(&links, &mut rand::rng()).ok_or_else(|| {
            Error::Parse(format!("no image links on {}", self.listing_url(page)))
        })
    }

    pub fn pick_picture<R: Rng + ?Sized>(
        &self,
        links: &[String],
        rng: &mut R,
    ) -> Option<PictureInfo> {
        let pictures = links
            .iter()
            .filter_map(|link| PictureInfo::from_preview_link(link, &self.name_marker))
            .collect::<Vec<_>>();
        pictures.choose(rng).cloned()
    }
}

/// Collects absolute `img[src]` values that end in the preview suffix, in
/// document order without duplicates.
pub fn extract_image_links(html: &str, base: &Url) -> Vec<String> {
    let document = Html::parse_document(html);
    let mut links: Vec<String> = Vec::new();

    for img in document.select(&IMAGE_SELECTOR) {
        let Some(src) = img.value().attr("src") else {
            continue;
        };
        let Ok(resolved) = base.join(src.trim()) else {
            tracing::debug!(src, "skipping unparseable img src");
            continue;
        };
        let resolved = resolved.to_string();
        if !resolved.ends_with(PREVIEW_SUFFIX) || links.contains(&resolved) {
            continue;
        }
        links.push(resolved);
    }

    links
}

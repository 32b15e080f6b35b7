use std::path::PathBuf;
use std::time::Duration;

use crate::picture::DEFAULT_NAME_MARKER;

pub const DEFAULT_LISTING_URL: &str = "https://wallpapers.example.com/page/{page}";
pub const PAGE_PLACEHOLDER: &str = "{page}";

/// Runtime configuration shared by every service.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    /// Listing endpoint with a `{page}` placeholder.
    pub listing_url: String,
    pub name_marker: String,
    pub request_timeout: Duration,
    pub max_probe_pages: u32,
    pub update_attempts: u32,
}

impl AppConfig {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            listing_url: DEFAULT_LISTING_URL.to_owned(),
            name_marker: DEFAULT_NAME_MARKER.to_owned(),
            request_timeout: Duration::from_secs(20),
            max_probe_pages: 1000,
            update_attempts: 3,
        }
    }

    pub fn default_data_dir() -> PathBuf {
        dirs::data_dir().map_or_else(
            || std::env::temp_dir().join("wallfetch"),
            |dir| dir.join("wallfetch"),
        )
    }

    pub fn settings_path(&self) -> PathBuf {
        self.data_dir.join("settings.json")
    }

    pub fn pictures_path(&self) -> PathBuf {
        self.data_dir.join("pictures.json")
    }

    pub fn wallpaper_dir(&self) -> PathBuf {
        self.data_dir.join("wallpapers")
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if !self.listing_url.contains(PAGE_PLACEHOLDER) {
            anyhow::bail!(
                "listing url must contain a {PAGE_PLACEHOLDER} placeholder: {}",
                self.listing_url
            );
        }
        let sample = self.listing_url.replace(PAGE_PLACEHOLDER, "1");
        let parsed = url::Url::parse(&sample)
            .map_err(|err| anyhow::anyhow!("invalid listing url {}: {err}", self.listing_url))?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            anyhow::bail!("listing url must be http/https: {}", self.listing_url);
        }
        if self.name_marker.trim().is_empty() {
            anyhow::bail!("name marker must not be empty");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::AppConfig;

    #[test]
    fn paths_live_under_data_dir() {
        let config = AppConfig::new("/var/lib/wallfetch");
        assert_eq!(
            config.settings_path(),
            std::path::Path::new("/var/lib/wallfetch/settings.json")
        );
        assert!(config.wallpaper_dir().starts_with("/var/lib/wallfetch"));
    }

    #[test]
    fn listing_url_requires_placeholder() {
        let mut config = AppConfig::new("/tmp/wf");
        assert!(config.validate().is_ok());

        config.listing_url = "https://wallpapers.example.com/page/1".to_owned();
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("placeholder"));

        config.listing_url = "ftp://wallpapers.example.com/{page}".to_owned();
        assert!(config.validate().is_err());
    }
}

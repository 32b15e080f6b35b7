use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context as _;

use crate::applier::{CommandDesktop, Desktop, SystemDesktop, WallpaperApplier};
use crate::cli::GlobalArgs;
use crate::config::AppConfig;
use crate::page_range::PageRangeTracker;
use crate::settings::SettingsStore;
use crate::source::PictureSource;
use crate::store::{LocalFsPictureStore, PictureStore};
use crate::updater::Updater;

/// Every service of one process, constructed explicitly from configuration.
pub struct Services {
    pub config: AppConfig,
    pub settings: Arc<SettingsStore>,
    pub source: Arc<PictureSource>,
    pub store: Arc<dyn PictureStore>,
    pub applier: Arc<WallpaperApplier>,
}

impl Services {
    pub fn new(config: AppConfig, desktop: Arc<dyn Desktop>) -> anyhow::Result<Self> {
        config.validate().context("validate configuration")?;

        let settings = Arc::new(SettingsStore::new(config.settings_path()));
        let source = Arc::new(PictureSource::new(&config).context("build http client")?);
        let store: Arc<dyn PictureStore> =
            Arc::new(LocalFsPictureStore::new(config.pictures_path()));
        let applier = Arc::new(WallpaperApplier::new(
            source.client().clone(),
            config.wallpaper_dir(),
            desktop,
            Arc::clone(&settings),
        ));

        tracing::debug!(data_dir = %config.data_dir.display(), listing_url = %config.listing_url, "services ready");
        Ok(Self {
            config,
            settings,
            source,
            store,
            applier,
        })
    }

    pub fn from_args(global: &GlobalArgs) -> anyhow::Result<Self> {
        let data_dir = global
            .data_dir
            .as_deref()
            .map_or_else(AppConfig::default_data_dir, PathBuf::from);

        let mut config = AppConfig::new(data_dir);
        config.listing_url = global.listing_url.clone();
        config.name_marker = global.name_marker.clone();
        config.request_timeout = Duration::from_secs(global.timeout_secs.max(1));

        let desktop: Arc<dyn Desktop> = match global.set_command.as_deref() {
            Some(command) => Arc::new(
                CommandDesktop::parse(command)
                    .ok_or_else(|| anyhow::anyhow!("--set-command must not be empty"))?
                    .with_args(global.set_args.iter().cloned()),
            ),
            None => {
                if !global.set_args.is_empty() {
                    tracing::warn!("--set-arg has no effect without --set-command");
                }
                Arc::new(SystemDesktop)
            }
        };

        Self::new(config, desktop)
    }

    pub fn updater(&self, attempts: u32) -> Updater {
        Updater::new(
            self.source.clone(),
            Arc::clone(&self.store),
            Arc::clone(&self.applier),
            Arc::clone(&self.settings),
            attempts,
        )
    }

    pub fn page_range_tracker(&self) -> PageRangeTracker {
        PageRangeTracker::new(
            self.source.clone(),
            Arc::clone(&self.settings),
            self.config.max_probe_pages,
        )
    }
}

use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use reqwest::header::USER_AGENT;
use sha2::{Digest as _, Sha256};

use crate::error::{Error, Result};
use crate::picture::PictureRecord;
use crate::settings::SettingsStore;
use crate::source::CLIENT_USER_AGENT;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Screen {
    pub id: String,
}

impl Screen {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

/// The OS surface that shows wallpapers.
pub trait Desktop: Send + Sync {
    fn screens(&self) -> Vec<Screen>;
    fn set_wallpaper(&self, screen: &Screen, path: &Path) -> Result<()>;
}

/// Sets the wallpaper through the `wallpaper` crate, which covers every
/// display and workspace in one call.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemDesktop;

impl Desktop for SystemDesktop {
    fn screens(&self) -> Vec<Screen> {
        vec![Screen::new("all")]
    }

    fn set_wallpaper(&self, screen: &Screen, path: &Path) -> Result<()> {
        let path_str = path.to_str().ok_or_else(|| Error::Platform {
            screen: screen.id.clone(),
            message: format!("path is not valid UTF-8: {}", path.display()),
        })?;
        wallpaper::set_from_path(path_str).map_err(|err| Error::Platform {
            screen: screen.id.clone(),
            message: err.to_string(),
        })
    }
}

/// Delegates to an external setter such as `feh --bg-fill`; the image path
/// becomes the final argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandDesktop {
    program: String,
    args: Vec<String>,
}

impl CommandDesktop {
    /// Splits `command` on whitespace; quoting is not interpreted.
    pub fn parse(command: &str) -> Option<Self> {
        let mut parts = command.split_whitespace().map(str::to_owned);
        let program = parts.next()?;
        Some(Self {
            program,
            args: parts.collect(),
        })
    }

    /// Appends arguments as given, spaces included.
    #[must_use]
    pub fn with_args(mut self, args: impl IntoIterator<Item = String>) -> Self {
        self.args.extend(args);
        self
    }
}

impl Desktop for CommandDesktop {
    fn screens(&self) -> Vec<Screen> {
        vec![Screen::new("all")]
    }

    fn set_wallpaper(&self, screen: &Screen, path: &Path) -> Result<()> {
        tracing::debug!(program = %self.program, args = ?self.args, path = %path.display(), "running wallpaper command");
        let status = std::process::Command::new(&self.program)
            .args(&self.args)
            .arg(path)
            .stdin(std::process::Stdio::null())
            .stdout(std::process::Stdio::null())
            .status()
            .map_err(|err| Error::Platform {
                screen: screen.id.clone(),
                message: format!("spawn {}: {err}", self.program),
            })?;
        if !status.success() {
            return Err(Error::Platform {
                screen: screen.id.clone(),
                message: format!("{} failed ({status})", self.program),
            });
        }
        Ok(())
    }
}

pub struct WallpaperApplier {
    client: reqwest::Client,
    dir: PathBuf,
    desktop: Arc<dyn Desktop>,
    settings: Arc<SettingsStore>,
}

impl WallpaperApplier {
    pub fn new(
        client: reqwest::Client,
        dir: impl Into<PathBuf>,
        desktop: Arc<dyn Desktop>,
        settings: Arc<SettingsStore>,
    ) -> Self {
        Self {
            client,
            dir: dir.into(),
            desktop,
            settings,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn local_path(&self, record: &PictureRecord) -> PathBuf {
        self.dir.join(file_name_for(record))
    }

    /// Makes sure the full image is on disk, then shows it on every screen.
    pub async fn apply(&self, record: &PictureRecord) -> Result<PathBuf> {
        let path = self.local_path(record);
        if file_exists(&path).await? {
            tracing::debug!(path = %path.display(), "using cached wallpaper");
        } else {
            self.download(&record.url, &path).await?;
        }

        self.set_on_all_screens(&path).await?;
        tracing::info!(url = %record.url, path = %path.display(), "wallpaper applied");

        let remembered = path.clone();
        if let Err(err) = self
            .settings
            .update(move |settings| settings.last_wallpaper = Some(remembered))
            .await
        {
            tracing::warn!(?err, "failed to remember applied wallpaper");
        }
        Ok(path)
    }

    /// Shows the last applied wallpaper again, e.g. after the visible
    /// workspaces changed.
    pub async fn reapply_last(&self) -> Result<PathBuf> {
        let last = self.settings.load().await?.last_wallpaper.ok_or_else(|| {
            Error::file_io(
                &self.dir,
                std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "no wallpaper has been applied yet",
                ),
            )
        })?;
        if !file_exists(&last).await? {
            return Err(Error::file_io(
                &last,
                std::io::Error::new(std::io::ErrorKind::NotFound, "wallpaper file is missing"),
            ));
        }

        self.set_on_all_screens(&last).await?;
        tracing::info!(path = %last.display(), "wallpaper reapplied");
        Ok(last)
    }

    /// Removes every downloaded wallpaper and returns the bytes freed.
    pub async fn clear_cache(&self) -> Result<u64> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(err) => return Err(Error::file_io(&self.dir, err)),
        };

        let mut freed = 0_u64;
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|err| Error::file_io(&self.dir, err))?
        {
            let path = entry.path();
            let metadata = entry
                .metadata()
                .await
                .map_err(|err| Error::file_io(&path, err))?;
            if !metadata.is_file() {
                continue;
            }
            tokio::fs::remove_file(&path)
                .await
                .map_err(|err| Error::file_io(&path, err))?;
            freed += metadata.len();
        }
        Ok(freed)
    }

    async fn download(&self, url: &str, path: &Path) -> Result<()> {
        tracing::info!(url, "downloading wallpaper");
        let response = self
            .client
            .get(url)
            .header(USER_AGENT, CLIENT_USER_AGENT)
            .send()
            .await
            .map_err(|err| Error::network(url, err))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::network(url, format!("unexpected status {status}")));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|err| Error::network(url, err))?;
        if bytes.is_empty() {
            return Err(Error::file_io(
                path,
                std::io::Error::new(std::io::ErrorKind::InvalidData, "downloaded image is empty"),
            ));
        }

        let dir = self.dir.clone();
        let target = path.to_path_buf();
        tokio::task::spawn_blocking(move || write_file_atomic(&dir, &target, &bytes))
            .await
            .map_err(|err| Error::file_io(path, std::io::Error::other(err)))?
    }

    async fn set_on_all_screens(&self, path: &Path) -> Result<()> {
        let desktop = Arc::clone(&self.desktop);
        let path = path.to_path_buf();
        tokio::task::spawn_blocking(move || {
            let screens = desktop.screens();
            if screens.is_empty() {
                return Err(Error::Platform {
                    screen: "none".to_owned(),
                    message: "no screens attached".to_owned(),
                });
            }
            for screen in &screens {
                desktop.set_wallpaper(screen, &path)?;
            }
            Ok(())
        })
        .await
        .map_err(|err| Error::Platform {
            screen: "all".to_owned(),
            message: err.to_string(),
        })?
    }
}

async fn file_exists(path: &Path) -> Result<bool> {
    tokio::fs::try_exists(path)
        .await
        .map_err(|err| Error::file_io(path, err))
}

fn write_file_atomic(dir: &Path, path: &Path, bytes: &[u8]) -> Result<()> {
    std::fs::create_dir_all(dir).map_err(|err| Error::file_io(dir, err))?;
    let mut tmp = tempfile::Builder::new()
        .prefix(".download-")
        .tempfile_in(dir)
        .map_err(|err| Error::file_io(dir, err))?;
    tmp.write_all(bytes)
        .map_err(|err| Error::file_io(tmp.path(), err))?;
    tmp.persist(path)
        .map_err(|err| Error::file_io(path, err.error))?;
    Ok(())
}

/// File name of the local copy of `record`: the sanitized picture name with
/// a short digest of the full URL before the extension, so pictures that
/// share a name never share a file.
pub fn file_name_for(record: &PictureRecord) -> String {
    let candidate = record
        .name
        .clone()
        .or_else(|| {
            url::Url::parse(&record.url).ok().and_then(|url| {
                url.path_segments()
                    .and_then(|mut segments| segments.next_back().map(str::to_owned))
            })
        })
        .unwrap_or_default();

    let sanitized = candidate
        .chars()
        .map(|ch| match ch {
            '/' | '\\' | ':' | '\0' => '_',
            ch if ch.is_control() => '_',
            ch => ch,
        })
        .collect::<String>();
    let sanitized = sanitized.trim_start_matches('.').trim();

    let digest = url_digest(&record.url);
    if sanitized.is_empty() {
        return format!("{}-{digest}", record.id);
    }
    match sanitized.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => {
            format!("{stem}-{digest}.{ext}")
        }
        _ => format!("{sanitized}-{digest}"),
    }
}

fn url_digest(url: &str) -> String {
    let hash = Sha256::digest(url.as_bytes());
    hex::encode(&hash[..6])
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

/// Thumbnail suffix appended to every full-size image URL on the listing pages.
pub const PREVIEW_SUFFIX: &str = ".295x184_q100.png";

/// Path segment after which the picture name starts.
pub const DEFAULT_NAME_MARKER: &str = "wallpapers";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PictureInfo {
    pub name: String,
    pub preview_url: String,
    pub url: String,
}

impl PictureInfo {
    /// Maps a scraped thumbnail link into a picture descriptor.
    ///
    /// Returns `None` when the link does not carry [`PREVIEW_SUFFIX`] or is not an
    /// absolute URL.
    pub fn from_preview_link(link: &str, marker: &str) -> Option<Self> {
        let full = full_url_from_preview(link)?;
        let parsed = Url::parse(full).ok()?;
        let name = name_from_path(&parsed, marker)?;

        Some(Self {
            name,
            preview_url: link.to_owned(),
            url: full.to_owned(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PictureRecord {
    pub id: Uuid,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview_url: Option<String>,
    pub last_fetched_time: DateTime<Utc>,
}

impl PictureRecord {
    pub fn new(info: &PictureInfo, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            url: info.url.clone(),
            name: non_empty(&info.name),
            preview_url: non_empty(&info.preview_url),
            last_fetched_time: now,
        }
    }

    /// Refreshes the fetch time and fills in fields that were never set.
    pub fn touch(&mut self, info: &PictureInfo, now: DateTime<Utc>) {
        self.last_fetched_time = if now > self.last_fetched_time {
            now
        } else {
            self.last_fetched_time + chrono::Duration::microseconds(1)
        };
        if self.name.is_none() {
            self.name = non_empty(&info.name);
        }
        if self.preview_url.is_none() {
            self.preview_url = non_empty(&info.preview_url);
        }
    }
}

pub fn full_url_from_preview(preview_url: &str) -> Option<&str> {
    preview_url
        .strip_suffix(PREVIEW_SUFFIX)
        .filter(|full| !full.is_empty())
}

pub fn preview_url_from_full(url: &str) -> String {
    format!("{url}{PREVIEW_SUFFIX}")
}

fn name_from_path(url: &Url, marker: &str) -> Option<String> {
    let segments = url
        .path_segments()?
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>();

    let after_marker = segments
        .iter()
        .position(|segment| *segment == marker)
        .map(|idx| &segments[idx + 1..])
        .filter(|rest| !rest.is_empty());

    match after_marker {
        Some(rest) => Some(rest.join("-")),
        None => segments.last().map(|segment| (*segment).to_owned()),
    }
}

fn non_empty(value: &str) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value.to_owned())
    }
}

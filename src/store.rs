use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::error::Result;
use crate::json_file::{read_json, write_json_atomic};
use crate::picture::{PictureInfo, PictureRecord};

#[async_trait]
pub trait PictureStore: Send + Sync {
    /// Creates or refreshes the record for `info.url`. Never fails: storage
    /// problems are logged and the in-memory record is returned.
    async fn upsert(&self, info: &PictureInfo) -> PictureRecord;
    async fn get(&self, url: &str) -> Result<Option<PictureRecord>>;
    /// All records, most recently fetched first.
    async fn list(&self) -> Result<Vec<PictureRecord>>;
    async fn delete(&self, url: &str) -> Result<bool>;

    /// The most recently fetched record.
    async fn latest(&self) -> Result<Option<PictureRecord>> {
        Ok(self.list().await?.into_iter().next())
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct PictureFile {
    pictures: Vec<PictureRecord>,
}

/// Picture records kept in one JSON document under the data directory.
///
/// Every operation reads the document afresh, so changes made by another
/// process (`wallfetch forget` next to a running daemon) are never
/// overwritten with a stale copy.
#[derive(Debug)]
pub struct LocalFsPictureStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl LocalFsPictureStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<Vec<PictureRecord>> {
        let file: PictureFile = read_json(&self.path).await?.unwrap_or_default();
        Ok(file.pictures)
    }

    async fn save(&self, pictures: Vec<PictureRecord>) -> Result<()> {
        write_json_atomic(&self.path, &PictureFile { pictures }).await
    }
}

#[async_trait]
impl PictureStore for LocalFsPictureStore {
    async fn upsert(&self, info: &PictureInfo) -> PictureRecord {
        let now = Utc::now();
        let _guard = self.lock.lock().await;

        let mut pictures = match self.load().await {
            Ok(pictures) => pictures,
            Err(err) => {
                tracing::warn!(path = %self.path.display(), ?err, "picture store unavailable; record not saved");
                return PictureRecord::new(info, now);
            }
        };

        let record = match pictures.iter_mut().find(|record| record.url == info.url) {
            Some(existing) => {
                existing.touch(info, now);
                existing.clone()
            }
            None => {
                let record = PictureRecord::new(info, now);
                tracing::debug!(url = %record.url, id = %record.id, "new picture record");
                pictures.push(record.clone());
                record
            }
        };

        if let Err(err) = self.save(pictures).await {
            tracing::warn!(path = %self.path.display(), ?err, "failed to save picture records");
        }
        record
    }

    async fn get(&self, url: &str) -> Result<Option<PictureRecord>> {
        let _guard = self.lock.lock().await;
        Ok(self
            .load()
            .await?
            .into_iter()
            .find(|record| record.url == url))
    }

    async fn list(&self) -> Result<Vec<PictureRecord>> {
        let _guard = self.lock.lock().await;
        let mut pictures = self.load().await?;
        pictures.sort_by(|a, b| b.last_fetched_time.cmp(&a.last_fetched_time));
        Ok(pictures)
    }

    async fn delete(&self, url: &str) -> Result<bool> {
        let _guard = self.lock.lock().await;
        let mut pictures = self.load().await?;

        let before = pictures.len();
        pictures.retain(|record| record.url != url);
        if pictures.len() == before {
            return Ok(false);
        }
        self.save(pictures).await?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(url: &str, name: &str) -> PictureInfo {
        PictureInfo {
            name: name.to_owned(),
            preview_url: format!("{url}.295x184_q100.png"),
            url: url.to_owned(),
        }
    }

    #[tokio::test]
    async fn upserting_same_url_keeps_one_record() {
        let temp = tempfile::TempDir::new().unwrap();
        let store = LocalFsPictureStore::new(temp.path().join("pictures.json"));
        let picture = info("https://cdn.example.com/media/wallpapers/a.jpg", "a.jpg");

        let first = store.upsert(&picture).await;
        let second = store.upsert(&picture).await;

        assert_eq!(first.id, second.id);
        assert!(second.last_fetched_time > first.last_fetched_time);
        assert_eq!(store.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn upsert_backfills_missing_name_without_overwriting() {
        let temp = tempfile::TempDir::new().unwrap();
        let store = LocalFsPictureStore::new(temp.path().join("pictures.json"));
        let url = "https://cdn.example.com/media/wallpapers/b.jpg";

        let created = store.upsert(&info(url, "")).await;
        assert_eq!(created.name, None);

        let backfilled = store.upsert(&info(url, "b.jpg")).await;
        assert_eq!(backfilled.name.as_deref(), Some("b.jpg"));

        let kept = store.upsert(&info(url, "renamed.jpg")).await;
        assert_eq!(kept.name.as_deref(), Some("b.jpg"));
    }

    #[tokio::test]
    async fn records_survive_reopen() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("pictures.json");
        let url = "https://cdn.example.com/media/wallpapers/c.jpg";

        let created = LocalFsPictureStore::new(&path).upsert(&info(url, "c.jpg")).await;

        let reopened = LocalFsPictureStore::new(&path);
        let loaded = reopened.get(url).await.unwrap().unwrap();
        assert_eq!(loaded, created);
    }

    #[tokio::test]
    async fn list_is_most_recent_first_and_delete_removes() {
        let temp = tempfile::TempDir::new().unwrap();
        let store = LocalFsPictureStore::new(temp.path().join("pictures.json"));
        let a = "https://cdn.example.com/media/wallpapers/a.jpg";
        let b = "https://cdn.example.com/media/wallpapers/b.jpg";

        store.upsert(&info(a, "a.jpg")).await;
        store.upsert(&info(b, "b.jpg")).await;
        store.upsert(&info(a, "a.jpg")).await;

        let urls = store
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|record| record.url)
            .collect::<Vec<_>>();
        assert_eq!(urls, vec![a.to_owned(), b.to_owned()]);

        assert!(store.delete(a).await.unwrap());
        assert!(!store.delete(a).await.unwrap());
        assert!(store.get(a).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn unreadable_store_still_returns_record() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("pictures.json");
        std::fs::write(&path, "not json").unwrap();
        let store = LocalFsPictureStore::new(&path);

        let record = store
            .upsert(&info("https://cdn.example.com/media/wallpapers/d.jpg", "d.jpg"))
            .await;
        assert_eq!(record.name.as_deref(), Some("d.jpg"));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "not json");
    }

    #[tokio::test]
    async fn deletion_by_another_instance_is_not_undone() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("pictures.json");
        let a = "https://cdn.example.com/media/wallpapers/a.jpg";
        let b = "https://cdn.example.com/media/wallpapers/b.jpg";

        let daemon = LocalFsPictureStore::new(&path);
        daemon.upsert(&info(a, "a.jpg")).await;

        let cli = LocalFsPictureStore::new(&path);
        assert!(cli.delete(a).await.unwrap());

        daemon.upsert(&info(b, "b.jpg")).await;

        let urls = LocalFsPictureStore::new(&path)
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|record| record.url)
            .collect::<Vec<_>>();
        assert_eq!(urls, vec![b.to_owned()]);
        assert!(daemon.get(a).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn latest_is_most_recently_fetched() {
        let temp = tempfile::TempDir::new().unwrap();
        let store = LocalFsPictureStore::new(temp.path().join("pictures.json"));
        assert!(store.latest().await.unwrap().is_none());

        let a = "https://cdn.example.com/media/wallpapers/a.jpg";
        let b = "https://cdn.example.com/media/wallpapers/b.jpg";
        store.upsert(&info(a, "a.jpg")).await;
        store.upsert(&info(b, "b.jpg")).await;
        assert_eq!(store.latest().await.unwrap().unwrap().url, b);

        store.upsert(&info(a, "a.jpg")).await;
        assert_eq!(store.latest().await.unwrap().unwrap().url, a);
    }
}

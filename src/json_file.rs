use std::path::Path;

use tokio::fs;

use crate::error::{Error, Result};

/// Reads a JSON document, treating a missing file as `None`.
pub async fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    let bytes = match fs::read(path).await {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(Error::persistence(path, err)),
    };
    let value = serde_json::from_slice(&bytes).map_err(|err| Error::persistence(path, err))?;
    Ok(Some(value))
}

/// Writes `value` next to `path` and renames it into place.
pub async fn write_json_atomic<T: serde::Serialize>(path: &Path, value: &T) -> Result<()> {
    let parent = path
        .parent()
        .ok_or_else(|| Error::persistence(path, "path has no parent"))?;
    fs::create_dir_all(parent)
        .await
        .map_err(|err| Error::persistence(parent, err))?;

    let tmp_path = path.with_extension(format!("tmp.{}", uuid::Uuid::new_v4().simple()));
    let data = serde_json::to_vec_pretty(value).map_err(|err| Error::persistence(path, err))?;
    fs::write(&tmp_path, &data)
        .await
        .map_err(|err| Error::persistence(&tmp_path, err))?;
    if let Err(err) = fs::rename(&tmp_path, path).await {
        let _ = fs::remove_file(&tmp_path).await;
        return Err(Error::persistence(path, err));
    }
    Ok(())
}

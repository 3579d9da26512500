use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use tracing::{info, warn};

use super::{StorageError, StorageProvider, UploadFile, UploadLimits, object_name, prepare_blocking};

/// URL prefix under which `main` serves the storage root.
pub const PUBLIC_PREFIX: &str = "/uploads/";

pub struct LocalStorage {
    root: PathBuf,
    limits: UploadLimits,
}

impl LocalStorage {
    pub fn new(root: PathBuf, limits: UploadLimits) -> Self {
        Self { root, limits }
    }

    /// Path under the root for a `/uploads/...` URL. Rejects anything that
    /// could escape the root.
    fn path_for_url(&self, url: &str) -> Result<PathBuf, StorageError> {
        let key = url
            .strip_prefix(PUBLIC_PREFIX)
            .ok_or_else(|| StorageError::InvalidKey(url.to_string()))?;
        let relative = Path::new(key);
        let safe = !key.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !safe {
            return Err(StorageError::InvalidKey(url.to_string()));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl StorageProvider for LocalStorage {
    async fn upload(&self, file: UploadFile, folder: &str) -> Result<String, StorageError> {
        let file = prepare_blocking(file, self.limits).await?;
        let folder = folder.trim_matches('/');
        let name = object_name(&file.filename);

        let dir = self.root.join(folder);
        tokio::fs::create_dir_all(&dir).await?;
        tokio::fs::write(dir.join(&name), &file.bytes).await?;

        let url = format!("{PUBLIC_PREFIX}{folder}/{name}");
        info!(url = %url, bytes = file.bytes.len(), "Stored file locally");
        Ok(url)
    }

    async fn delete(&self, url: &str) -> Result<(), StorageError> {
        let path = self.path_for_url(url)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                warn!(path = %path.display(), "File already gone");
                Ok(())
            }
            Err(err) => Err(err.into()),
        }
    }

    fn limits(&self) -> UploadLimits {
        self.limits
    }
}

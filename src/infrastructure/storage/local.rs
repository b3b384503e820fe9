use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;

use super::{validate_object_path, ObjectStorage, StorageError, StoredObject};

/// Filesystem-backed buckets under a root directory, served back through the
/// `/media/{bucket}/{path}` route.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root: PathBuf,
    public_base_url: String,
}

impl LocalStorage {
    pub fn new(root: impl Into<PathBuf>, public_base_url: &str) -> Self {
        LocalStorage {
            root: root.into(),
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Absolute location of an object, after rejecting traversal attempts.
    pub fn resolve(&self, bucket: &str, path: &str) -> Result<PathBuf, StorageError> {
        validate_object_path(bucket)?;
        validate_object_path(path)?;
        Ok(self.root.join(bucket).join(path))
    }

    pub async fn read(&self, bucket: &str, path: &str) -> Result<Vec<u8>, StorageError> {
        let location = self.resolve(bucket, path)?;
        fs::read(&location).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => StorageError::NotFound(format!("{bucket}/{path}")),
            _ => StorageError::Io(e.to_string()),
        })
    }
}

#[async_trait]
impl ObjectStorage for LocalStorage {
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        _content_type: &str,
    ) -> Result<StoredObject, StorageError> {
        let location = self.resolve(bucket, path)?;

        if let Some(parent) = location.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| StorageError::Upload(e.to_string()))?;
        }

        // Same no-overwrite semantics as the hosted bucket.
        if fs::try_exists(&location).await.unwrap_or(false) {
            return Err(StorageError::Upload(format!("{bucket}/{path} already exists")));
        }

        fs::write(&location, bytes)
            .await
            .map_err(|e| StorageError::Upload(e.to_string()))?;

        tracing::debug!(bucket, path, "Stored object on local filesystem");

        Ok(StoredObject {
            bucket: bucket.to_string(),
            path: path.to_string(),
            public_url: self.public_url(bucket, path),
        })
    }

    async fn delete(&self, bucket: &str, path: &str) -> Result<(), StorageError> {
        let location = self.resolve(bucket, path)?;
        fs::remove_file(&location).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => StorageError::NotFound(format!("{bucket}/{path}")),
            _ => StorageError::Delete(e.to_string()),
        })
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        format!("{}/media/{}/{}", self.public_base_url, bucket, path)
    }

    fn backend_name(&self) -> &'static str {
        "local"
    }
}

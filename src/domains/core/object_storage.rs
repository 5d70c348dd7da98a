use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use std::io;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tokio::fs;

#[derive(Debug, Error)]
pub enum ObjectStorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid object key component: {0}")]
    InvalidKeyComponent(String),
    #[error("Remote storage error: {0}")]
    Remote(String),
    #[error("Unknown storage error: {0}")]
    Other(String),
}

pub type ObjectStorageResult<T> = Result<T, ObjectStorageError>;

/// Service trait abstracting the bucket-addressable object store that holds
/// export archives. Implementations confirm durability before returning from
/// `put_object`.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Store an object under `bucket` and `key`.
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> ObjectStorageResult<()>;

    /// Remove an object. Deleting a key that does not exist is not an error.
    async fn delete_object(&self, bucket: &str, key: &str) -> ObjectStorageResult<()>;
}

// --- Local Filesystem Implementation ---

/// Stores objects under `base_path/bucket/key` on the local filesystem.
/// Used outside production and by the test suite.
pub struct LocalObjectStorage {
    base_path: PathBuf,
}

impl LocalObjectStorage {
    /// Creates a new LocalObjectStorage, ensuring the base directory exists.
    pub fn new(base_path_str: &str) -> io::Result<Self> {
        let base_path = PathBuf::from(base_path_str);
        std::fs::create_dir_all(&base_path)?;
        Ok(Self { base_path })
    }

    /// Sanitizes a single path component to prevent directory traversal.
    fn sanitize_component(component: &str) -> ObjectStorageResult<&str> {
        if component.is_empty() || component.contains('/') || component.contains('\\') || component == "." || component == ".." {
            Err(ObjectStorageError::InvalidKeyComponent(component.to_string()))
        } else {
            Ok(component)
        }
    }

    /// Resolves `bucket/key` to an absolute path. Keys may contain `/`
    /// separators; every component is sanitized individually.
    fn resolve(&self, bucket: &str, key: &str) -> ObjectStorageResult<PathBuf> {
        let mut path = self.base_path.join(Self::sanitize_component(bucket)?);
        for component in key.split('/') {
            path.push(Self::sanitize_component(component)?);
        }
        Ok(path)
    }
}

#[async_trait]
impl ObjectStorage for LocalObjectStorage {
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        data: Vec<u8>,
        _content_type: &str,
    ) -> ObjectStorageResult<()> {
        let path = self.resolve(bucket, key)?;
        let parent = path
            .parent()
            .ok_or_else(|| ObjectStorageError::Other("object path has no parent directory".to_string()))?;

        fs::create_dir_all(parent).await?;
        fs::write(&path, data).await?;
        debug!("stored object at {:?}", path);
        Ok(())
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> ObjectStorageResult<()> {
        let path = self.resolve(bucket, key)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

// --- Storage Gateway Implementation ---

/// Talks to an HTTP object storage gateway: PUT/DELETE on
/// `{base_url}/{bucket}/{key}` with optional bearer authentication.
pub struct HttpObjectStorage {
    client: Client,
    base_url: String,
    api_token: Option<String>,
}

impl HttpObjectStorage {
    pub fn new(base_url: &str, api_token: Option<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_default();

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_token,
        }
    }

    fn object_url(&self, bucket: &str, key: &str) -> String {
        format!("{}/{}/{}", self.base_url, bucket, key)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_token {
            Some(token) => request.header("Authorization", format!("Bearer {}", token)),
            None => request,
        }
    }
}

#[async_trait]
impl ObjectStorage for HttpObjectStorage {
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> ObjectStorageResult<()> {
        let url = self.object_url(bucket, key);
        let response = self
            .authorize(self.client.put(&url))
            .header("Content-Type", content_type)
            .body(data)
            .send()
            .await
            .map_err(|e| ObjectStorageError::Remote(format!("Failed to store {}: {}", url, e)))?;

        if response.status().is_success() {
            debug!("stored object at {}", url);
            Ok(())
        } else {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to get error details".to_string());
            Err(ObjectStorageError::Remote(format!(
                "Storing {} failed with status {}: {}",
                url, status, error_text
            )))
        }
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> ObjectStorageResult<()> {
        let url = self.object_url(bucket, key);
        let response = self
            .authorize(self.client.delete(&url))
            .send()
            .await
            .map_err(|e| ObjectStorageError::Remote(format!("Failed to delete {}: {}", url, e)))?;

        // A missing object is already in the desired state.
        if response.status().is_success() || response.status() == reqwest::StatusCode::NOT_FOUND {
            Ok(())
        } else {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to get error details".to_string());
            Err(ObjectStorageError::Remote(format!(
                "Deleting {} failed with status {}: {}",
                url, status, error_text
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_local_put_and_delete() {
        let dir = TempDir::new().unwrap();
        let storage = LocalObjectStorage::new(dir.path().to_str().unwrap()).unwrap();

        storage
            .put_object("assets", "exports/1.zip", b"archive".to_vec(), "application/zip")
            .await
            .unwrap();
        let stored = dir.path().join("assets").join("exports").join("1.zip");
        assert_eq!(std::fs::read(&stored).unwrap(), b"archive");

        storage.delete_object("assets", "exports/1.zip").await.unwrap();
        assert!(!stored.exists());

        // Deleting again is a no-op, not an error.
        storage.delete_object("assets", "exports/1.zip").await.unwrap();
    }

    #[tokio::test]
    async fn test_local_rejects_traversal() {
        let dir = TempDir::new().unwrap();
        let storage = LocalObjectStorage::new(dir.path().to_str().unwrap()).unwrap();

        let result = storage
            .put_object("assets", "../escape.zip", b"x".to_vec(), "application/zip")
            .await;
        assert!(matches!(result, Err(ObjectStorageError::InvalidKeyComponent(_))));
    }
}

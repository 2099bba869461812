use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use url::Url;

#[derive(Debug, thiserror::Error)]
pub enum BlobError {
    #[error("blob not found: {0}")]
    NotFound(String),
    #[error("invalid blob path: {0}")]
    InvalidPath(String),
    #[error("{0}")]
    Backend(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Byte storage addressed by opaque relative paths.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn save(&self, path: &str, data: Vec<u8>, content_type: &str) -> Result<(), BlobError>;

    async fn read(&self, path: &str) -> Result<Vec<u8>, BlobError>;

    /// Public URL for a stored path. Does not check existence.
    fn url(&self, path: &str) -> String;

    async fn delete(&self, path: &str) -> Result<(), BlobError>;
}

/// Blob path for the `index`-th candidate of a generation job.
pub fn candidate_path(project_id: uuid::Uuid, job_id: uuid::Uuid, index: usize, ext: &str) -> String {
    format!("projects/{project_id}/generations/{job_id}/{index}.{ext}")
}

/// Blob path for an image imported into a project.
pub fn import_path(project_id: uuid::Uuid, asset_id: uuid::Uuid, ext: &str) -> String {
    format!("projects/{project_id}/imports/{asset_id}.{ext}")
}

/// Filesystem-backed store; files are served by the router under `/assets`.
#[derive(Clone, Debug)]
pub struct LocalBlobStore {
    root: PathBuf,
    base_url: Url,
}

impl LocalBlobStore {
    pub fn new(root: impl Into<PathBuf>, public_base_url: &str) -> Result<Self, BlobError> {
        let mut base = public_base_url.to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = Url::parse(&base)
            .and_then(|u| u.join("assets/"))
            .map_err(|e| BlobError::Backend(format!("invalid public base url {public_base_url}: {e}")))?;

        Ok(Self {
            root: root.into(),
            base_url,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> Result<PathBuf, BlobError> {
        let relative = Path::new(path);
        let clean = !path.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !clean {
            return Err(BlobError::InvalidPath(path.to_string()));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn save(&self, path: &str, data: Vec<u8>, _content_type: &str) -> Result<(), BlobError> {
        let target = self.resolve(path)?;
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&target, data).await?;
        tracing::debug!(path, "Blob saved");
        Ok(())
    }

    async fn read(&self, path: &str) -> Result<Vec<u8>, BlobError> {
        let target = self.resolve(path)?;
        match tokio::fs::read(&target).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(BlobError::NotFound(path.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn url(&self, path: &str) -> String {
        self.base_url
            .join(path)
            .map(|u| u.to_string())
            .unwrap_or_else(|_| format!("{}{}", self.base_url, path))
    }

    async fn delete(&self, path: &str) -> Result<(), BlobError> {
        let target = self.resolve(path)?;
        match tokio::fs::remove_file(&target).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

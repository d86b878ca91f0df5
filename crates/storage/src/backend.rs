use std::ops::Range;
use std::path::Path;
use std::sync::Arc;

use bytes::Bytes;
use object_store::aws::AmazonS3Builder;
use object_store::local::LocalFileSystem;
use object_store::memory::InMemory;
use object_store::path::Path as ObjectPath;
use object_store::{ObjectStore, PutPayload};
use tracing::{debug, info};

use repan_core::config::StorageConfig;

use crate::error::StorageError;

/// One bucket of object storage, wrapping object_store.
pub enum StorageBackend {
    Local(LocalBackend),
    S3(S3Backend),
    Memory(Arc<InMemory>),
}

impl StorageBackend {
    /// Select S3 (MinIO) when credentials are configured, otherwise a local
    /// directory named after the bucket under `local_dir`.
    pub fn from_config(config: &StorageConfig, bucket: &str) -> Result<Self, StorageError> {
        if config.is_configured() {
            Ok(StorageBackend::S3(S3Backend::new(config, bucket)?))
        } else {
            let dir = config.local_dir.join(bucket);
            std::fs::create_dir_all(&dir)?;
            Ok(StorageBackend::Local(LocalBackend::new(&dir)?))
        }
    }

    pub fn in_memory() -> Self {
        StorageBackend::Memory(Arc::new(InMemory::new()))
    }

    /// Get the underlying ObjectStore.
    pub fn store(&self) -> &dyn ObjectStore {
        match self {
            StorageBackend::Local(b) => b.store.as_ref(),
            StorageBackend::S3(b) => b.store.as_ref(),
            StorageBackend::Memory(store) => store.as_ref(),
        }
    }

    /// Download a whole object.
    pub async fn get_bytes(&self, key: &str) -> Result<Bytes, StorageError> {
        let path = ObjectPath::from(key);
        let data = self.store().get(&path).await?.bytes().await?;
        debug!(key, bytes = data.len(), "object fetched");
        Ok(data)
    }

    /// Object size in bytes.
    pub async fn size(&self, key: &str) -> Result<usize, StorageError> {
        let meta = self.store().head(&ObjectPath::from(key)).await?;
        Ok(meta.size)
    }

    /// Fetch a byte range of an object without downloading the rest.
    pub async fn get_range(&self, key: &str, range: Range<usize>) -> Result<Bytes, StorageError> {
        let data = self.store().get_range(&ObjectPath::from(key), range).await?;
        debug!(key, bytes = data.len(), "object range fetched");
        Ok(data)
    }

    /// Overwrite an object wholesale.
    pub async fn put_bytes(&self, key: &str, data: impl Into<Bytes>) -> Result<(), StorageError> {
        let path = ObjectPath::from(key);
        self.store().put(&path, PutPayload::from(data.into())).await?;
        debug!(key, "object written");
        Ok(())
    }

    pub async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        let path = ObjectPath::from(key);
        match self.store().head(&path).await {
            Ok(_) => Ok(true),
            Err(object_store::Error::NotFound { .. }) => Ok(false),
            Err(e) => Err(StorageError::ObjectStore(e)),
        }
    }

    /// Server-side copy within the bucket.
    pub async fn copy(&self, from: &str, to: &str) -> Result<(), StorageError> {
        self.store()
            .copy(&ObjectPath::from(from), &ObjectPath::from(to))
            .await?;
        Ok(())
    }
}

/// Local filesystem backend.
pub struct LocalBackend {
    store: Arc<dyn ObjectStore>,
}

impl LocalBackend {
    pub fn new(root: &Path) -> Result<Self, StorageError> {
        let canonical = std::fs::canonicalize(root).unwrap_or_else(|_| root.to_path_buf());
        let store = LocalFileSystem::new_with_prefix(&canonical)?;
        info!("Storage: local backend at {}", canonical.display());
        Ok(Self {
            store: Arc::new(store),
        })
    }
}

/// S3-compatible backend (MinIO in deployment).
pub struct S3Backend {
    store: Arc<dyn ObjectStore>,
}

impl S3Backend {
    pub fn new(config: &StorageConfig, bucket: &str) -> Result<Self, StorageError> {
        let access_key = config
            .access_key_id
            .as_deref()
            .ok_or_else(|| StorageError::NotConfigured("MINIO_ACCESS_KEY not set".into()))?;
        let secret_key = config
            .secret_access_key
            .as_deref()
            .ok_or_else(|| StorageError::NotConfigured("MINIO_SECRET_KEY not set".into()))?;

        let mut builder = AmazonS3Builder::new()
            .with_region(&config.region)
            .with_bucket_name(bucket)
            .with_access_key_id(access_key)
            .with_secret_access_key(secret_key);

        // Path-style addressing is the builder default, which MinIO needs.
        if let Some(endpoint_url) = config.endpoint_with_scheme() {
            builder = builder
                .with_allow_http(endpoint_url.starts_with("http://"))
                .with_endpoint(endpoint_url);
        }

        let store = builder.build()?;

        info!(
            "Storage: S3 backend s3://{} (endpoint: {})",
            bucket,
            config.endpoint_url.as_deref().unwrap_or("aws")
        );

        Ok(Self {
            store: Arc::new(store),
        })
    }
}

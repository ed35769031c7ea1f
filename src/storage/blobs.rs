//! Blob storage client
//!
//! Addressable byte blobs: the encrypted wallet file, its timestamped
//! backups, and the mirror project used by the remote delegate. The backends
//! are external collaborators; a file-backed implementation ships here.

use async_trait::async_trait;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::StorageError;

#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Fetch a blob; `Ok(None)` when nothing exists at the location.
    async fn get(&self, location: &str) -> Result<Option<Vec<u8>>, StorageError>;

    /// Write a blob, overwriting any existing content at the location.
    async fn put(&self, location: &str, bytes: &[u8]) -> Result<(), StorageError>;
}

/// Opens the secondary storage project from a staged service-account
/// credential file. The caller owns the credential file's lifetime.
#[async_trait]
pub trait MirrorStoreFactory: Send + Sync {
    async fn connect(&self, credential_path: &Path) -> Result<Arc<dyn BlobStore>, StorageError>;
}

/// Blobs as files under a root directory. Locations may contain `/`
/// separators; parent directories are created on write.
#[derive(Clone)]
pub struct FileBlobStore {
    root: PathBuf,
}

impl FileBlobStore {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    fn blob_path(&self, location: &str) -> PathBuf {
        self.root.join(location)
    }
}

#[async_trait]
impl BlobStore for FileBlobStore {
    async fn get(&self, location: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let path = self.blob_path(location);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(fs::read(path)?))
    }

    async fn put(&self, location: &str, bytes: &[u8]) -> Result<(), StorageError> {
        let path = self.blob_path(location);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, bytes)?;
        Ok(())
    }
}

/// Credential file for the file-backed mirror: a JSON document naming the
/// root directory of the mirror project.
#[derive(serde::Deserialize)]
struct FileMirrorCredential {
    root: PathBuf,
}

/// Mirror factory for file-backed deployments and tests.
pub struct FileMirrorFactory;

#[async_trait]
impl MirrorStoreFactory for FileMirrorFactory {
    async fn connect(&self, credential_path: &Path) -> Result<Arc<dyn BlobStore>, StorageError> {
        let contents = fs::read_to_string(credential_path)?;
        let credential: FileMirrorCredential = serde_json::from_str(&contents)?;
        Ok(Arc::new(FileBlobStore::new(credential.root)))
    }
}

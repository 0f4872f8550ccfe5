//! Key/value blob storage used for reading category descriptors and writing label files.
//!
//! Keys are '/'-separated paths relative to the bucket root. Writes overwrite any
//! existing blob under the same key.

use dashmap::DashMap;
use log::debug;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::StorageError;

/// An object store addressed by string keys.
pub trait BlobStore: Send + Sync {
    /// Store `body` under `key`, replacing any previous blob.
    fn put(&self, key: &str, body: &[u8]) -> Result<(), StorageError>;

    /// Fetch the blob stored under `key`.
    fn get(&self, key: &str) -> Result<Vec<u8>, StorageError>;
}

/// A bucket backed by a local directory.
#[derive(Debug, Clone)]
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> PathBuf {
        key.split('/')
            .filter(|part| !part.is_empty())
            .fold(self.root.clone(), |path, part| path.join(part))
    }
}

impl BlobStore for LocalStore {
    fn put(&self, key: &str, body: &[u8]) -> Result<(), StorageError> {
        let path = self.path_for(key);
        let write = || -> std::io::Result<()> {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&path, body)
        };
        write().map_err(|source| StorageError::Write {
            key: key.to_string(),
            source,
        })?;
        debug!("Wrote {} bytes to {}", body.len(), path.display());
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        fs::read(self.path_for(key)).map_err(|source| match source.kind() {
            ErrorKind::NotFound => StorageError::NotFound {
                key: key.to_string(),
            },
            _ => StorageError::Read {
                key: key.to_string(),
                source,
            },
        })
    }
}

/// An in-memory bucket, safe to write from many threads at once.
#[derive(Debug, Default)]
pub struct MemoryStore {
    blobs: DashMap<String, Vec<u8>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }

    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.blobs.iter().map(|entry| entry.key().clone()).collect();
        keys.sort();
        keys
    }

    /// The blob under `key` decoded as UTF-8, if present.
    pub fn get_string(&self, key: &str) -> Option<String> {
        self.blobs
            .get(key)
            .map(|blob| String::from_utf8_lossy(blob.value()).into_owned())
    }
}

impl BlobStore for MemoryStore {
    fn put(&self, key: &str, body: &[u8]) -> Result<(), StorageError> {
        self.blobs.insert(key.to_string(), body.to_vec());
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        self.blobs
            .get(key)
            .map(|blob| blob.value().clone())
            .ok_or_else(|| StorageError::NotFound {
                key: key.to_string(),
            })
    }
}

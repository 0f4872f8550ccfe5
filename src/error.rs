//! Error types for every stage of the conversion pipeline.

use std::path::PathBuf;
use thiserror::Error;

/// A raw annotation row that could not be normalized.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TransformError {
    #[error("row {row} ({image_file}): category '{category}' is not in the category list")]
    CategoryNotFound {
        row: usize,
        image_file: String,
        category: String,
    },

    #[error("row {row} ({image_file}): invalid {field} = {value}")]
    InvalidDimension {
        row: usize,
        image_file: String,
        field: &'static str,
        value: f64,
    },
}

/// Failures reported by a [`crate::storage::BlobStore`].
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("blob '{key}' not found")]
    NotFound { key: String },

    #[error("failed to write blob '{key}': {source}")]
    Write {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read blob '{key}': {source}")]
    Read {
        key: String,
        #[source]
        source: std::io::Error,
    },
}

impl StorageError {
    /// The key the failed operation was addressed to.
    pub fn key(&self) -> &str {
        match self {
            StorageError::NotFound { key }
            | StorageError::Write { key, .. }
            | StorageError::Read { key, .. } => key,
        }
    }
}

#[derive(Debug, Error)]
pub enum CategoryError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("malformed category descriptor '{key}': {reason}")]
    Descriptor { key: String, reason: String },

    #[error("category list is empty")]
    Empty,

    #[error("category '{0}' appears more than once")]
    Duplicate(String),
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to open annotation table {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed annotation table: {0}")]
    Csv(#[from] csv::Error),
}

#[derive(Debug, Error)]
pub enum WriteError {
    #[error("images '{first}' and '{second}' both map to label key '{key}'")]
    KeyCollision {
        key: String,
        first: String,
        second: String,
    },

    #[error("failed to build write pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Umbrella error returned by [`crate::process_dataset`].
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Category(#[from] CategoryError),

    #[error(transparent)]
    Transform(#[from] TransformError),

    #[error(transparent)]
    Write(#[from] WriteError),

    #[error("invalid configuration: {0}")]
    Config(String),
}

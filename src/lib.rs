//! Ground-truth annotation table to YOLO converter
//!
//! This library turns a table of pixel-space bounding boxes into one YOLO label file per
//! image and writes the files to a key/value blob store.

pub mod categories;
pub mod config;
pub mod conversion;
pub mod error;
pub mod io;
pub mod storage;
pub mod types;
pub mod utils;
pub mod yolo_dataset;

// Re-export commonly used types and functions
pub use categories::{fetch_categories, resolve_categories};
pub use config::{Args, CategorySource, Config, StemPolicy};
pub use conversion::transform;
pub use error::{CategoryError, Error, LoadError, StorageError, TransformError, WriteError};
pub use io::load_annotation_table;
pub use storage::{BlobStore, LocalStore, MemoryStore};
pub use types::{NormalizedAnnotation, RawAnnotation, WriteReport};
pub use yolo_dataset::{process_dataset, write_label_files, LabelTarget};

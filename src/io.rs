use log::info;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use crate::error::{LoadError, StorageError};
use crate::storage::BlobStore;
use crate::types::RawAnnotation;
use crate::utils::join_key;

pub const DATASET_YAML: &str = "dataset.yaml";

/// Load the ground-truth box table from a CSV file with a header row
pub fn load_annotation_table(path: &Path) -> Result<Vec<RawAnnotation>, LoadError> {
    let file = File::open(path).map_err(|source| LoadError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let records = read_annotation_table(BufReader::new(file))?;
    info!(
        "Read {} annotations from {}",
        records.len(),
        path.display()
    );
    Ok(records)
}

/// Parse CSV rows into annotations; columns are matched by header name and extra columns are ignored.
/// Image and category names are taken exactly as written.
pub fn read_annotation_table<R: Read>(reader: R) -> Result<Vec<RawAnnotation>, LoadError> {
    let records = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(reader)
        .deserialize()
        .collect::<Result<Vec<RawAnnotation>, _>>()?;
    Ok(records)
}

/// Write dataset.yaml listing the class names in index order
pub fn create_dataset_yaml(
    store: &dyn BlobStore,
    prefix: &str,
    categories: &[String],
) -> Result<String, StorageError> {
    let mut yaml_content = format!("nc: {}\nnames:\n", categories.len());
    for (id, label) in categories.iter().enumerate() {
        yaml_content.push_str(&format!("    {}: {}\n", id, label));
    }

    let key = join_key(prefix, DATASET_YAML);
    store.put(&key, yaml_content.as_bytes())?;
    Ok(key)
}

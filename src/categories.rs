//! Ordered category lists. The position of a name in the list is its YOLO class index.

use log::info;
use serde::Deserialize;
use std::collections::HashSet;

use crate::config::CategorySource;
use crate::error::CategoryError;
use crate::storage::BlobStore;

// First line of a Ground Truth annotation-tool descriptor
#[derive(Debug, Deserialize)]
struct Descriptor {
    labels: Vec<DescriptorLabel>,
}

#[derive(Debug, Deserialize)]
struct DescriptorLabel {
    label: String,
}

/// Read the ordered category names from a labeling-job descriptor stored under `descriptor_key`.
pub fn fetch_categories(
    store: &dyn BlobStore,
    descriptor_key: &str,
) -> Result<Vec<String>, CategoryError> {
    let blob = store.get(descriptor_key)?;
    let text = String::from_utf8_lossy(&blob);
    let line = text.lines().next().unwrap_or_default();

    let descriptor: Descriptor =
        serde_json::from_str(line).map_err(|e| CategoryError::Descriptor {
            key: descriptor_key.to_string(),
            reason: e.to_string(),
        })?;

    let categories: Vec<String> = descriptor
        .labels
        .into_iter()
        .map(|label| label.label)
        .collect();
    validate_categories(&categories)?;
    Ok(categories)
}

/// Reject lists that cannot define a class index mapping.
pub fn validate_categories(categories: &[String]) -> Result<(), CategoryError> {
    if categories.is_empty() {
        return Err(CategoryError::Empty);
    }
    let mut seen = HashSet::with_capacity(categories.len());
    for category in categories {
        if !seen.insert(category.as_str()) {
            return Err(CategoryError::Duplicate(category.clone()));
        }
    }
    Ok(())
}

/// Produce the category list for a run.
pub fn resolve_categories(
    source: &CategorySource,
    store: &dyn BlobStore,
) -> Result<Vec<String>, CategoryError> {
    let categories = match source {
        CategorySource::Labels(labels) => {
            validate_categories(labels)?;
            labels.clone()
        }
        CategorySource::Descriptor(key) => {
            info!("Reading categories from {}", key);
            fetch_categories(store, key)?
        }
    };
    info!("Labels used in Ground Truth job: {:?}", categories);
    Ok(categories)
}

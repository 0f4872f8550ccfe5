use serde::{de, Deserialize, Deserializer, Serialize};
use std::collections::BTreeSet;

use crate::error::StorageError;

// One ground-truth bounding box in pixel coordinates, as read from the annotation table
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RawAnnotation {
    pub image_file: String,
    pub category: String,
    #[serde(deserialize_with = "trimmed_f64")]
    pub box_left: f64,
    #[serde(deserialize_with = "trimmed_f64")]
    pub box_top: f64,
    #[serde(deserialize_with = "trimmed_f64")]
    pub box_width: f64,
    #[serde(deserialize_with = "trimmed_f64")]
    pub box_height: f64,
    #[serde(deserialize_with = "trimmed_f64")]
    pub img_width: f64,
    #[serde(deserialize_with = "trimmed_f64")]
    pub img_height: f64,
}

// Numeric cells may carry padding; text cells are kept verbatim
fn trimmed_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let cell = String::deserialize(deserializer)?;
    cell.trim()
        .parse()
        .map_err(|e| de::Error::custom(format!("invalid number '{}': {}", cell, e)))
}

// One box in YOLO layout: class index plus centre/size normalized by the image dimensions
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct NormalizedAnnotation {
    pub image_file: String,
    pub class_index: usize,
    pub center_x: f64,
    pub center_y: f64,
    pub norm_width: f64,
    pub norm_height: f64,
}

/// Outcome of writing the label blobs of one run.
#[derive(Debug, Default)]
pub struct WriteReport {
    pub written: BTreeSet<String>,
    pub failed: Vec<StorageError>,
    pub total_annotations: usize,
    pub dataset_yaml: Option<String>,
    pub dataset_yaml_error: Option<StorageError>,
}

impl WriteReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn total_images(&self) -> usize {
        self.written.len() + self.failed.len()
    }

    pub fn is_complete(&self) -> bool {
        self.failed.is_empty() && self.dataset_yaml_error.is_none()
    }

    pub fn failed_keys(&self) -> BTreeSet<&str> {
        self.failed.iter().map(StorageError::key).collect()
    }

    pub fn print_summary(&self) {
        log::info!("=== Processing Summary ===");
        log::info!("Annotations converted: {}", self.total_annotations);
        log::info!("Images processed: {}", self.total_images());
        log::info!("Label files written: {}", self.written.len());
        if let Some(key) = &self.dataset_yaml {
            log::info!("Dataset descriptor: {}", key);
        }

        if let Some(error) = &self.dataset_yaml_error {
            log::warn!("Dataset descriptor not written: {}", error);
        }

        if !self.failed.is_empty() {
            log::warn!("Failed label files: {}", self.failed.len());
            for error in &self.failed {
                log::warn!("  {}", error);
            }
        }
    }
}

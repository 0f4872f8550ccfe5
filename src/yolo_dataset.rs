use log::{info, warn};
use rayon::prelude::*;
use std::collections::{BTreeMap, HashMap};

use crate::categories::resolve_categories;
use crate::config::{Config, StemPolicy};
use crate::conversion::{convert_to_yolo_format, transform};
use crate::error::{Error, StorageError, WriteError};
use crate::io::{create_dataset_yaml, load_annotation_table};
use crate::storage::BlobStore;
use crate::types::{NormalizedAnnotation, WriteReport};
use crate::utils::{create_io_thread_pool, create_progress_bar, label_key};

/// Where and how label files are written
#[derive(Debug, Clone)]
pub struct LabelTarget {
    pub prefix: String,
    pub stem_policy: StemPolicy,
    pub workers: usize,
}

impl LabelTarget {
    pub fn from_config(config: &Config) -> Self {
        Self {
            prefix: config.destination_prefix.clone(),
            stem_policy: config.stem_policy,
            workers: config.workers,
        }
    }

    pub fn key_for(&self, image_file: &str) -> String {
        label_key(&self.prefix, image_file, self.stem_policy)
    }
}

// One label file waiting to be written
struct LabelJob<'a> {
    key: String,
    image_file: &'a str,
    body: String,
}

/// Group boxes by image file, keeping the input order of boxes within each image
pub fn group_by_image(
    annotations: &[NormalizedAnnotation],
) -> BTreeMap<&str, Vec<&NormalizedAnnotation>> {
    let mut groups: BTreeMap<&str, Vec<&NormalizedAnnotation>> = BTreeMap::new();
    for annotation in annotations {
        groups
            .entry(annotation.image_file.as_str())
            .or_default()
            .push(annotation);
    }
    groups
}

fn build_label_jobs<'a>(
    annotations: &'a [NormalizedAnnotation],
    target: &LabelTarget,
) -> Result<Vec<LabelJob<'a>>, WriteError> {
    let mut owners: HashMap<String, &str> = HashMap::new();
    let mut jobs = Vec::new();

    for (image_file, boxes) in group_by_image(annotations) {
        let key = target.key_for(image_file);
        if let Some(first) = owners.insert(key.clone(), image_file) {
            return Err(WriteError::KeyCollision {
                key,
                first: first.to_string(),
                second: image_file.to_string(),
            });
        }
        jobs.push(LabelJob {
            key,
            image_file,
            body: convert_to_yolo_format(boxes),
        });
    }
    Ok(jobs)
}

/// Write one YOLO label file per distinct image.
///
/// Every image is attempted even when some writes fail; failures are returned in the
/// report together with their keys. Nothing is written if two images map to the same key.
pub fn write_label_files(
    annotations: &[NormalizedAnnotation],
    store: &dyn BlobStore,
    target: &LabelTarget,
) -> Result<WriteReport, WriteError> {
    let jobs = build_label_jobs(annotations, target)?;
    let thread_pool = create_io_thread_pool(target.workers)?;
    let pb = create_progress_bar(jobs.len() as u64, "Labels");

    let results: Vec<Result<String, StorageError>> = thread_pool.install(|| {
        jobs.par_iter()
            .map(|job| {
                let result = store
                    .put(&job.key, job.body.as_bytes())
                    .map(|_| job.key.clone());
                if let Err(e) = &result {
                    warn!("Failed to write labels for {}: {}", job.image_file, e);
                }
                pb.inc(1);
                result
            })
            .collect()
    });
    pb.finish_with_message("Label writing complete");

    let mut report = WriteReport::new();
    report.total_annotations = annotations.len();
    for result in results {
        match result {
            Ok(key) => {
                report.written.insert(key);
            }
            Err(e) => report.failed.push(e),
        }
    }
    Ok(report)
}

/// Main conversion pipeline: load the table, resolve categories, normalize, write label files
pub fn process_dataset(config: &Config, store: &dyn BlobStore) -> Result<WriteReport, Error> {
    config.validate()?;

    let records = load_annotation_table(&config.annotation_table_path)?;
    if records.is_empty() {
        warn!(
            "Annotation table {} contains no rows",
            config.annotation_table_path.display()
        );
    }

    let categories = resolve_categories(&config.category_source, store)?;

    info!("Converting {} annotations to YOLO format...", records.len());
    let normalized = transform(&records, &categories)?;

    let target = LabelTarget::from_config(config);
    info!("Annotation files saved in = {}", target.prefix);
    let mut report = write_label_files(&normalized, store, &target)?;

    if config.write_dataset_yaml {
        info!("Creating dataset.yaml file...");
        match create_dataset_yaml(store, &config.destination_prefix, &categories) {
            Ok(key) => report.dataset_yaml = Some(key),
            Err(e) => report.dataset_yaml_error = Some(e),
        }
    }

    report.print_summary();
    if report.is_complete() {
        info!("Conversion process completed successfully.");
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn boxed(image_file: &str, class_index: usize, center_x: f64) -> NormalizedAnnotation {
        NormalizedAnnotation {
            image_file: image_file.to_string(),
            class_index,
            center_x,
            center_y: 0.5,
            norm_width: 0.1,
            norm_height: 0.2,
        }
    }

    fn target(prefix: &str) -> LabelTarget {
        LabelTarget {
            prefix: prefix.to_string(),
            stem_policy: StemPolicy::LastDot,
            workers: 2,
        }
    }

    #[test]
    fn test_group_by_image_keeps_row_order() {
        let annotations = vec![
            boxed("b.jpg", 0, 0.1),
            boxed("a.jpg", 1, 0.2),
            boxed("b.jpg", 2, 0.3),
        ];
        let groups = group_by_image(&annotations);

        assert_eq!(groups.len(), 2);
        let b: Vec<usize> = groups["b.jpg"].iter().map(|a| a.class_index).collect();
        assert_eq!(b, vec![0, 2]);
        assert_eq!(groups["a.jpg"].len(), 1);
    }

    #[test]
    fn test_write_label_files() {
        let store = MemoryStore::new();
        let annotations = vec![
            boxed("b.jpg", 0, 0.1),
            boxed("a.jpg", 1, 0.2),
            boxed("b.jpg", 2, 0.3),
        ];

        let report = write_label_files(&annotations, &store, &target("labels")).unwrap();

        assert!(report.is_complete());
        assert_eq!(report.total_annotations, 3);
        let written: Vec<&str> = report.written.iter().map(String::as_str).collect();
        assert_eq!(written, vec!["labels/a.txt", "labels/b.txt"]);
        assert_eq!(
            store.get_string("labels/b.txt").unwrap(),
            "0 0.1000 0.5000 0.1000 0.2000\n2 0.3000 0.5000 0.1000 0.2000\n"
        );
    }

    #[test]
    fn test_write_label_files_empty_input() {
        let store = MemoryStore::new();
        let report = write_label_files(&[], &store, &target("")).unwrap();

        assert!(report.written.is_empty());
        assert!(store.is_empty());
    }

    #[test]
    fn test_key_collision_writes_nothing() {
        let store = MemoryStore::new();
        let annotations = vec![boxed("cam1/x.jpg", 0, 0.1), boxed("cam2/x.jpg", 0, 0.2)];

        match write_label_files(&annotations, &store, &target("")) {
            Err(WriteError::KeyCollision { key, first, second }) => {
                assert_eq!(key, "x.txt");
                assert_eq!(first, "cam1/x.jpg");
                assert_eq!(second, "cam2/x.jpg");
            }
            other => panic!("expected KeyCollision, got {:?}", other),
        }
        assert!(store.is_empty());
    }

    #[test]
    fn test_legacy_stem_policy() {
        let store = MemoryStore::new();
        let annotations = vec![boxed("img.v2.jpg", 0, 0.1)];
        let legacy = LabelTarget {
            stem_policy: StemPolicy::LegacyFirstDot,
            ..target("out")
        };

        let report = write_label_files(&annotations, &store, &legacy).unwrap();
        assert!(report.written.contains("out/img.txt"));
    }
}

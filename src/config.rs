use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::Error;

pub const DEFAULT_WORKERS: usize = 8;

/// Command-line arguments for converting a ground-truth box table to YOLO label files.
#[derive(Parser, Debug, Clone, Default)]
#[command(version, long_about = None)]
pub struct Args {
    /// JSON run configuration; command-line flags override its values
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Root directory of the storage bucket
    #[arg(short = 'b', long = "bucket")]
    pub bucket: Option<PathBuf>,

    /// Prefix of the job inside the bucket (used to locate the category descriptor)
    #[arg(long = "source_prefix")]
    pub source_prefix: Option<String>,

    /// Prefix under which label files are written
    #[arg(long = "dest_prefix")]
    pub destination_prefix: Option<String>,

    /// CSV table of ground-truth boxes
    #[arg(short = 'a', long = "annotations")]
    pub annotations: Option<PathBuf>,

    /// Ground Truth job name; reads categories from that job's descriptor
    #[arg(long = "gt_job_name", conflicts_with = "descriptor")]
    pub gt_job_name: Option<String>,

    /// Bucket key of a category descriptor
    #[arg(long = "descriptor")]
    pub descriptor: Option<String>,

    /// Number of concurrent label writes
    #[arg(long = "workers", value_parser = validate_workers)]
    pub workers: Option<usize>,

    /// How the label file name is derived from the image file name
    #[arg(long = "stem_policy", value_enum)]
    pub stem_policy: Option<StemPolicy>,

    /// Also write dataset.yaml with the class names
    #[arg(long = "dataset_yaml")]
    pub dataset_yaml: bool,

    /// Ordered category list; position defines the class index
    #[arg(use_value_delimiter = true)]
    pub label_list: Vec<String>,
}

// Enumeration of the label file naming rules
#[derive(
    Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum StemPolicy {
    /// Strip the final extension from the image basename
    #[default]
    LastDot,
    /// Cut the image path at its first '.'
    LegacyFirstDot,
}

/// Where the ordered category list comes from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategorySource {
    Labels(Vec<String>),
    Descriptor(String),
}

impl Default for CategorySource {
    fn default() -> Self {
        CategorySource::Labels(Vec::new())
    }
}

impl CategorySource {
    /// Descriptor key of a Ground Truth labeling job stored under `source_prefix`.
    pub fn for_job(source_prefix: &str, job_name: &str) -> Self {
        let key = crate::utils::join_key(
            source_prefix,
            &format!("ground_truth_annots/{}/annotation-tool/data.json", job_name),
        );
        CategorySource::Descriptor(key)
    }
}

/// Explicit configuration of one conversion run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub storage_bucket: PathBuf,
    pub source_prefix: String,
    pub destination_prefix: String,
    pub category_source: CategorySource,
    pub annotation_table_path: PathBuf,
    pub workers: usize,
    pub stem_policy: StemPolicy,
    pub write_dataset_yaml: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage_bucket: PathBuf::from("."),
            source_prefix: String::new(),
            destination_prefix: String::new(),
            category_source: CategorySource::default(),
            annotation_table_path: PathBuf::from("annot.csv"),
            workers: DEFAULT_WORKERS,
            stem_policy: StemPolicy::default(),
            write_dataset_yaml: false,
        }
    }
}

impl Config {
    /// Read a JSON configuration file.
    pub fn from_file(path: &Path) -> Result<Self, Error> {
        let file = File::open(path)
            .map_err(|e| Error::Config(format!("cannot open {}: {}", path.display(), e)))?;
        serde_json::from_reader(BufReader::new(file))
            .map_err(|e| Error::Config(format!("cannot parse {}: {}", path.display(), e)))
    }

    /// Build the run configuration from the optional config file plus command-line overrides.
    pub fn from_args(args: &Args) -> Result<Self, Error> {
        let mut config = match &args.config {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };

        if let Some(bucket) = &args.bucket {
            config.storage_bucket = bucket.clone();
        }
        if let Some(prefix) = &args.source_prefix {
            config.source_prefix = prefix.clone();
        }
        if let Some(prefix) = &args.destination_prefix {
            config.destination_prefix = prefix.clone();
        }
        if let Some(path) = &args.annotations {
            config.annotation_table_path = path.clone();
        }
        if let Some(workers) = args.workers {
            config.workers = workers;
        }
        if let Some(policy) = args.stem_policy {
            config.stem_policy = policy;
        }
        config.write_dataset_yaml |= args.dataset_yaml;

        if let Some(job) = &args.gt_job_name {
            config.category_source = CategorySource::for_job(&config.source_prefix, job);
        } else if let Some(key) = &args.descriptor {
            config.category_source = CategorySource::Descriptor(key.clone());
        } else if !args.label_list.is_empty() {
            config.category_source = CategorySource::Labels(args.label_list.clone());
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.workers == 0 {
            return Err(Error::Config("workers must be at least 1".to_string()));
        }
        match &self.category_source {
            CategorySource::Labels(labels) if labels.is_empty() => Err(Error::Config(
                "no categories given: pass a label list, --descriptor or --gt_job_name"
                    .to_string(),
            )),
            CategorySource::Descriptor(key) if key.is_empty() => {
                Err(Error::Config("descriptor key is empty".to_string()))
            }
            _ => Ok(()),
        }
    }
}

// Validate that the worker count is a positive integer
fn validate_workers(s: &str) -> Result<usize, String> {
    match usize::from_str(s) {
        Ok(val) if val >= 1 => Ok(val),
        _ => Err("WORKERS must be a positive integer".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_validate_workers() {
        assert_eq!(validate_workers("4"), Ok(4));
        assert!(validate_workers("0").is_err());
        assert!(validate_workers("-1").is_err());
        assert!(validate_workers("abc").is_err());
    }

    #[test]
    fn test_label_list_is_comma_delimited() {
        let args = Args::parse_from(["gt2yolo", "-b", "bucket", "chicken,duck"]);
        let config = Config::from_args(&args).unwrap();
        assert_eq!(
            config.category_source,
            CategorySource::Labels(vec!["chicken".to_string(), "duck".to_string()])
        );
        assert_eq!(config.storage_bucket, PathBuf::from("bucket"));
        assert_eq!(config.workers, DEFAULT_WORKERS);
        assert_eq!(config.stem_policy, StemPolicy::LastDot);
    }

    #[test]
    fn test_gt_job_name_derives_descriptor_key() {
        let args = Args::parse_from([
            "gt2yolo",
            "--source_prefix",
            "data_utk/yolo",
            "--gt_job_name",
            "chickens-1",
        ]);
        let config = Config::from_args(&args).unwrap();
        assert_eq!(
            config.category_source,
            CategorySource::Descriptor(
                "data_utk/yolo/ground_truth_annots/chickens-1/annotation-tool/data.json"
                    .to_string()
            )
        );
    }

    #[test]
    fn test_missing_categories_rejected() {
        let args = Args::parse_from(["gt2yolo"]);
        assert!(matches!(Config::from_args(&args), Err(Error::Config(_))));
    }

    #[test]
    fn test_config_file_with_overrides() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "storage_bucket": "/data/bucket",
                "destination_prefix": "data_utk/yolo/yolo_annot_files",
                "category_source": {{"labels": ["chicken"]}},
                "stem_policy": "legacy-first-dot"
            }}"#
        )
        .unwrap();

        let args = Args {
            config: Some(file.path().to_path_buf()),
            workers: Some(2),
            ..Args::default()
        };
        let config = Config::from_args(&args).unwrap();

        assert_eq!(config.storage_bucket, PathBuf::from("/data/bucket"));
        assert_eq!(config.destination_prefix, "data_utk/yolo/yolo_annot_files");
        assert_eq!(config.stem_policy, StemPolicy::LegacyFirstDot);
        assert_eq!(config.annotation_table_path, PathBuf::from("annot.csv"));
        assert_eq!(config.workers, 2);
    }
}

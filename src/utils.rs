use indicatif::{ProgressBar, ProgressStyle};
use rayon::{ThreadPool, ThreadPoolBuildError, ThreadPoolBuilder};

use crate::config::StemPolicy;

/// Create a progress bar with the given length and label
pub fn create_progress_bar(len: u64, label: &str) -> ProgressBar {
    let pb = ProgressBar::new(len);
    let style = ProgressStyle::default_bar()
        .template(&format!(
            "{{spinner:.green}} [{}] [{{elapsed_precise}}] [{{bar:40.cyan/blue}}] {{pos}}/{{len}} ({{eta}})",
            label
        ))
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-");
    pb.set_style(style);
    pb
}

/// Build a thread pool dedicated to storage writes, sized to the configured concurrency limit
pub fn create_io_thread_pool(workers: usize) -> Result<ThreadPool, ThreadPoolBuildError> {
    ThreadPoolBuilder::new()
        .num_threads(workers.max(1))
        .thread_name(|i| format!("gt2yolo-io-{}", i))
        .build()
}

/// Join a key prefix and a name with a single '/'
pub fn join_key(prefix: &str, name: &str) -> String {
    let prefix = prefix.trim_end_matches('/');
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", prefix, name)
    }
}

/// Name of the label file for an image, without any prefix
pub fn label_file_name(image_file: &str, policy: StemPolicy) -> String {
    let stem = match policy {
        StemPolicy::LastDot => {
            let basename = image_file
                .rsplit(|c: char| c == '/' || c == '\\')
                .next()
                .unwrap_or(image_file);
            match basename.rfind('.') {
                Some(pos) if pos > 0 => &basename[..pos],
                _ => basename,
            }
        }
        StemPolicy::LegacyFirstDot => image_file.split('.').next().unwrap_or(image_file),
    };
    format!("{}.txt", stem)
}

/// Storage key of the label file for an image
pub fn label_key(prefix: &str, image_file: &str, policy: StemPolicy) -> String {
    join_key(prefix, &label_file_name(image_file, policy))
}

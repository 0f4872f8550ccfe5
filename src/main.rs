use clap::Parser;

use log::{error, info};
use std::process::ExitCode;

use gt2yolo::{process_dataset, Args, Config, LocalStore};

fn main() -> ExitCode {
    // Initialize the logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let config = match Config::from_args(&args) {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    if !config.storage_bucket.is_dir() {
        error!(
            "The specified bucket does not exist: {}",
            config.storage_bucket.display()
        );
        return ExitCode::FAILURE;
    }

    info!("Starting the conversion process...");
    let store = LocalStore::new(config.storage_bucket.clone());

    match process_dataset(&config, &store) {
        Ok(report) if report.is_complete() => ExitCode::SUCCESS,
        Ok(report) => {
            if !report.failed.is_empty() {
                error!(
                    "{} of {} label files could not be written",
                    report.failed.len(),
                    report.total_images()
                );
            }
            if let Some(e) = &report.dataset_yaml_error {
                error!("Label files were written but dataset.yaml was not: {}", e);
            }
            ExitCode::FAILURE
        }
        Err(e) => {
            error!("Failed to process dataset: {}", e);
            ExitCode::FAILURE
        }
    }
}

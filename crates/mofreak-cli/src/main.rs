use std::time::Instant;

use log::{error, info};
use mofreak_cli::config::RunConfig;
use mofreak_cli::DatasetProcessor;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().collect();
    let config_path = args.get(1).map(String::as_str).unwrap_or("mofreak.yaml");

    let config = match RunConfig::load(config_path) {
        Ok(config) => config,
        Err(e) => {
            error!("could not load {config_path}: {e}");
            std::process::exit(1);
        }
    };

    let start = Instant::now();
    let mut processor = DatasetProcessor::new(config);
    match processor.run() {
        Ok(summary) => {
            info!(
                "done in {:.1}s: {} videos processed, {} skipped, {} features",
                start.elapsed().as_secs_f64(),
                summary.videos_processed,
                summary.videos_skipped,
                summary.features_written
            );
        }
        Err(e) => {
            error!("batch failed: {e}");
            std::process::exit(1);
        }
    }
}

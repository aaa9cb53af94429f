// src/main.rs

use std::process;

use env_logger::Env;
use log::error;

use gen0size::config::SizingConfig;
use gen0size::memory::HostMemory;
use gen0size::topology::HostTopology;
use gen0size::{Gen0Pipeline, SizingError};

fn run(config: &SizingConfig) -> Result<u64, SizingError> {
    let mut pipeline = Gen0Pipeline::new(
        HostTopology::with_sysfs_root(config.sysfs_root.as_str()),
        HostMemory::new(),
    )
    .with_invariant_checks(config.invariant_checks());

    if let Some(count) = config.processor_count {
        pipeline = pipeline.with_processor_count(count);
    }

    Ok(pipeline.run()?.gen0_size)
}

fn main() {
    let config = SizingConfig::load();
    let log_level = config
        .as_ref()
        .map(|c| c.log_level.clone())
        .unwrap_or_else(|_| "info".to_string());

    // Initialize the logger
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    let result = config.map_err(SizingError::from).and_then(|config| run(&config));
    if let Err(e) = result {
        error!("{}", e);
        process::exit(1);
    }
}

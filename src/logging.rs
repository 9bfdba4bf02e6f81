use anyhow::{Context, Result};
use simplelog::{ConfigBuilder, WriteLogger};
use std::fs::{self, File};

use crate::config::Config;

/// Route `log` output to a file; the terminal belongs to the TUI.
pub fn init(config: &Config) -> Result<()> {
    let path = config.log_path();
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
    }

    let file = File::create(&path)
        .with_context(|| format!("Failed to open log file {}", path.display()))?;
    let log_config = ConfigBuilder::new()
        .set_target_level(log::LevelFilter::Error)
        .build();

    WriteLogger::init(config.log_level_filter(), log_config, file)
        .context("Logger already initialised")?;

    log::info!("Logging to {} at {}", path.display(), config.log_level_filter());
    Ok(())
}

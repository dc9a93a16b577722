//! Init command implementation

use anyhow::{Result, bail};
use std::path::PathBuf;

use learnforge::config::Config;

/// Write a config file with default settings
pub fn init_command(config_path: Option<PathBuf>, force: bool) -> Result<()> {
    let config_path = config_path.unwrap_or_else(Config::global_config_path);

    if config_path.exists() && !force {
        bail!(
            "Configuration already exists: {}\nUse --force to overwrite.",
            config_path.display()
        );
    }

    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let config = Config::default();
    config.save_to_file(&config_path)?;

    println!("Created: {}", config_path.display());
    println!("Database: {}", config.db_path().display());
    println!();
    println!("Next steps:");
    println!("  learnforge seed --catalog demo/catalog.toml");
    println!("  learnforge serve");

    Ok(())
}

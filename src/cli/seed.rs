//! Seed command implementation

use anyhow::Result;
use std::path::Path;

use learnforge::catalog::Catalog;
use learnforge::config::Config;
use learnforge::engine::Engine;

/// Load a curriculum catalog into the progress database
pub fn seed_command(config: &Config, catalog_path: &Path) -> Result<()> {
    let catalog = Catalog::from_file(catalog_path)?;
    let engine = Engine::from_config(config)?;
    let report = catalog.seed(&engine)?;

    println!("Seeded {}", config.db_path().display());
    println!("  Topics:   {}", report.topics_upserted);
    println!("  Students: {} added, {} already enrolled", report.students_added, report.students_skipped);

    Ok(())
}

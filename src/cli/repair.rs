//! Repair command implementation

use anyhow::Result;

use learnforge::config::Config;
use learnforge::engine::Engine;

/// Rebuild cached streak and XP values from the event history
pub fn repair_command(config: &Config, student: Option<String>) -> Result<()> {
    let engine = Engine::from_config(config)?;
    let student_id = match student {
        Some(name) => Some(engine.find_student(&name)?.id),
        None => None,
    };

    let reports = engine.repair(student_id)?;
    let changed: Vec<_> = reports.iter().filter(|r| r.changed()).collect();

    if changed.is_empty() {
        println!("Checked {} students, nothing to repair.", reports.len());
        return Ok(());
    }

    println!("Repaired {} of {} students:\n", changed.len(), reports.len());
    for report in changed {
        println!(
            "  {}: streak {} -> {} (longest {} -> {}), xp {} -> {}",
            report.name,
            report.streak_before,
            report.streak_after,
            report.longest_before,
            report.longest_after,
            report.xp_before,
            report.xp_after
        );
    }

    Ok(())
}

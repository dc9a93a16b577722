//! Leaderboard command implementation

use anyhow::{Result, bail};

use learnforge::config::Config;
use learnforge::engine::Engine;
use learnforge::progress::gamification::LeaderboardPeriod;

pub fn leaderboard_command(config: &Config, period: &str) -> Result<()> {
    let Some(period) = LeaderboardPeriod::from_str(period) else {
        bail!("Unknown period: {} (expected all or weekly)", period);
    };

    let engine = Engine::from_config(config)?;
    let entries = engine.leaderboard(period)?;

    if entries.is_empty() {
        println!("No learners yet.");
        return Ok(());
    }

    println!("Leaderboard ({}):\n", period.as_str());
    for entry in entries {
        println!(
            "  {:>2}. {} {:<16} {:>6} XP  {:<18} streak {}",
            entry.rank, entry.avatar, entry.name, entry.xp, entry.level, entry.current_streak
        );
    }

    Ok(())
}

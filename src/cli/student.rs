//! Student command implementation

use anyhow::Result;

use learnforge::config::Config;
use learnforge::engine::Engine;

/// Print a learner's progress summary
pub fn student_command(config: &Config, name: &str) -> Result<()> {
    let engine = Engine::from_config(config)?;
    let student = engine.find_student(name)?;

    if student.is_admin() {
        println!("{} {} (admin)", student.avatar, student.name);
        return Ok(());
    }

    let stats = engine.analytics(student.id)?;
    let progress = engine.get_progress(student.id)?;

    println!("{} {} (#{})", student.avatar, student.name, student.id);
    if let Some(track) = student.track {
        println!("  Track:      {}", track);
    }
    match (stats.level.next_level, stats.level.next_ceiling) {
        (Some(next), Some(ceiling)) => println!(
            "  Level:      {} ({} XP, {:.0}% to {} at {})",
            stats.level.level, stats.total_xp, stats.level.pct, next, ceiling
        ),
        _ => println!("  Level:      {} ({} XP)", stats.level.level, stats.total_xp),
    }
    println!(
        "  Streak:     {} days (longest {}, {} freezes)",
        stats.current_streak, stats.longest_streak, stats.streak_freezes
    );
    println!("  Topics:     {}/{}", stats.topics_completed, stats.topics_total);
    println!(
        "  Quizzes:    {} taken, {:.1}% average, {} perfect",
        stats.total_quizzes, stats.avg_quiz_score, stats.perfect_scores
    );
    println!("  Badges:     {}/{}", stats.badges_earned, stats.total_badges);
    println!("  Challenges: {}", stats.challenges_completed);

    let pending: Vec<_> = progress.topics.iter().filter(|t| !t.completed).collect();
    if let Some(next) = pending.first() {
        println!("\n  Next topic: {}. {}", next.topic.order_num, next.topic.title);
    }

    Ok(())
}

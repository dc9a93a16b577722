//! Badge unlock checks
//!
//! Each `check_*` function looks at one family of badges and returns the
//! ones the stats now satisfy and the student does not hold yet.

use std::collections::HashSet;

use serde::Serialize;

use super::definitions::BadgeId;
use crate::domain::Track;
use crate::progress::gamification::Level;

/// Aggregated per-student stats the badge predicates read
#[derive(Debug, Clone, Default, Serialize)]
pub struct BadgeStats {
    pub topics_completed: u32,
    /// Topics with any recorded progress (opened, quizzed or completed)
    pub topics_touched: u32,
    /// Topics in the student's track
    pub track_topic_total: u32,
    pub quizzes_taken: u32,
    pub perfect_quizzes: u32,
    pub best_answer_streak: u32,
    /// Topics with more than one quiz attempt
    pub retried_topics: u32,
    pub current_streak: u32,
    pub challenges_completed: u32,
    pub chat_turns: u32,
    pub flashcard_sessions: u32,
    pub logins: u32,
    /// Events between 22:00 and 04:00 local time
    pub late_night_events: u32,
    /// Events between 05:00 and 08:00 local time
    pub early_morning_events: u32,
    pub total_xp: u64,
    /// XP earned on the student's first active day
    pub first_day_xp: u64,
    /// 1-based all-time leaderboard rank
    pub leaderboard_rank: Option<u32>,
    pub track: Option<Track>,
}

fn thresholds<T: PartialOrd + Copy>(
    value: T,
    table: &[(T, BadgeId)],
    held: &HashSet<BadgeId>,
) -> Vec<BadgeId> {
    table
        .iter()
        .filter(|(threshold, id)| value >= *threshold && !held.contains(id))
        .map(|(_, id)| *id)
        .collect()
}

/// Topic breadth and completion (5 badges)
pub fn check_topic_badges(stats: &BadgeStats, held: &HashSet<BadgeId>) -> Vec<BadgeId> {
    let mut newly = thresholds(stats.topics_touched, &[(10, BadgeId::KnowledgeSeeker)], held);
    newly.extend(thresholds(stats.topics_completed, &[(5, BadgeId::AllRounder)], held));

    let total = stats.track_topic_total;
    if total > 0 && stats.topics_touched >= total && !held.contains(&BadgeId::CuriousMind) {
        newly.push(BadgeId::CuriousMind);
    }
    if total > 0 && stats.topics_completed >= total {
        if !held.contains(&BadgeId::Graduate) {
            newly.push(BadgeId::Graduate);
        }
        if let Some(track_badge) = stats.track.map(track_badge) {
            if !held.contains(&track_badge) {
                newly.push(track_badge);
            }
        }
    }
    newly
}

fn track_badge(track: Track) -> BadgeId {
    match track {
        Track::Gaming => BadgeId::GameMaster,
        Track::Business => BadgeId::BusinessBrain,
        Track::Developer => BadgeId::CodeWizard,
        Track::AiEnthusiast => BadgeId::AiPioneer,
    }
}

/// Quiz performance (4 badges)
pub fn check_quiz_badges(stats: &BadgeStats, held: &HashSet<BadgeId>) -> Vec<BadgeId> {
    let mut newly = thresholds(
        stats.perfect_quizzes,
        &[(1, BadgeId::Perfectionist), (5, BadgeId::DiamondMind)],
        held,
    );
    newly.extend(thresholds(stats.best_answer_streak, &[(5, BadgeId::QuickLearner)], held));
    newly.extend(thresholds(stats.retried_topics, &[(1, BadgeId::ComebackKid)], held));
    newly
}

/// Streak and level (3 badges)
pub fn check_progress_badges(stats: &BadgeStats, held: &HashSet<BadgeId>) -> Vec<BadgeId> {
    let mut newly = thresholds(stats.current_streak, &[(7, BadgeId::WeekWarrior)], held);
    let rank = Level::for_xp(stats.total_xp).rank;
    let engineer = Level::from_label("Engineer").map(|l| l.rank).unwrap_or(3);
    let legend = Level::from_label("Legend").map(|l| l.rank).unwrap_or(5);
    newly.extend(thresholds(
        rank,
        &[(engineer, BadgeId::RisingStar), (legend, BadgeId::Legend)],
        held,
    ));
    newly.extend(thresholds(stats.first_day_xp, &[(100, BadgeId::RocketStart)], held));
    newly
}

/// Chat, flashcards, challenges and logins (5 badges)
pub fn check_engagement_badges(stats: &BadgeStats, held: &HashSet<BadgeId>) -> Vec<BadgeId> {
    let mut newly = thresholds(
        stats.chat_turns,
        &[(50, BadgeId::AiWhisperer), (100, BadgeId::DeepThinker)],
        held,
    );
    newly.extend(thresholds(stats.flashcard_sessions, &[(10, BadgeId::FlashcardMaster)], held));
    newly.extend(thresholds(
        stats.challenges_completed,
        &[(30, BadgeId::ChallengeChampion)],
        held,
    ));
    newly.extend(thresholds(stats.logins, &[(1, BadgeId::FirstSteps)], held));
    newly
}

/// Time of day and ranking (3 badges)
pub fn check_time_badges(stats: &BadgeStats, held: &HashSet<BadgeId>) -> Vec<BadgeId> {
    let mut newly = thresholds(stats.late_night_events, &[(1, BadgeId::NightOwl)], held);
    newly.extend(thresholds(stats.early_morning_events, &[(1, BadgeId::EarlyBird)], held));
    let top = stats.leaderboard_rank == Some(1) && stats.total_xp > 0;
    if top && !held.contains(&BadgeId::LeaderboardKing) {
        newly.push(BadgeId::LeaderboardKing);
    }
    newly
}

/// Run every check, in catalog order
pub fn check_all(stats: &BadgeStats, held: &HashSet<BadgeId>) -> Vec<BadgeId> {
    let mut newly = Vec::new();
    newly.extend(check_engagement_badges(stats, held));
    newly.extend(check_topic_badges(stats, held));
    newly.extend(check_quiz_badges(stats, held));
    newly.extend(check_progress_badges(stats, held));
    newly.extend(check_time_badges(stats, held));
    newly
}

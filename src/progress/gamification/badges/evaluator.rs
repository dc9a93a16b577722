//! Badge evaluation against stored history
//!
//! Stats are aggregated from the same connection (and transaction) as the
//! event that triggered the evaluation. Awards use INSERT OR IGNORE on
//! (student_id, badge_id) and are never deleted.

use std::collections::HashSet;

use anyhow::Result;
use rusqlite::Connection;

use super::EarnedBadge;
use super::checker::{BadgeStats, check_all};
use super::definitions::BadgeId;
use crate::domain::{EventKind, StudentId, Track};
use crate::progress::event_log::EventLog;
use crate::progress::gamification::leaderboard::LeaderboardRanker;

pub struct BadgeEvaluator;

impl BadgeEvaluator {
    /// IDs of badges the student already holds
    pub fn held(conn: &Connection, student_id: StudentId) -> Result<HashSet<BadgeId>> {
        let mut stmt = conn.prepare("SELECT badge_id FROM badge_awards WHERE student_id = ?1")?;
        let held = stmt
            .query_map([student_id], |r| r.get::<_, String>(0))?
            .filter_map(|r| r.ok())
            .filter_map(|s| BadgeId::from_str(&s))
            .collect();
        Ok(held)
    }

    /// Earned badges in the order they were earned
    pub fn earned(conn: &Connection, student_id: StudentId) -> Result<Vec<EarnedBadge>> {
        let mut stmt = conn.prepare(
            r#"SELECT badge_id, earned_at FROM badge_awards
               WHERE student_id = ?1 ORDER BY earned_at, rowid"#,
        )?;
        let earned = stmt
            .query_map([student_id], |r| Ok((r.get::<_, String>(0)?, r.get::<_, i64>(1)?)))?
            .filter_map(|r| r.ok())
            .filter_map(|(id, at)| Some(EarnedBadge::new(BadgeId::from_str(&id)?, at)))
            .collect();
        Ok(earned)
    }

    /// Aggregate everything the badge predicates look at
    pub fn collect_stats(conn: &Connection, student_id: StudentId) -> Result<BadgeStats> {
        let (total_xp, track, current_streak): (i64, Option<String>, u32) = conn.query_row(
            "SELECT total_xp, track, current_streak FROM students WHERE id = ?1",
            [student_id],
            |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)),
        )?;
        let track = track.as_deref().and_then(Track::from_str);

        // Only topics of the student's own track count
        let (topics_touched, topics_completed, retried_topics): (u32, u32, u32) = conn.query_row(
            r#"SELECT COUNT(*),
                      COALESCE(SUM(p.completed), 0),
                      COALESCE(SUM(CASE WHEN p.quiz_attempts > 1 THEN 1 ELSE 0 END), 0)
               FROM topic_progress p
               JOIN topics t ON t.id = p.topic_id
               WHERE p.student_id = ?1 AND t.track = ?2"#,
            rusqlite::params![student_id, track.map(|t| t.as_str())],
            |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)),
        )?;

        let track_topic_total: u32 = match track {
            Some(track) => conn.query_row(
                "SELECT COUNT(*) FROM topics WHERE track = ?1",
                [track.as_str()],
                |r| r.get(0),
            )?,
            None => 0,
        };

        let (quizzes_taken, perfect_quizzes, best_answer_streak): (u32, u32, u32) = conn.query_row(
            r#"SELECT COUNT(*), COALESCE(SUM(perfect), 0), COALESCE(MAX(best_answer_streak), 0)
               FROM quiz_attempts WHERE student_id = ?1"#,
            [student_id],
            |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)),
        )?;

        let challenges_completed: u32 = conn.query_row(
            "SELECT COUNT(*) FROM challenge_responses WHERE student_id = ?1 AND completed = 1",
            [student_id],
            |r| r.get(0),
        )?;

        let first_day_xp: i64 = conn.query_row(
            r#"SELECT COALESCE(SUM(amount), 0) FROM xp_ledger
               WHERE student_id = ?1
                 AND day_bucket = (SELECT MIN(day_bucket) FROM xp_ledger WHERE student_id = ?1)"#,
            [student_id],
            |r| r.get(0),
        )?;

        let leaderboard_rank = LeaderboardRanker::position(conn, student_id, None)?;

        Ok(BadgeStats {
            topics_completed,
            topics_touched,
            track_topic_total,
            quizzes_taken,
            perfect_quizzes,
            best_answer_streak,
            retried_topics,
            current_streak,
            challenges_completed,
            chat_turns: EventLog::count_kind(conn, student_id, EventKind::ChatTurn)?,
            flashcard_sessions: EventLog::count_kind(conn, student_id, EventKind::FlashcardSession)?,
            logins: EventLog::count_kind(conn, student_id, EventKind::Login)?,
            late_night_events: EventLog::count_in_hours(conn, student_id, 22, 4)?,
            early_morning_events: EventLog::count_in_hours(conn, student_id, 5, 8)?,
            total_xp: total_xp.max(0) as u64,
            first_day_xp: first_day_xp.max(0) as u64,
            leaderboard_rank,
            track,
        })
    }

    /// Award every newly satisfied badge. Returns only badges earned by this
    /// call.
    pub fn evaluate(
        conn: &Connection,
        student_id: StudentId,
        stats: &BadgeStats,
        at: i64,
    ) -> Result<Vec<EarnedBadge>> {
        let held = Self::held(conn, student_id)?;
        let mut earned = Vec::new();
        for id in check_all(stats, &held) {
            let inserted = conn.execute(
                "INSERT OR IGNORE INTO badge_awards (student_id, badge_id, earned_at) VALUES (?1, ?2, ?3)",
                rusqlite::params![student_id, id.as_str(), at],
            )?;
            if inserted > 0 {
                tracing::info!(
                    "[learnforge:badges] student {} earned {}",
                    student_id,
                    id.badge().label
                );
                earned.push(EarnedBadge::new(id, at));
            }
        }
        Ok(earned)
    }

    /// Collect stats and evaluate in one step
    pub fn refresh(conn: &Connection, student_id: StudentId, at: i64) -> Result<Vec<EarnedBadge>> {
        let stats = Self::collect_stats(conn, student_id)?;
        Self::evaluate(conn, student_id, &stats, at)
    }
}

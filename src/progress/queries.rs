//! Read-side aggregates: per-student analytics and the admin overview

use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::Connection;
use serde::Serialize;

use super::gamification::{BADGES, BadgeEvaluator, LevelProgress, StreakTracker};
use super::ledger::XpLedger;
use super::quizzes::QuizStore;
use super::students::StudentStore;
use super::time_bucket::{HistoryBucket, local_day};
use super::topics::TopicStore;
use crate::domain::{EventKind, Student, StudentId, Track};
use crate::progress::event_log::EventLog;

#[derive(Debug, Clone, Serialize)]
pub struct XpPoint {
    pub date: NaiveDate,
    pub xp: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScorePoint {
    pub date: NaiveDate,
    pub score: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct StudentAnalytics {
    pub student_id: StudentId,
    pub total_xp: u64,
    pub level: LevelProgress,
    pub current_streak: u32,
    pub longest_streak: u32,
    pub streak_freezes: u32,
    pub topics_completed: u32,
    pub topics_total: u32,
    pub avg_quiz_score: f64,
    pub total_quizzes: u32,
    pub perfect_scores: u32,
    pub badges_earned: u32,
    pub total_badges: u32,
    pub challenges_completed: u32,
    pub tutor_questions: u32,
    pub flashcard_sessions: u32,
    pub xp_chart: Vec<XpPoint>,
    pub quiz_chart: Vec<ScorePoint>,
}

/// One row of the admin overview
#[derive(Debug, Clone, Serialize)]
pub struct StudentOverview {
    pub id: StudentId,
    pub name: String,
    pub track: Option<Track>,
    pub avatar: String,
    pub total_xp: u64,
    pub level: String,
    pub current_streak: u32,
    pub last_active_day: Option<NaiveDate>,
    pub topics_completed: u32,
    pub topics_total: u32,
    pub quizzes_taken: u32,
    pub badges_earned: u32,
    pub challenges_completed: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct AdminOverview {
    pub total_students: u32,
    /// Students with activity on `today`
    pub active_today: u32,
    pub total_xp: u64,
    pub students: Vec<StudentOverview>,
}

fn completed_topics(conn: &Connection, student_id: StudentId) -> Result<u32> {
    Ok(conn.query_row(
        "SELECT COUNT(*) FROM topic_progress WHERE student_id = ?1 AND completed = 1",
        [student_id],
        |r| r.get(0),
    )?)
}

fn completed_challenges(conn: &Connection, student_id: StudentId) -> Result<u32> {
    Ok(conn.query_row(
        "SELECT COUNT(*) FROM challenge_responses WHERE student_id = ?1 AND completed = 1",
        [student_id],
        |r| r.get(0),
    )?)
}

fn topics_total(conn: &Connection, student: &Student) -> Result<u32> {
    match student.track {
        Some(track) => TopicStore::count_by_track(conn, track),
        None => Ok(0),
    }
}

pub struct ProgressQuery;

impl ProgressQuery {
    /// Dashboard figures for one student. `today` is the student's local day.
    pub fn analytics(conn: &Connection, student: &Student, today: NaiveDate) -> Result<StudentAnalytics> {
        let scores = QuizStore::scores(conn, student.id)?;
        let total_quizzes = scores.len() as u32;
        let avg_quiz_score = if scores.is_empty() {
            0.0
        } else {
            let sum: f64 = scores.iter().map(|(_, s)| s).sum();
            (sum / scores.len() as f64 * 10.0).round() / 10.0
        };
        let perfect_scores = scores.iter().filter(|(_, s)| *s >= 100.0).count() as u32;
        let quiz_chart = scores
            .iter()
            .map(|(taken_at, score)| ScorePoint {
                date: local_day(*taken_at, student.utc_offset_minutes),
                score: *score,
            })
            .collect();

        let xp_chart = XpLedger::history(conn, student.id, HistoryBucket::Day)?
            .iter()
            .map(|(date, xp)| XpPoint { date, xp })
            .collect();

        let streak = StreakTracker::load(conn, student.id)?;

        Ok(StudentAnalytics {
            student_id: student.id,
            total_xp: student.total_xp,
            level: LevelProgress::for_xp(student.total_xp),
            current_streak: streak.current_as_of(today),
            longest_streak: streak.longest,
            streak_freezes: streak.freezes,
            topics_completed: completed_topics(conn, student.id)?,
            topics_total: topics_total(conn, student)?,
            avg_quiz_score,
            total_quizzes,
            perfect_scores,
            badges_earned: BadgeEvaluator::held(conn, student.id)?.len() as u32,
            total_badges: BADGES.len() as u32,
            challenges_completed: completed_challenges(conn, student.id)?,
            tutor_questions: EventLog::count_kind(conn, student.id, EventKind::ChatTurn)?,
            flashcard_sessions: EventLog::count_kind(conn, student.id, EventKind::FlashcardSession)?,
            xp_chart,
            quiz_chart,
        })
    }

    /// Every learner at a glance. Streaks are settled to each student's own
    /// day at `now`; `today` decides who counts as active today.
    pub fn admin_overview(conn: &Connection, now: DateTime<Utc>, today: NaiveDate) -> Result<AdminOverview> {
        let mut students = Vec::new();
        for student in StudentStore::list(conn)? {
            let current_streak = student.streak_as_of(now);
            students.push(StudentOverview {
                topics_completed: completed_topics(conn, student.id)?,
                topics_total: topics_total(conn, &student)?,
                quizzes_taken: QuizStore::count(conn, student.id)?,
                badges_earned: BadgeEvaluator::held(conn, student.id)?.len() as u32,
                challenges_completed: completed_challenges(conn, student.id)?,
                id: student.id,
                name: student.name,
                track: student.track,
                avatar: student.avatar,
                total_xp: student.total_xp,
                level: student.level,
                current_streak,
                last_active_day: student.last_active_day,
            });
        }

        Ok(AdminOverview {
            total_students: students.len() as u32,
            active_today: students
                .iter()
                .filter(|s| s.last_active_day == Some(today))
                .count() as u32,
            total_xp: students.iter().map(|s| s.total_xp).sum(),
            students,
        })
    }
}

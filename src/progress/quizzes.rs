//! Scored quiz attempts

use anyhow::{Context, Result};
use rusqlite::Connection;
use serde::Serialize;
use uuid::Uuid;

use crate::domain::{AnswerRecord, QuizAttempt, StudentId};

/// Attempt with its topic title, for history listings
#[derive(Debug, Clone, Serialize)]
pub struct QuizHistoryEntry {
    #[serde(flatten)]
    pub attempt: QuizAttempt,
    pub topic_title: String,
}

pub struct QuizStore;

impl QuizStore {
    pub fn insert(conn: &Connection, attempt: &QuizAttempt) -> Result<()> {
        let answers = serde_json::to_string(&attempt.answers).context("Failed to encode answers")?;
        conn.execute(
            r#"INSERT INTO quiz_attempts
               (id, student_id, topic_id, answers, correct, total, score, xp_awarded, perfect,
                best_answer_streak, taken_at)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)"#,
            rusqlite::params![
                attempt.id.to_string(),
                attempt.student_id,
                attempt.topic_id,
                answers,
                attempt.correct,
                attempt.total,
                attempt.score,
                attempt.xp_awarded as i64,
                attempt.perfect as i32,
                attempt.best_answer_streak,
                attempt.taken_at,
            ],
        )?;
        Ok(())
    }

    /// Newest attempts first
    pub fn history(conn: &Connection, student_id: StudentId, limit: usize) -> Result<Vec<QuizHistoryEntry>> {
        let mut stmt = conn.prepare(
            r#"SELECT q.id, q.student_id, q.topic_id, q.answers, q.correct, q.total, q.score,
                      q.xp_awarded, q.perfect, q.best_answer_streak, q.taken_at,
                      COALESCE(t.title, '')
               FROM quiz_attempts q LEFT JOIN topics t ON t.id = q.topic_id
               WHERE q.student_id = ?1
               ORDER BY q.taken_at DESC, q.rowid DESC LIMIT ?2"#,
        )?;
        let rows = stmt
            .query_map(rusqlite::params![student_id, limit as i64], |r| {
                Ok((
                    r.get::<_, String>(0)?,
                    r.get::<_, String>(3)?,
                    QuizAttempt {
                        id: Uuid::nil(),
                        student_id: r.get(1)?,
                        topic_id: r.get(2)?,
                        answers: Vec::new(),
                        correct: r.get(4)?,
                        total: r.get(5)?,
                        score: r.get(6)?,
                        xp_awarded: r.get::<_, i64>(7)?.max(0) as u64,
                        perfect: r.get::<_, i32>(8)? != 0,
                        best_answer_streak: r.get(9)?,
                        taken_at: r.get(10)?,
                    },
                    r.get::<_, String>(11)?,
                ))
            })?
            .filter_map(|r| r.ok())
            .filter_map(|(id, answers, mut attempt, topic_title)| {
                attempt.id = Uuid::parse_str(&id).ok()?;
                attempt.answers = serde_json::from_str::<Vec<AnswerRecord>>(&answers).unwrap_or_default();
                Some(QuizHistoryEntry { attempt, topic_title })
            })
            .collect();
        Ok(rows)
    }

    /// Scores in the order they were taken (oldest first)
    pub fn scores(conn: &Connection, student_id: StudentId) -> Result<Vec<(i64, f64)>> {
        let mut stmt = conn.prepare(
            "SELECT taken_at, score FROM quiz_attempts WHERE student_id = ?1 ORDER BY taken_at, rowid",
        )?;
        let scores = stmt
            .query_map([student_id], |r| Ok((r.get(0)?, r.get(1)?)))?
            .filter_map(|r| r.ok())
            .collect();
        Ok(scores)
    }

    pub fn count(conn: &Connection, student_id: StudentId) -> Result<u32> {
        Ok(conn.query_row(
            "SELECT COUNT(*) FROM quiz_attempts WHERE student_id = ?1",
            [student_id],
            |r| r.get(0),
        )?)
    }
}

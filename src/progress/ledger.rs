//! XP ledger
//!
//! Total XP is the sum of ledger entries. `students.total_xp` and
//! `students.level` are caches updated in the same transaction as the entry
//! and can be rebuilt with [`XpLedger::reconcile`].

use anyhow::Result;
use chrono::NaiveDate;
use rusqlite::Connection;
use serde::Serialize;

use super::gamification::Level;
use super::time_bucket::{HistoryBucket, day_bucket, parse_day_bucket};
use crate::domain::{AttemptId, StudentId, TopicId};

pub const TOPIC_COMPLETION_XP: u64 = 50;
pub const CORRECT_ANSWER_XP: u64 = 10;
pub const PERFECT_QUIZ_BONUS_XP: u64 = 50;
pub const CHALLENGE_XP: u64 = 100;
pub const FLASHCARD_SESSION_XP: u64 = 30;
pub const DAILY_LOGIN_XP: u64 = 20;

/// Streak length → bonus XP
pub const STREAK_MILESTONES: &[(u32, u64)] = &[(7, 200), (14, 400), (30, 1000)];

/// What an XP award is for. Each source maps to a stable key; the ledger
/// accepts at most one entry per (student, key).
#[derive(Debug, Clone, PartialEq)]
pub enum XpSource {
    TopicCompleted(TopicId),
    Quiz {
        attempt: AttemptId,
        correct: u32,
        perfect: bool,
    },
    Challenge(NaiveDate),
    Flashcards { deck: String, day: NaiveDate },
    DailyLogin(NaiveDate),
    StreakMilestone { days: u32, day: NaiveDate },
}

impl XpSource {
    pub fn source_key(&self) -> String {
        match self {
            Self::TopicCompleted(id) => format!("topic:{id}"),
            Self::Quiz { attempt, .. } => format!("quiz:{attempt}"),
            Self::Challenge(day) => format!("challenge:{}", day_bucket(*day)),
            Self::Flashcards { deck, day } => format!("flashcards:{deck}:{}", day_bucket(*day)),
            Self::DailyLogin(day) => format!("login:{}", day_bucket(*day)),
            Self::StreakMilestone { days, day } => format!("streak:{days}:{}", day_bucket(*day)),
        }
    }

    pub fn amount(&self) -> u64 {
        match self {
            Self::TopicCompleted(_) => TOPIC_COMPLETION_XP,
            Self::Quiz { correct, perfect, .. } => quiz_xp(*correct, *perfect),
            Self::Challenge(_) => CHALLENGE_XP,
            Self::Flashcards { .. } => FLASHCARD_SESSION_XP,
            Self::DailyLogin(_) => DAILY_LOGIN_XP,
            Self::StreakMilestone { days, .. } => STREAK_MILESTONES
                .iter()
                .find(|(d, _)| d == days)
                .map(|(_, xp)| *xp)
                .unwrap_or(0),
        }
    }

    pub fn reason(&self) -> String {
        match self {
            Self::TopicCompleted(_) => "Completed topic".to_string(),
            Self::Quiz { correct, perfect: true, .. } => {
                format!("Quiz: {correct} correct (perfect score)")
            }
            Self::Quiz { correct, .. } => format!("Quiz: {correct} correct"),
            Self::Challenge(_) => "Daily challenge completed".to_string(),
            Self::Flashcards { deck, .. } => format!("Flashcard session: {deck}"),
            Self::DailyLogin(_) => "Daily login bonus".to_string(),
            Self::StreakMilestone { days, .. } => format!("{days}-day streak bonus"),
        }
    }
}

/// XP for a quiz with `correct` right answers
pub fn quiz_xp(correct: u32, perfect: bool) -> u64 {
    let bonus = if perfect { PERFECT_QUIZ_BONUS_XP } else { 0 };
    CORRECT_ANSWER_XP * correct as u64 + bonus
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AwardOutcome {
    /// XP credited by this call (0 when the source was already recorded)
    pub awarded: u64,
    pub total: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct XpEntry {
    pub amount: u64,
    pub source_key: String,
    pub reason: String,
    pub created_at: i64,
    pub day: NaiveDate,
}

/// Per-bucket XP deltas, oldest first.
///
/// Holds per-day sums; [`XpHistory::iter`] folds them into the requested
/// bucket on demand and can be called any number of times.
#[derive(Debug, Clone)]
pub struct XpHistory {
    bucket: HistoryBucket,
    days: Vec<(NaiveDate, u64)>,
}

impl XpHistory {
    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, u64)> + '_ {
        let bucket = self.bucket;
        let mut days = self.days.iter().peekable();
        std::iter::from_fn(move || {
            let (first, amount) = days.next()?;
            let start = bucket.start_of(*first);
            let mut sum = *amount;
            while let Some((day, amount)) = days.peek() {
                if bucket.start_of(*day) != start {
                    break;
                }
                sum += *amount;
                days.next();
            }
            Some((start, sum))
        })
    }
}

pub struct XpLedger;

impl XpLedger {
    /// Credit `source` to a student at most once.
    pub fn award(
        conn: &Connection,
        student_id: StudentId,
        source: &XpSource,
        at: i64,
        day: NaiveDate,
    ) -> Result<AwardOutcome> {
        let amount = source.amount();
        let inserted = if amount == 0 {
            0
        } else {
            conn.execute(
                r#"INSERT OR IGNORE INTO xp_ledger
                   (student_id, amount, source_key, reason, created_at, day_bucket)
                   VALUES (?1, ?2, ?3, ?4, ?5, ?6)"#,
                rusqlite::params![
                    student_id,
                    amount as i64,
                    source.source_key(),
                    source.reason(),
                    at,
                    day_bucket(day),
                ],
            )?
        };

        if inserted == 0 {
            return Ok(AwardOutcome {
                awarded: 0,
                total: Self::cached_total(conn, student_id)?,
            });
        }

        let total = Self::cached_total(conn, student_id)? + amount;
        conn.execute(
            "UPDATE students SET total_xp = ?1, level = ?2 WHERE id = ?3",
            rusqlite::params![total as i64, Level::for_xp(total).label(), student_id],
        )?;
        Ok(AwardOutcome {
            awarded: amount,
            total,
        })
    }

    fn cached_total(conn: &Connection, student_id: StudentId) -> Result<u64> {
        let total: i64 = conn.query_row(
            "SELECT total_xp FROM students WHERE id = ?1",
            [student_id],
            |r| r.get(0),
        )?;
        Ok(total.max(0) as u64)
    }

    /// Sum of all ledger entries
    pub fn total(conn: &Connection, student_id: StudentId) -> Result<u64> {
        let total: i64 = conn.query_row(
            "SELECT COALESCE(SUM(amount), 0) FROM xp_ledger WHERE student_id = ?1",
            [student_id],
            |r| r.get(0),
        )?;
        Ok(total.max(0) as u64)
    }

    pub fn history(conn: &Connection, student_id: StudentId, bucket: HistoryBucket) -> Result<XpHistory> {
        let mut stmt = conn.prepare(
            r#"SELECT day_bucket, SUM(amount) FROM xp_ledger
               WHERE student_id = ?1 GROUP BY day_bucket ORDER BY day_bucket"#,
        )?;
        let days = stmt
            .query_map([student_id], |r| Ok((r.get::<_, String>(0)?, r.get::<_, i64>(1)?)))?
            .filter_map(|r| r.ok())
            .filter_map(|(day, amount)| Some((parse_day_bucket(&day)?, amount.max(0) as u64)))
            .collect();
        Ok(XpHistory { bucket, days })
    }

    /// Newest entries first
    pub fn recent(conn: &Connection, student_id: StudentId, limit: usize) -> Result<Vec<XpEntry>> {
        let mut stmt = conn.prepare(
            r#"SELECT amount, source_key, reason, created_at, day_bucket FROM xp_ledger
               WHERE student_id = ?1 ORDER BY created_at DESC, id DESC LIMIT ?2"#,
        )?;
        let entries = stmt
            .query_map(rusqlite::params![student_id, limit as i64], |r| {
                Ok((
                    r.get::<_, i64>(0)?,
                    r.get::<_, String>(1)?,
                    r.get::<_, String>(2)?,
                    r.get::<_, i64>(3)?,
                    r.get::<_, String>(4)?,
                ))
            })?
            .filter_map(|r| r.ok())
            .filter_map(|(amount, source_key, reason, created_at, day)| {
                Some(XpEntry {
                    amount: amount.max(0) as u64,
                    source_key,
                    reason,
                    created_at,
                    day: parse_day_bucket(&day)?,
                })
            })
            .collect();
        Ok(entries)
    }

    /// Rewrite the cached total and level from the ledger sum. Returns
    /// `(cached_before, ledger_total)`.
    pub fn reconcile(conn: &Connection, student_id: StudentId) -> Result<(u64, u64)> {
        let before = Self::cached_total(conn, student_id)?;
        let total = Self::total(conn, student_id)?;
        conn.execute(
            "UPDATE students SET total_xp = ?1, level = ?2 WHERE id = ?3",
            rusqlite::params![total as i64, Level::for_xp(total).label(), student_id],
        )?;
        Ok((before, total))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::ProgressDb;

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, m, d).unwrap()
    }

    fn seed_student(conn: &Connection) -> StudentId {
        conn.execute(
            "INSERT INTO students (name, pin_digest, created_at) VALUES ('Ren', 'x', 0)",
            [],
        )
        .unwrap();
        conn.last_insert_rowid()
    }

    #[test]
    fn test_award_is_at_most_once_per_source() {
        let db = ProgressDb::open_in_memory().unwrap();
        let conn = db.conn();
        let id = seed_student(&conn);

        let first = XpLedger::award(&conn, id, &XpSource::TopicCompleted(3), 1, date(1, 5)).unwrap();
        let again = XpLedger::award(&conn, id, &XpSource::TopicCompleted(3), 2, date(1, 5)).unwrap();

        assert_eq!(first, AwardOutcome { awarded: 50, total: 50 });
        assert_eq!(again, AwardOutcome { awarded: 0, total: 50 });
        assert_eq!(XpLedger::total(&conn, id).unwrap(), 50);
    }

    #[test]
    fn test_award_updates_cached_level() {
        let db = ProgressDb::open_in_memory().unwrap();
        let conn = db.conn();
        let id = seed_student(&conn);

        for n in 0..10 {
            XpLedger::award(&conn, id, &XpSource::TopicCompleted(n), n, date(1, 5)).unwrap();
        }
        let level: String = conn
            .query_row("SELECT level FROM students WHERE id = ?1", [id], |r| r.get(0))
            .unwrap();
        assert_eq!(level, "Builder");
    }

    #[test]
    fn test_quiz_xp_table() {
        assert_eq!(quiz_xp(5, true), 100);
        assert_eq!(quiz_xp(3, false), 30);
        assert_eq!(quiz_xp(0, false), 0);
        let src = XpSource::StreakMilestone { days: 14, day: date(1, 1) };
        assert_eq!(src.amount(), 400);
        assert_eq!(src.source_key(), "streak:14:2026-01-01");
    }

    #[test]
    fn test_history_buckets_restartable() {
        let db = ProgressDb::open_in_memory().unwrap();
        let conn = db.conn();
        let id = seed_student(&conn);

        // Mon 2026-01-05, Wed 2026-01-07, Mon 2026-01-12
        XpLedger::award(&conn, id, &XpSource::DailyLogin(date(1, 5)), 1, date(1, 5)).unwrap();
        XpLedger::award(&conn, id, &XpSource::TopicCompleted(1), 2, date(1, 7)).unwrap();
        XpLedger::award(&conn, id, &XpSource::Challenge(date(1, 12)), 3, date(1, 12)).unwrap();

        let weekly = XpLedger::history(&conn, id, HistoryBucket::Week).unwrap();
        let first: Vec<_> = weekly.iter().collect();
        let second: Vec<_> = weekly.iter().collect();
        assert_eq!(first, vec![(date(1, 5), 70), (date(1, 12), 100)]);
        assert_eq!(first, second);

        let monthly = XpLedger::history(&conn, id, HistoryBucket::Month).unwrap();
        assert_eq!(monthly.iter().collect::<Vec<_>>(), vec![(date(1, 1), 170)]);
    }

    #[test]
    fn test_reconcile_repairs_cache() {
        let db = ProgressDb::open_in_memory().unwrap();
        let conn = db.conn();
        let id = seed_student(&conn);
        XpLedger::award(&conn, id, &XpSource::Challenge(date(2, 1)), 1, date(2, 1)).unwrap();
        conn.execute("UPDATE students SET total_xp = 7 WHERE id = ?1", [id]).unwrap();

        assert_eq!(XpLedger::reconcile(&conn, id).unwrap(), (7, 100));
        assert_eq!(XpLedger::reconcile(&conn, id).unwrap(), (100, 100));
    }
}

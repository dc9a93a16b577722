//! Daily challenges
//!
//! One challenge per calendar date, identical for every student. The kind
//! follows a weekly rotation with the boss challenge on Sunday; the text
//! inside a kind rotates by day ordinal.

use anyhow::Result;
use chrono::{Datelike, NaiveDate, Weekday};
use rusqlite::{Connection, OptionalExtension};

use crate::domain::{Challenge, ChallengeKind, ChallengeResponse, StudentId};
use crate::progress::time_bucket::{day_bucket, parse_day_bucket};

const ID_PREFIX: &str = "ch-";

static QUIZ_TEXTS: &[&str] = &[
    "Rapid fire: define supervised learning, unsupervised learning and reinforcement learning in one sentence each.",
    "Name three places you used AI today without noticing. What data did each one need?",
    "Explain the difference between training data and test data, and why mixing them up is a problem.",
    "List four words that describe how a neural network learns and define each in your own words.",
];

static EXPLAIN_TEXTS: &[&str] = &[
    "Explain how a recommendation feed picks the next item to show you, as if to a ten-year-old.",
    "Describe what a large language model does when it answers a question. Keep it under 100 words.",
    "Explain overfitting using an example from sport, games or school.",
    "Teach a friend what a prompt is and why wording changes the answer.",
];

static APPLY_TEXTS: &[&str] = &[
    "Sketch a flowchart for a system that sorts support emails by urgency. Which steps could use AI?",
    "Write a prompt that turns a messy paragraph into a three-bullet summary. Share the prompt and the output.",
    "Pick one daily chore and design an AI assistant for it: inputs, outputs and one failure case.",
    "Design a tiny dataset (ten rows) to teach a model to spot spam. What columns do you need?",
];

static DEBATE_TEXTS: &[&str] = &[
    "Should schools allow AI tools for homework? Argue one side in three points.",
    "Will AI create more jobs than it replaces in the next ten years? Defend your view.",
    "Is it fair to use AI-generated art in a competition? Take a side.",
    "Should recommendation algorithms be explainable to the people they target? Argue for or against.",
];

static BOSS_TEXTS: &[&str] = &[
    "Boss challenge: design a complete product that uses at least three AI techniques you have learned. Describe users, data and risks.",
    "Boss challenge: plan an AI system end to end, from data collection through deployment and monitoring.",
    "Boss challenge: write a one-page report on where AI helps and where it hurts in a field you care about.",
];

pub struct DailyChallengeScheduler;

impl DailyChallengeScheduler {
    /// Kind for a date, and whether it is the boss challenge
    pub fn kind_for(date: NaiveDate) -> (ChallengeKind, bool) {
        match date.weekday() {
            Weekday::Mon | Weekday::Fri => (ChallengeKind::Quiz, false),
            Weekday::Tue | Weekday::Sat => (ChallengeKind::Explain, false),
            Weekday::Wed => (ChallengeKind::Apply, false),
            Weekday::Thu => (ChallengeKind::Debate, false),
            Weekday::Sun => (ChallengeKind::Apply, true),
        }
    }

    pub fn challenge_id(date: NaiveDate) -> String {
        format!("{ID_PREFIX}{}", day_bucket(date))
    }

    /// Date encoded in a challenge id
    pub fn parse_id(id: &str) -> Option<NaiveDate> {
        parse_day_bucket(id.strip_prefix(ID_PREFIX)?)
    }

    pub fn for_date(date: NaiveDate) -> Challenge {
        let (kind, boss) = Self::kind_for(date);
        let pool = if boss {
            BOSS_TEXTS
        } else {
            match kind {
                ChallengeKind::Quiz => QUIZ_TEXTS,
                ChallengeKind::Explain => EXPLAIN_TEXTS,
                ChallengeKind::Apply => APPLY_TEXTS,
                ChallengeKind::Debate => DEBATE_TEXTS,
            }
        };
        let ordinal = date.num_days_from_ce().max(0) as usize;
        Challenge {
            id: Self::challenge_id(date),
            date,
            kind,
            boss,
            text: pool[ordinal % pool.len()].to_string(),
        }
    }

    pub fn response_for(
        conn: &Connection,
        student_id: StudentId,
        date: NaiveDate,
    ) -> Result<Option<ChallengeResponse>> {
        let row = conn
            .query_row(
                r#"SELECT challenge_id, response, completed, xp_earned, submitted_at
                   FROM challenge_responses WHERE student_id = ?1 AND challenge_date = ?2"#,
                rusqlite::params![student_id, day_bucket(date)],
                |r| {
                    Ok(ChallengeResponse {
                        student_id,
                        challenge_id: r.get(0)?,
                        date,
                        response: r.get(1)?,
                        completed: r.get::<_, i32>(2)? != 0,
                        xp_earned: r.get::<_, i64>(3)?.max(0) as u64,
                        submitted_at: r.get(4)?,
                    })
                },
            )
            .optional()?;
        Ok(row)
    }

    /// Store a response. Returns false when the student already answered the
    /// challenge for that date.
    pub fn record(conn: &Connection, challenge: &Challenge, response: &ChallengeResponse) -> Result<bool> {
        let inserted = conn.execute(
            r#"INSERT OR IGNORE INTO challenge_responses
               (student_id, challenge_date, challenge_id, kind, boss, response, completed, xp_earned, submitted_at)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"#,
            rusqlite::params![
                response.student_id,
                day_bucket(challenge.date),
                challenge.id,
                challenge.kind.as_str(),
                challenge.boss as i32,
                response.response,
                response.completed as i32,
                response.xp_earned as i64,
                response.submitted_at,
            ],
        )?;
        Ok(inserted > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::ProgressDb;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, d).unwrap()
    }

    #[test]
    fn test_weekly_rotation() {
        // 2026-10-12 is a Monday
        let kinds: Vec<_> = (12..19).map(|d| DailyChallengeScheduler::kind_for(date(d))).collect();
        assert_eq!(
            kinds,
            vec![
                (ChallengeKind::Quiz, false),
                (ChallengeKind::Explain, false),
                (ChallengeKind::Apply, false),
                (ChallengeKind::Debate, false),
                (ChallengeKind::Quiz, false),
                (ChallengeKind::Explain, false),
                (ChallengeKind::Apply, true),
            ]
        );
    }

    #[test]
    fn test_same_date_same_challenge() {
        let a = DailyChallengeScheduler::for_date(date(14));
        let b = DailyChallengeScheduler::for_date(date(14));
        assert_eq!(a, b);
        assert_eq!(a.id, "ch-2026-10-14");
        assert_eq!(DailyChallengeScheduler::parse_id(&a.id), Some(date(14)));
        assert_eq!(DailyChallengeScheduler::parse_id("2026-10-14"), None);
    }

    #[test]
    fn test_texts_rotate_within_kind() {
        let this_monday = DailyChallengeScheduler::for_date(date(12));
        let next_monday = DailyChallengeScheduler::for_date(date(19));
        assert_eq!(this_monday.kind, next_monday.kind);
        assert_ne!(this_monday.text, next_monday.text);
    }

    #[test]
    fn test_one_response_per_day() {
        let db = ProgressDb::open_in_memory().unwrap();
        let conn = db.conn();
        conn.execute(
            "INSERT INTO students (name, pin_digest, created_at) VALUES ('Zed', 'x', 0)",
            [],
        )
        .unwrap();
        let id = conn.last_insert_rowid();
        let challenge = DailyChallengeScheduler::for_date(date(15));
        let response = ChallengeResponse {
            student_id: id,
            challenge_id: challenge.id.clone(),
            date: challenge.date,
            response: "Because data".to_string(),
            completed: true,
            xp_earned: 100,
            submitted_at: 1,
        };

        assert!(DailyChallengeScheduler::record(&conn, &challenge, &response).unwrap());
        assert!(!DailyChallengeScheduler::record(&conn, &challenge, &response).unwrap());
        let stored = DailyChallengeScheduler::response_for(&conn, id, date(15)).unwrap().unwrap();
        assert_eq!(stored.response, "Because data");
        assert!(DailyChallengeScheduler::response_for(&conn, id, date(16)).unwrap().is_none());
    }
}

//! Leaderboard ranking
//!
//! Students (never admins) ordered by XP descending. Ties go to whoever
//! reached their value first (last contributing ledger entry, enrollment time
//! when there is none), then to the lower student id. Streaks shown are as of
//! each student's own calendar day.

use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use super::StreakState;
use crate::domain::{StudentId, Track};
use crate::progress::time_bucket::{day_bucket, local_day, parse_day_bucket, window_start};

/// Days in the weekly window, today included
pub const WEEKLY_WINDOW_DAYS: u32 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeaderboardPeriod {
    #[default]
    All,
    Weekly,
}

impl LeaderboardPeriod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Weekly => "weekly",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "all" | "all_time" => Some(Self::All),
            "weekly" | "week" => Some(Self::Weekly),
            _ => None,
        }
    }

    /// Inclusive day range counted for this period, None for all time
    pub fn window(&self, today: NaiveDate) -> Option<(NaiveDate, NaiveDate)> {
        match self {
            Self::All => None,
            Self::Weekly => Some((window_start(today, WEEKLY_WINDOW_DAYS), today)),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LeaderboardEntry {
    pub rank: u32,
    pub student_id: StudentId,
    pub name: String,
    pub avatar: String,
    pub track: Option<Track>,
    pub level: String,
    /// XP counted for the period
    pub xp: u64,
    pub total_xp: u64,
    pub current_streak: u32,
    /// When the counted value was reached (ms since epoch)
    pub reached_at: i64,
}

struct Ranked {
    entry: LeaderboardEntry,
    streak: StreakState,
    utc_offset_minutes: i32,
}

pub struct LeaderboardRanker;

impl LeaderboardRanker {
    /// Full ranking at `now`. Run inside one read transaction for a
    /// consistent snapshot.
    pub fn rank(
        conn: &Connection,
        window: Option<(NaiveDate, NaiveDate)>,
        now: DateTime<Utc>,
    ) -> Result<Vec<LeaderboardEntry>> {
        let at = now.timestamp_millis();
        Ok(Self::ordered(conn, window)?
            .into_iter()
            .map(|ranked| {
                let today = local_day(at, ranked.utc_offset_minutes);
                LeaderboardEntry {
                    current_streak: ranked.streak.current_as_of(today),
                    ..ranked.entry
                }
            })
            .collect())
    }

    /// 1-based position of one student, None for admins and unknown ids
    pub fn position(
        conn: &Connection,
        student_id: StudentId,
        window: Option<(NaiveDate, NaiveDate)>,
    ) -> Result<Option<u32>> {
        Ok(Self::ordered(conn, window)?
            .into_iter()
            .find(|r| r.entry.student_id == student_id)
            .map(|r| r.entry.rank))
    }

    fn ordered(conn: &Connection, window: Option<(NaiveDate, NaiveDate)>) -> Result<Vec<Ranked>> {
        let (from, to) = match window {
            Some((from, to)) => (day_bucket(from), day_bucket(to)),
            None => ("0000-01-01".to_string(), "9999-12-31".to_string()),
        };

        let mut stmt = conn.prepare(
            r#"SELECT s.id, s.name, s.avatar, s.track, s.level, s.total_xp, s.current_streak,
                      s.created_at, COALESCE(SUM(l.amount), 0), MAX(l.created_at),
                      s.longest_streak, s.streak_freezes, s.last_active_day, s.utc_offset_minutes
               FROM students s
               LEFT JOIN xp_ledger l
                 ON l.student_id = s.id AND l.day_bucket >= ?1 AND l.day_bucket <= ?2
               WHERE s.role = 'student'
               GROUP BY s.id"#,
        )?;
        let mut ranked: Vec<Ranked> = stmt
            .query_map(rusqlite::params![from, to], |r| {
                let created_at: i64 = r.get(7)?;
                let last_entry: Option<i64> = r.get(9)?;
                let current_streak: u32 = r.get(6)?;
                Ok(Ranked {
                    entry: LeaderboardEntry {
                        rank: 0,
                        student_id: r.get(0)?,
                        name: r.get(1)?,
                        avatar: r.get(2)?,
                        track: r.get::<_, Option<String>>(3)?.as_deref().and_then(Track::from_str),
                        level: r.get(4)?,
                        total_xp: r.get::<_, i64>(5)?.max(0) as u64,
                        current_streak,
                        xp: r.get::<_, i64>(8)?.max(0) as u64,
                        reached_at: last_entry.unwrap_or(created_at),
                    },
                    streak: StreakState {
                        current: current_streak,
                        longest: r.get(10)?,
                        freezes: r.get(11)?,
                        last_day: r.get::<_, Option<String>>(12)?.as_deref().and_then(parse_day_bucket),
                    },
                    utc_offset_minutes: r.get(13)?,
                })
            })?
            .filter_map(|r| r.ok())
            .collect();

        ranked.sort_by(|a, b| {
            b.entry
                .xp
                .cmp(&a.entry.xp)
                .then(a.entry.reached_at.cmp(&b.entry.reached_at))
                .then(a.entry.student_id.cmp(&b.entry.student_id))
        });
        for (i, r) in ranked.iter_mut().enumerate() {
            r.entry.rank = i as u32 + 1;
        }
        Ok(ranked)
    }
}

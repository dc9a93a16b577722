//! Daily activity streaks
//!
//! A streak is a fold over the student's sorted activity days starting from
//! their starting freeze allowance. Incremental updates apply the same step
//! as a full replay, so the cached columns on `students` always equal what
//! replaying the event log would produce.

use anyhow::Result;
use chrono::NaiveDate;
use rusqlite::Connection;
use serde::Serialize;

use crate::domain::StudentId;
use crate::progress::event_log::EventLog;
use crate::progress::time_bucket::{day_bucket, parse_day_bucket};

/// Every this many consecutive days earns one freeze
pub const FREEZE_EVERY_DAYS: u32 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct StreakState {
    pub current: u32,
    pub longest: u32,
    pub freezes: u32,
    pub last_day: Option<NaiveDate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StreakChange {
    /// Already active that day
    Unchanged,
    Started,
    Extended,
    /// Gap covered by spending one freeze
    Bridged,
    /// Gap with no freeze left; streak restarted at 1
    Reset,
    /// Day earlier than the last active day; rebuilt from history
    Replayed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StreakUpdate {
    pub state: StreakState,
    pub change: StreakChange,
    pub freeze_earned: bool,
}

impl StreakUpdate {
    /// Streak length just reached when it grew this call
    pub fn reached(&self) -> Option<u32> {
        match self.change {
            StreakChange::Extended | StreakChange::Bridged => Some(self.state.current),
            _ => None,
        }
    }
}

impl StreakState {
    pub fn fresh(starting_freezes: u32) -> Self {
        Self {
            freezes: starting_freezes,
            ..Self::default()
        }
    }

    /// Apply one activity day. Returns `None` when `day` precedes the last
    /// active day and the streak must be replayed instead.
    pub fn advance(&self, day: NaiveDate) -> Option<StreakUpdate> {
        let mut next = *self;
        let change = match self.last_day {
            None => {
                next.current = 1;
                StreakChange::Started
            }
            Some(last) if day < last => return None,
            Some(last) if day == last => StreakChange::Unchanged,
            Some(last) => {
                let gap = (day - last).num_days();
                if gap == 1 {
                    next.current += 1;
                    StreakChange::Extended
                } else if self.current > 0 && self.freezes > 0 {
                    next.freezes -= 1;
                    next.current += 1;
                    StreakChange::Bridged
                } else {
                    next.current = 1;
                    StreakChange::Reset
                }
            }
        };

        let grew = matches!(change, StreakChange::Extended | StreakChange::Bridged);
        let freeze_earned = grew && next.current % FREEZE_EVERY_DAYS == 0;
        if freeze_earned {
            next.freezes += 1;
        }
        if change != StreakChange::Unchanged {
            next.last_day = Some(day);
        }
        next.longest = next.longest.max(next.current);

        Some(StreakUpdate {
            state: next,
            change,
            freeze_earned,
        })
    }

    /// Rebuild from the full activity history (sorted, distinct days).
    pub fn replay(starting_freezes: u32, days: &[NaiveDate]) -> Self {
        days.iter().fold(Self::fresh(starting_freezes), |state, day| {
            state.advance(*day).map(|u| u.state).unwrap_or(state)
        })
    }

    /// Streak as it stands on `today`. A gap of more than one day with no
    /// freeze left to cover it means the streak is already broken.
    pub fn current_as_of(&self, today: NaiveDate) -> u32 {
        let Some(last) = self.last_day else {
            return 0;
        };
        let gap = (today - last).num_days();
        if gap <= 1 || self.freezes > 0 {
            self.current
        } else {
            0
        }
    }
}

/// Reads and writes the cached streak columns
pub struct StreakTracker;

impl StreakTracker {
    pub fn load(conn: &Connection, student_id: StudentId) -> Result<StreakState> {
        let (current, longest, freezes, last): (u32, u32, u32, Option<String>) = conn.query_row(
            r#"SELECT current_streak, longest_streak, streak_freezes, last_active_day
               FROM students WHERE id = ?1"#,
            [student_id],
            |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?)),
        )?;
        Ok(StreakState {
            current,
            longest,
            freezes,
            last_day: last.as_deref().and_then(parse_day_bucket),
        })
    }

    fn save(conn: &Connection, student_id: StudentId, state: &StreakState) -> Result<()> {
        conn.execute(
            r#"UPDATE students SET current_streak = ?1, longest_streak = ?2,
                   streak_freezes = ?3, last_active_day = ?4
               WHERE id = ?5"#,
            rusqlite::params![
                state.current,
                state.longest,
                state.freezes,
                state.last_day.map(day_bucket),
                student_id,
            ],
        )?;
        Ok(())
    }

    fn starting_freezes(conn: &Connection, student_id: StudentId) -> Result<u32> {
        Ok(conn.query_row(
            "SELECT starting_freezes FROM students WHERE id = ?1",
            [student_id],
            |r| r.get(0),
        )?)
    }

    /// Record activity on `day`. The event for that day must already be in
    /// the event log so a replay sees it.
    pub fn record_activity(conn: &Connection, student_id: StudentId, day: NaiveDate) -> Result<StreakUpdate> {
        let state = Self::load(conn, student_id)?;
        let update = match state.advance(day) {
            Some(update) => update,
            None => {
                tracing::debug!(
                    "[learnforge:streak] out-of-order activity for student {} on {}, replaying",
                    student_id,
                    day
                );
                StreakUpdate {
                    state: Self::replay(conn, student_id)?,
                    change: StreakChange::Replayed,
                    freeze_earned: false,
                }
            }
        };
        if update.state != state {
            Self::save(conn, student_id, &update.state)?;
        }
        Ok(update)
    }

    fn replay(conn: &Connection, student_id: StudentId) -> Result<StreakState> {
        let days = EventLog::activity_days(conn, student_id)?;
        Ok(StreakState::replay(Self::starting_freezes(conn, student_id)?, &days))
    }

    /// Recompute from the event log and overwrite the cache. Returns
    /// `(cached, replayed)`.
    pub fn repair(conn: &Connection, student_id: StudentId) -> Result<(StreakState, StreakState)> {
        let cached = Self::load(conn, student_id)?;
        let replayed = Self::replay(conn, student_id)?;
        if cached != replayed {
            Self::save(conn, student_id, &replayed)?;
        }
        Ok((cached, replayed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn day(n: i64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 1).unwrap() + Duration::days(n)
    }

    fn fold(freezes: u32, days: &[i64]) -> StreakState {
        let mut state = StreakState::fresh(freezes);
        for d in days {
            state = state.advance(day(*d)).unwrap().state;
        }
        state
    }

    #[test]
    fn test_same_day_is_unchanged() {
        let state = fold(0, &[0]);
        let update = state.advance(day(0)).unwrap();
        assert_eq!(update.change, StreakChange::Unchanged);
        assert_eq!(update.state, state);
    }

    #[test]
    fn test_consecutive_days_extend() {
        let state = fold(0, &[0, 1, 2]);
        assert_eq!(state.current, 3);
        assert_eq!(state.longest, 3);
    }

    #[test]
    fn test_gap_resets_without_freeze() {
        let state = fold(0, &[0, 1, 2, 5]);
        assert_eq!(state.current, 1);
        assert_eq!(state.longest, 3);
    }

    #[test]
    fn test_gap_consumes_freeze() {
        let state = fold(1, &[0, 1, 4]);
        assert_eq!(state.current, 3);
        assert_eq!(state.freezes, 0);
    }

    #[test]
    fn test_seventh_day_earns_freeze() {
        let state = StreakState::fresh(0);
        let mut state = state;
        let mut earned = 0;
        for d in 0..7 {
            let update = state.advance(day(d)).unwrap();
            earned += update.freeze_earned as u32;
            state = update.state;
        }
        assert_eq!(state.current, 7);
        assert_eq!(earned, 1);
        assert_eq!(state.freezes, 1);
    }

    #[test]
    fn test_earlier_day_requires_replay() {
        let state = fold(0, &[3]);
        assert!(state.advance(day(1)).is_none());
    }

    #[test]
    fn test_replay_matches_incremental() {
        let histories: &[&[i64]] = &[
            &[0, 1, 2, 3, 4, 5, 6, 7, 9, 10, 15],
            &[0, 2, 4, 6],
            &[0, 1, 2, 3, 4, 5, 6, 8, 9, 10, 11, 12, 13, 20, 21],
        ];
        for freezes in 0..3 {
            for history in histories {
                let incremental = fold(freezes, history);
                let days: Vec<_> = history.iter().map(|d| day(*d)).collect();
                assert_eq!(StreakState::replay(freezes, &days), incremental);
            }
        }
    }

    #[test]
    fn test_current_as_of() {
        let state = fold(0, &[0, 1, 2]);
        assert_eq!(state.current_as_of(day(2)), 3);
        assert_eq!(state.current_as_of(day(3)), 3);
        assert_eq!(state.current_as_of(day(5)), 0);
        let frozen = fold(1, &[0, 1, 2]);
        assert_eq!(frozen.current_as_of(day(5)), 3);
        assert_eq!(StreakState::default().current_as_of(day(0)), 0);
    }
}

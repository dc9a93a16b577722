//! Append-only event log
//!
//! Events are never updated or deleted by the engine. The UNIQUE
//! (student_id, source_key) constraint collapses retried requests.

use anyhow::Result;
use chrono::NaiveDate;
use rusqlite::Connection;

use super::time_bucket::{day_bucket, parse_day_bucket};
use crate::domain::{EventKind, LearningEvent, NewEvent, StudentId};

pub struct EventLog;

impl EventLog {
    /// Append an event. Returns the new row id, or `None` when an event with
    /// the same source key was already logged for this student.
    pub fn append(conn: &Connection, event: &NewEvent) -> Result<Option<i64>> {
        let inserted = conn.execute(
            r#"INSERT OR IGNORE INTO events
               (student_id, kind, source_key, payload, occurred_at, day_bucket, local_hour)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"#,
            rusqlite::params![
                event.student_id,
                event.kind.as_str(),
                event.source_key,
                event.payload.to_string(),
                event.occurred_at,
                day_bucket(event.day),
                event.hour,
            ],
        )?;
        if inserted == 0 {
            return Ok(None);
        }
        Ok(Some(conn.last_insert_rowid()))
    }

    /// Distinct activity days for a student, oldest first
    pub fn activity_days(conn: &Connection, student_id: StudentId) -> Result<Vec<NaiveDate>> {
        let mut stmt = conn.prepare(
            "SELECT DISTINCT day_bucket FROM events WHERE student_id = ?1 ORDER BY day_bucket",
        )?;
        let days = stmt
            .query_map([student_id], |r| r.get::<_, String>(0))?
            .filter_map(|r| r.ok())
            .filter_map(|s| parse_day_bucket(&s))
            .collect();
        Ok(days)
    }

    pub fn count_kind(conn: &Connection, student_id: StudentId, kind: EventKind) -> Result<u32> {
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM events WHERE student_id = ?1 AND kind = ?2",
            rusqlite::params![student_id, kind.as_str()],
            |r| r.get(0),
        )?;
        Ok(count as u32)
    }

    /// Count events whose local hour falls in `[from, to)`. A range with
    /// `from > to` wraps around midnight.
    pub fn count_in_hours(conn: &Connection, student_id: StudentId, from: u32, to: u32) -> Result<u32> {
        let sql = if from <= to {
            "SELECT COUNT(*) FROM events WHERE student_id = ?1 AND local_hour >= ?2 AND local_hour < ?3"
        } else {
            "SELECT COUNT(*) FROM events WHERE student_id = ?1 AND (local_hour >= ?2 OR local_hour < ?3)"
        };
        let count: i64 = conn.query_row(sql, rusqlite::params![student_id, from, to], |r| r.get(0))?;
        Ok(count as u32)
    }

    /// Most recent events, newest first
    pub fn recent(conn: &Connection, student_id: StudentId, limit: usize) -> Result<Vec<LearningEvent>> {
        let mut stmt = conn.prepare(
            r#"SELECT id, student_id, kind, source_key, payload, occurred_at, day_bucket, local_hour
               FROM events WHERE student_id = ?1
               ORDER BY occurred_at DESC, id DESC LIMIT ?2"#,
        )?;
        let rows = stmt
            .query_map(rusqlite::params![student_id, limit as i64], |r| {
                Ok((
                    r.get::<_, i64>(0)?,
                    r.get::<_, i64>(1)?,
                    r.get::<_, String>(2)?,
                    r.get::<_, String>(3)?,
                    r.get::<_, String>(4)?,
                    r.get::<_, i64>(5)?,
                    r.get::<_, String>(6)?,
                    r.get::<_, u32>(7)?,
                ))
            })?
            .filter_map(|r| r.ok())
            .filter_map(|(id, student_id, kind, source_key, payload, occurred_at, day, hour)| {
                Some(LearningEvent {
                    id,
                    student_id,
                    kind: EventKind::from_str(&kind)?,
                    source_key,
                    payload: serde_json::from_str(&payload).unwrap_or(serde_json::Value::Null),
                    occurred_at,
                    day: parse_day_bucket(&day)?,
                    hour,
                })
            })
            .collect();
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::ProgressDb;

    fn seed_student(conn: &Connection) -> StudentId {
        conn.execute(
            "INSERT INTO students (name, pin_digest, created_at) VALUES ('Kai', 'x', 0)",
            [],
        )
        .unwrap();
        conn.last_insert_rowid()
    }

    fn event(student_id: StudentId, key: &str, day: NaiveDate, hour: u32) -> NewEvent {
        NewEvent {
            student_id,
            kind: EventKind::TopicCompleted,
            source_key: key.to_string(),
            payload: serde_json::json!({}),
            occurred_at: 1_000,
            day,
            hour,
        }
    }

    #[test]
    fn test_duplicate_source_key_is_ignored() {
        let db = ProgressDb::open_in_memory().unwrap();
        let conn = db.conn();
        let id = seed_student(&conn);
        let day = NaiveDate::from_ymd_opt(2026, 2, 2).unwrap();

        assert!(EventLog::append(&conn, &event(id, "topic:1", day, 10)).unwrap().is_some());
        assert!(EventLog::append(&conn, &event(id, "topic:1", day, 10)).unwrap().is_none());
        assert_eq!(EventLog::count_kind(&conn, id, EventKind::TopicCompleted).unwrap(), 1);
        let recent = EventLog::recent(&conn, id, 10).unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].source_key, "topic:1");
    }

    #[test]
    fn test_activity_days_are_distinct_and_sorted() {
        let db = ProgressDb::open_in_memory().unwrap();
        let conn = db.conn();
        let id = seed_student(&conn);
        let d1 = NaiveDate::from_ymd_opt(2026, 2, 2).unwrap();
        let d2 = NaiveDate::from_ymd_opt(2026, 2, 4).unwrap();

        EventLog::append(&conn, &event(id, "a", d2, 9)).unwrap();
        EventLog::append(&conn, &event(id, "b", d1, 9)).unwrap();
        EventLog::append(&conn, &event(id, "c", d2, 9)).unwrap();
        assert_eq!(EventLog::activity_days(&conn, id).unwrap(), vec![d1, d2]);
    }

    #[test]
    fn test_hour_ranges_wrap_midnight() {
        let db = ProgressDb::open_in_memory().unwrap();
        let conn = db.conn();
        let id = seed_student(&conn);
        let day = NaiveDate::from_ymd_opt(2026, 2, 2).unwrap();

        for (key, hour) in [("a", 23), ("b", 1), ("c", 6), ("d", 14)] {
            EventLog::append(&conn, &event(id, key, day, hour)).unwrap();
        }
        assert_eq!(EventLog::count_in_hours(&conn, id, 22, 4).unwrap(), 2);
        assert_eq!(EventLog::count_in_hours(&conn, id, 5, 9).unwrap(), 1);
    }
}

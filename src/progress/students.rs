//! Student records

use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, Row};

use super::time_bucket::parse_day_bucket;
use crate::domain::{Role, Student, StudentId, Track};

const STUDENT_COLUMNS: &str = r#"id, name, role, track, avatar, total_xp, level, current_streak,
    longest_streak, streak_freezes, last_active_day, utc_offset_minutes, created_at"#;

fn student_from_row(r: &Row<'_>) -> rusqlite::Result<Student> {
    Ok(Student {
        id: r.get(0)?,
        name: r.get(1)?,
        role: Role::from_str(&r.get::<_, String>(2)?).unwrap_or_default(),
        track: r.get::<_, Option<String>>(3)?.as_deref().and_then(Track::from_str),
        avatar: r.get(4)?,
        total_xp: r.get::<_, i64>(5)?.max(0) as u64,
        level: r.get(6)?,
        current_streak: r.get(7)?,
        longest_streak: r.get(8)?,
        streak_freezes: r.get(9)?,
        last_active_day: r.get::<_, Option<String>>(10)?.as_deref().and_then(parse_day_bucket),
        utc_offset_minutes: r.get(11)?,
        created_at: r.get(12)?,
    })
}

/// Fields needed to insert a student
pub struct StudentRecord<'a> {
    pub name: &'a str,
    pub pin_digest: &'a str,
    pub role: Role,
    pub track: Option<Track>,
    pub avatar: &'a str,
    pub utc_offset_minutes: i32,
    pub starting_freezes: u32,
    pub created_at: i64,
}

pub struct StudentStore;

impl StudentStore {
    /// Insert a student. Returns `None` if the name is taken.
    pub fn insert(conn: &Connection, record: &StudentRecord<'_>) -> Result<Option<StudentId>> {
        let inserted = conn.execute(
            r#"INSERT OR IGNORE INTO students
               (name, pin_digest, role, track, avatar, streak_freezes, starting_freezes,
                utc_offset_minutes, created_at)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6, ?7, ?8)"#,
            rusqlite::params![
                record.name,
                record.pin_digest,
                record.role.as_str(),
                record.track.map(|t| t.as_str()),
                record.avatar,
                record.starting_freezes,
                record.utc_offset_minutes,
                record.created_at,
            ],
        )?;
        if inserted == 0 {
            return Ok(None);
        }
        Ok(Some(conn.last_insert_rowid()))
    }

    pub fn get(conn: &Connection, id: StudentId) -> Result<Option<Student>> {
        let sql = format!("SELECT {STUDENT_COLUMNS} FROM students WHERE id = ?1");
        Ok(conn.query_row(&sql, [id], student_from_row).optional()?)
    }

    /// Student plus stored PIN digest, looked up by display name
    pub fn find_by_name(conn: &Connection, name: &str) -> Result<Option<(Student, String)>> {
        let sql = format!("SELECT {STUDENT_COLUMNS}, pin_digest FROM students WHERE name = ?1");
        let found = conn
            .query_row(&sql, [name], |r| Ok((student_from_row(r)?, r.get::<_, String>(13)?)))
            .optional()?;
        Ok(found)
    }

    /// Learners (role `student`) by XP, highest first
    pub fn list(conn: &Connection) -> Result<Vec<Student>> {
        let sql = format!(
            "SELECT {STUDENT_COLUMNS} FROM students WHERE role = 'student' ORDER BY total_xp DESC, id"
        );
        let mut stmt = conn.prepare(&sql)?;
        let students = stmt
            .query_map([], student_from_row)?
            .filter_map(|r| r.ok())
            .collect();
        Ok(students)
    }

    /// Every id, admins included
    pub fn all_ids(conn: &Connection) -> Result<Vec<StudentId>> {
        let mut stmt = conn.prepare("SELECT id FROM students ORDER BY id")?;
        let ids = stmt.query_map([], |r| r.get(0))?.filter_map(|r| r.ok()).collect();
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::ProgressDb;

    fn record(name: &str) -> StudentRecord<'_> {
        StudentRecord {
            name,
            pin_digest: "digest",
            role: Role::Student,
            track: Some(Track::Business),
            avatar: "🦊",
            utc_offset_minutes: 330,
            starting_freezes: 2,
            created_at: 42,
        }
    }

    #[test]
    fn test_insert_and_get() {
        let db = ProgressDb::open_in_memory().unwrap();
        let conn = db.conn();
        let id = StudentStore::insert(&conn, &record("Irfan")).unwrap().unwrap();
        let student = StudentStore::get(&conn, id).unwrap().unwrap();
        assert_eq!(student.name, "Irfan");
        assert_eq!(student.track, Some(Track::Business));
        assert_eq!(student.streak_freezes, 2);
        assert_eq!(student.utc_offset_minutes, 330);
        assert_eq!(student.level, "Explorer");
        assert!(StudentStore::get(&conn, id + 1).unwrap().is_none());
    }

    #[test]
    fn test_duplicate_name_is_rejected() {
        let db = ProgressDb::open_in_memory().unwrap();
        let conn = db.conn();
        assert!(StudentStore::insert(&conn, &record("Adham")).unwrap().is_some());
        assert!(StudentStore::insert(&conn, &record("Adham")).unwrap().is_none());
        let (student, digest) = StudentStore::find_by_name(&conn, "Adham").unwrap().unwrap();
        assert_eq!(student.name, "Adham");
        assert_eq!(digest, "digest");
    }

    #[test]
    fn test_list_excludes_admins() {
        let db = ProgressDb::open_in_memory().unwrap();
        let conn = db.conn();
        StudentStore::insert(&conn, &record("Aalam")).unwrap();
        let admin = StudentRecord {
            role: Role::Admin,
            track: None,
            ..record("Parent")
        };
        StudentStore::insert(&conn, &admin).unwrap();
        let names: Vec<_> = StudentStore::list(&conn).unwrap().into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["Aalam"]);
        assert_eq!(StudentStore::all_ids(&conn).unwrap().len(), 2);
    }
}

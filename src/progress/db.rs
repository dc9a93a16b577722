//! SQLite database connection and schema management for learner progress
//!
//! Manages `~/.learnforge/progress.db` with automatic schema migration.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::{Context, Result};
use rusqlite::{Connection, TransactionBehavior};

/// Shared database handle
///
/// Every engine operation runs inside one transaction on this connection, so
/// writes for a request are applied together or not at all.
#[derive(Clone)]
pub struct ProgressDb {
    conn: Arc<Mutex<Connection>>,
}

impl ProgressDb {
    /// Open or create the database at a specific path
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create data dir: {}", parent.display()))?;
        }

        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open progress db: {}", path.display()))?;

        // WAL keeps readers (leaderboard, CLI) from blocking the server
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        Self::from_connection(conn)
    }

    /// Private in-memory database (tests, dry runs)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory db")?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", "ON")?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.init_schema()?;
        Ok(db)
    }

    /// Lock the connection. A poisoned lock is recovered: every write runs in
    /// a transaction, so a panicking holder leaves nothing half-applied.
    pub fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Run `f` inside an IMMEDIATE transaction and commit if it succeeds.
    pub fn write<T, E>(&self, f: impl FnOnce(&Connection) -> std::result::Result<T, E>) -> std::result::Result<T, E>
    where
        E: From<rusqlite::Error>,
    {
        let mut conn = self.conn();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let value = f(&tx)?;
        tx.commit()?;
        Ok(value)
    }

    /// Run `f` against a consistent read snapshot.
    pub fn read<T, E>(&self, f: impl FnOnce(&Connection) -> std::result::Result<T, E>) -> std::result::Result<T, E>
    where
        E: From<rusqlite::Error>,
    {
        let mut conn = self.conn();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Deferred)?;
        let value = f(&tx)?;
        tx.finish()?;
        Ok(value)
    }

    /// Initialize the database schema
    fn init_schema(&self) -> Result<()> {
        let conn = self.conn();
        conn.execute_batch(SCHEMA_SQL)?;
        drop(conn);
        self.run_migrations()?;
        Ok(())
    }

    /// Run any pending migrations
    fn run_migrations(&self) -> Result<()> {
        let conn = self.conn();

        let version: i32 = conn
            .query_row("SELECT COALESCE(MAX(version), 0) FROM schema_version", [], |r| r.get(0))
            .unwrap_or(0);

        // Migration 2: per-student calendar offset and freeze allowance
        if version < 2 {
            let has_offset: bool = conn
                .prepare("SELECT COUNT(*) FROM pragma_table_info('students') WHERE name = 'utc_offset_minutes'")
                .and_then(|mut s| s.query_row([], |r| r.get::<_, i32>(0)))
                .map(|c| c > 0)
                .unwrap_or(false);

            if !has_offset {
                conn.execute_batch(
                    r#"
                    ALTER TABLE students ADD COLUMN utc_offset_minutes INTEGER NOT NULL DEFAULT 0;
                    ALTER TABLE students ADD COLUMN starting_freezes INTEGER NOT NULL DEFAULT 0;
                    "#,
                )?;
            }
            conn.execute("INSERT OR REPLACE INTO schema_version VALUES (2)", [])?;
        }

        // Migration 3: local hour on events (time-of-day badges)
        if version < 3 {
            let has_hour: bool = conn
                .prepare("SELECT COUNT(*) FROM pragma_table_info('events') WHERE name = 'local_hour'")
                .and_then(|mut s| s.query_row([], |r| r.get::<_, i32>(0)))
                .map(|c| c > 0)
                .unwrap_or(false);

            if !has_hour {
                conn.execute_batch(
                    "ALTER TABLE events ADD COLUMN local_hour INTEGER NOT NULL DEFAULT 12;",
                )?;
            }
            conn.execute("INSERT OR REPLACE INTO schema_version VALUES (3)", [])?;
        }

        Ok(())
    }
}

/// SQL schema for the progress database (version 1)
const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (version INTEGER PRIMARY KEY);
INSERT OR IGNORE INTO schema_version VALUES (1);

-- Students; total_xp/level/streak columns are caches of derived state
CREATE TABLE IF NOT EXISTS students (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE,
    pin_digest TEXT NOT NULL,
    role TEXT NOT NULL DEFAULT 'student',
    track TEXT,
    avatar TEXT NOT NULL DEFAULT '',
    total_xp INTEGER NOT NULL DEFAULT 0,
    level TEXT NOT NULL DEFAULT 'Explorer',
    current_streak INTEGER NOT NULL DEFAULT 0,
    longest_streak INTEGER NOT NULL DEFAULT 0,
    streak_freezes INTEGER NOT NULL DEFAULT 0,
    last_active_day TEXT,
    created_at INTEGER NOT NULL
);

-- Curriculum (read-only to the engine)
CREATE TABLE IF NOT EXISTS topics (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    track TEXT NOT NULL,
    order_num INTEGER NOT NULL,
    title TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    difficulty TEXT NOT NULL DEFAULT 'beginner',
    read_time INTEGER NOT NULL DEFAULT 10,
    UNIQUE (track, order_num)
);
CREATE INDEX IF NOT EXISTS idx_topics_track ON topics(track);

CREATE TABLE IF NOT EXISTS topic_progress (
    student_id INTEGER NOT NULL REFERENCES students(id),
    topic_id INTEGER NOT NULL REFERENCES topics(id),
    completed INTEGER NOT NULL DEFAULT 0,
    completed_at INTEGER,
    best_quiz_score REAL,
    quiz_attempts INTEGER NOT NULL DEFAULT 0,
    PRIMARY KEY (student_id, topic_id)
);

-- Append-only event log; one row per (student, source_key)
CREATE TABLE IF NOT EXISTS events (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    student_id INTEGER NOT NULL REFERENCES students(id),
    kind TEXT NOT NULL,
    source_key TEXT NOT NULL,
    payload TEXT NOT NULL DEFAULT '{}',
    occurred_at INTEGER NOT NULL,
    day_bucket TEXT NOT NULL,
    UNIQUE (student_id, source_key)
);
CREATE INDEX IF NOT EXISTS idx_events_student_day ON events(student_id, day_bucket);
CREATE INDEX IF NOT EXISTS idx_events_kind ON events(student_id, kind);

-- XP ledger; SUM(amount) per student is the source of truth for total XP
CREATE TABLE IF NOT EXISTS xp_ledger (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    student_id INTEGER NOT NULL REFERENCES students(id),
    amount INTEGER NOT NULL CHECK (amount >= 0),
    source_key TEXT NOT NULL,
    reason TEXT NOT NULL,
    created_at INTEGER NOT NULL,
    day_bucket TEXT NOT NULL,
    UNIQUE (student_id, source_key)
);
CREATE INDEX IF NOT EXISTS idx_xp_student_day ON xp_ledger(student_id, day_bucket);

CREATE TABLE IF NOT EXISTS quiz_attempts (
    id TEXT PRIMARY KEY,
    student_id INTEGER NOT NULL REFERENCES students(id),
    topic_id INTEGER NOT NULL REFERENCES topics(id),
    answers TEXT NOT NULL,
    correct INTEGER NOT NULL,
    total INTEGER NOT NULL,
    score REAL NOT NULL,
    xp_awarded INTEGER NOT NULL,
    perfect INTEGER NOT NULL,
    best_answer_streak INTEGER NOT NULL DEFAULT 0,
    taken_at INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_attempts_student ON quiz_attempts(student_id, taken_at);

-- One response per student per calendar day
CREATE TABLE IF NOT EXISTS challenge_responses (
    student_id INTEGER NOT NULL REFERENCES students(id),
    challenge_date TEXT NOT NULL,
    challenge_id TEXT NOT NULL,
    kind TEXT NOT NULL,
    boss INTEGER NOT NULL DEFAULT 0,
    response TEXT NOT NULL,
    completed INTEGER NOT NULL DEFAULT 1,
    xp_earned INTEGER NOT NULL DEFAULT 0,
    submitted_at INTEGER NOT NULL,
    PRIMARY KEY (student_id, challenge_date)
);

-- Earned badges; never deleted by the engine
CREATE TABLE IF NOT EXISTS badge_awards (
    student_id INTEGER NOT NULL REFERENCES students(id),
    badge_id TEXT NOT NULL,
    earned_at INTEGER NOT NULL,
    PRIMARY KEY (student_id, badge_id)
);
"#;

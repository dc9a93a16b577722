//! Learner progress storage
//!
//! Everything the engine derives lives in one SQLite database
//! (`~/.learnforge/progress.db` by default).
//!
//! # Architecture
//!
//! ```text
//!   event call ──▶ EventLog ──▶ XpLedger ──▶ StreakTracker ──▶ BadgeEvaluator
//!                     │             │              │                 │
//!                     └─────────────┴──── one transaction ───────────┘
//! ```
//!
//! Components take a borrowed `&Connection` so a caller can compose them
//! inside [`ProgressDb::write`]:
//!
//! ```ignore
//! let db = ProgressDb::open(&config.db_path())?;
//! let outcome = db.write(|conn| {
//!     EventLog::append(conn, &event)?;
//!     XpLedger::award(conn, student_id, &XpSource::TopicCompleted(topic_id), now, day)
//! })?;
//! ```

mod db;
pub mod event_log;
pub mod gamification;
pub mod ledger;
mod queries;
mod quizzes;
mod students;
pub mod time_bucket;
mod topics;

pub use db::ProgressDb;
pub use event_log::EventLog;
pub use ledger::{AwardOutcome, XpEntry, XpHistory, XpLedger, XpSource};
pub use queries::{AdminOverview, ProgressQuery, ScorePoint, StudentAnalytics, StudentOverview, XpPoint};
pub use quizzes::{QuizHistoryEntry, QuizStore};
pub use students::{StudentRecord, StudentStore};
pub use time_bucket::HistoryBucket;
pub use topics::TopicStore;

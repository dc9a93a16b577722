//! Progression engine
//!
//! [`Engine`] is the transport-agnostic facade the HTTP API and the CLI call
//! into. Every event-reporting operation runs as one unit of work inside
//! [`ProgressDb::write`]:
//!
//! ```text
//!   append event ─▶ award XP ─▶ advance streak (+ milestone XP) ─▶ badges
//! ```
//!
//! A duplicate event (same source key) stops at the first step, so retried
//! requests never credit twice.

mod activity;
pub mod auth;
mod quiz;
mod reads;

pub use activity::{ActivityOutcome, LoginOutcome};
pub use auth::{Session, SessionStore};
pub use reads::{ProgressReport, RepairReport, StudentBadges, TopicStatus, XpLog};

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::Connection;
use tracing::info;

use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::domain::{Student, StudentId, Topic, TopicId};
use crate::error::{EngineError, EngineResult};
use crate::progress::time_bucket::local_day;
use crate::progress::{ProgressDb, StudentStore, TopicStore};
use crate::quiz::{HttpQuestionGenerator, QuestionGenerator, QuizSessions, StaticQuestionGenerator};

/// Tunables taken from [`Config`]
#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub generator_timeout: Duration,
    pub questions_per_quiz: usize,
    pub default_utc_offset_minutes: i32,
    pub starting_freezes: u32,
    pub history_limit: usize,
}

impl EngineSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            generator_timeout: Duration::from_secs(config.generator.timeout_secs.max(1)),
            questions_per_quiz: config.generator.questions_per_quiz.max(1),
            default_utc_offset_minutes: config.calendar.default_utc_offset_minutes,
            starting_freezes: config.calendar.starting_freezes,
            history_limit: config.server.history_limit.max(1),
        }
    }
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

pub struct Engine {
    db: ProgressDb,
    clock: Arc<dyn Clock>,
    generator: Arc<dyn QuestionGenerator>,
    quizzes: QuizSessions,
    sessions: SessionStore,
    settings: EngineSettings,
}

impl Engine {
    pub fn new(
        db: ProgressDb,
        clock: Arc<dyn Clock>,
        generator: Arc<dyn QuestionGenerator>,
        settings: EngineSettings,
    ) -> Self {
        Self {
            db,
            clock,
            generator,
            quizzes: QuizSessions::new(),
            sessions: SessionStore::new(),
            settings,
        }
    }

    /// Open the configured database and pick the question generator: the
    /// HTTP client when an endpoint is set, the built-in set otherwise.
    pub fn from_config(config: &Config) -> Result<Self> {
        let db = ProgressDb::open(&config.db_path())?;
        let settings = EngineSettings::from_config(config);

        let generator: Arc<dyn QuestionGenerator> = match config.generator.endpoint.as_deref() {
            Some(endpoint) if !endpoint.trim().is_empty() => Arc::new(
                HttpQuestionGenerator::new(endpoint, settings.generator_timeout)
                    .with_api_key(config.generator.api_key.clone()),
            ),
            _ => Arc::new(StaticQuestionGenerator),
        };
        info!(
            "[learnforge:engine] db={} generator={}",
            config.db_path().display(),
            generator.id()
        );

        Ok(Self::new(db, Arc::new(SystemClock), generator, settings))
    }

    pub fn db(&self) -> &ProgressDb {
        &self.db
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    pub fn quiz_sessions(&self) -> &QuizSessions {
        &self.quizzes
    }

    fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Calendar day used for views that are not tied to one student
    fn calendar_today(&self) -> NaiveDate {
        local_day(
            self.now().timestamp_millis(),
            self.settings.default_utc_offset_minutes,
        )
    }

    /// Resolve a bearer token
    pub fn authorize(&self, token: &str) -> EngineResult<Session> {
        self.sessions.resolve(token)
    }

    /// Resolve a bearer token that must belong to an admin
    pub fn authorize_admin(&self, token: &str) -> EngineResult<Session> {
        let session = self.authorize(token)?;
        if session.role != crate::domain::Role::Admin {
            return Err(EngineError::InvalidCredential);
        }
        Ok(session)
    }
}

fn load_student(conn: &Connection, id: StudentId) -> EngineResult<Student> {
    StudentStore::get(conn, id)?.ok_or_else(|| EngineError::not_found(format!("Student {id}")))
}

fn load_topic(conn: &Connection, id: TopicId) -> EngineResult<Topic> {
    TopicStore::get(conn, id)?.ok_or_else(|| EngineError::not_found(format!("Topic {id}")))
}

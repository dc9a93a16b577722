//! Shared test utilities for engine integration tests

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Result, bail};
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use tempfile::TempDir;

use learnforge::clock::FixedClock;
use learnforge::domain::{Difficulty, NewStudent, NewTopic, Question, Role, Student, TopicId, Track};
use learnforge::engine::{Engine, EngineSettings};
use learnforge::progress::{ProgressDb, TopicStore};
use learnforge::quiz::{QuestionGenerator, QuestionRequest};

pub const PIN: &str = "1234";

/// Engine over a throwaway database with a manually driven clock
pub struct TestEngine {
    pub engine: Arc<Engine>,
    pub clock: Arc<FixedClock>,
    _dir: TempDir,
}

impl TestEngine {
    pub fn new() -> Self {
        Self::with_generator(Arc::new(ScriptedGenerator::new(5)))
    }

    pub fn with_generator(generator: Arc<dyn QuestionGenerator>) -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let db = ProgressDb::open(&dir.path().join("progress.db")).expect("Failed to open db");
        let clock = Arc::new(FixedClock::new(at(2026, 3, 2, 10)));
        let settings = EngineSettings {
            generator_timeout: Duration::from_millis(200),
            questions_per_quiz: 5,
            default_utc_offset_minutes: 0,
            starting_freezes: 0,
            history_limit: 50,
        };
        let engine = Engine::new(db, clock.clone(), generator, settings);
        Self {
            engine: Arc::new(engine),
            clock,
            _dir: dir,
        }
    }

    /// Move the clock forward by whole days
    pub fn next_day(&self, days: i64) {
        self.clock.advance(chrono::Duration::days(days));
    }

    pub fn enroll(&self, name: &str, track: Track) -> Student {
        self.engine
            .enroll(&NewStudent {
                name: name.to_string(),
                pin: PIN.to_string(),
                role: Role::Student,
                track: Some(track),
                avatar: String::new(),
                utc_offset_minutes: Some(0),
                starting_freezes: None,
            })
            .expect("Failed to enroll student")
    }

    pub fn enroll_admin(&self, name: &str) -> Student {
        self.engine
            .enroll(&NewStudent {
                name: name.to_string(),
                pin: PIN.to_string(),
                role: Role::Admin,
                track: None,
                avatar: String::new(),
                utc_offset_minutes: Some(0),
                starting_freezes: None,
            })
            .expect("Failed to enroll admin")
    }

    /// Insert `count` topics for a track, returning their ids in order
    pub fn seed_topics(&self, track: Track, count: u32) -> Vec<TopicId> {
        self.engine
            .db()
            .write(|conn| {
                (1..=count)
                    .map(|n| {
                        TopicStore::upsert(
                            conn,
                            &NewTopic {
                                track,
                                order_num: n,
                                title: format!("{} topic {n}", track.label()),
                                description: String::new(),
                                difficulty: Difficulty::Beginner,
                                read_time: 5,
                            },
                        )
                    })
                    .collect::<Result<Vec<_>>>()
            })
            .expect("Failed to seed topics")
    }
}

pub fn at(year: i32, month: u32, day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, hour, 0, 0)
        .single()
        .expect("valid timestamp")
}

/// Always returns the same questions; the right answer is "A"
pub struct ScriptedGenerator {
    count: usize,
}

impl ScriptedGenerator {
    pub fn new(count: usize) -> Self {
        Self { count }
    }
}

#[async_trait]
impl QuestionGenerator for ScriptedGenerator {
    async fn generate(&self, request: &QuestionRequest) -> Result<Vec<Question>> {
        Ok((0..self.count)
            .map(|i| Question {
                prompt: format!("Question {i} about {}", request.topic_title),
                options: vec!["A".to_string(), "B".to_string(), "C".to_string()],
                correct: "A".to_string(),
                explanation: None,
                difficulty: None,
            })
            .collect())
    }

    fn id(&self) -> &str {
        "scripted"
    }
}

pub struct FailingGenerator;

#[async_trait]
impl QuestionGenerator for FailingGenerator {
    async fn generate(&self, _request: &QuestionRequest) -> Result<Vec<Question>> {
        bail!("model endpoint returned 502")
    }

    fn id(&self) -> &str {
        "failing"
    }
}

/// Answers after the given delay
pub struct SlowGenerator(pub Duration);

#[async_trait]
impl QuestionGenerator for SlowGenerator {
    async fn generate(&self, request: &QuestionRequest) -> Result<Vec<Question>> {
        tokio::time::sleep(self.0).await;
        ScriptedGenerator::new(5).generate(request).await
    }

    fn id(&self) -> &str {
        "slow"
    }
}

pub fn answers(choices: &[&str]) -> Vec<String> {
    choices.iter().map(|c| c.to_string()).collect()
}

//! Learnforge - learning progression engine
//!
//! Learnforge tracks what learners do in a self-paced AI curriculum and turns
//! it into progression: XP and levels, daily streaks with freezes, badges, a
//! daily challenge, quizzes and a leaderboard.
//!
//! ## Layout
//!
//! - [`progress`]: SQLite storage. The append-only event log and XP ledger are
//!   the source of truth; streaks, totals and badges are derived from them.
//! - [`quiz`]: question generation and the per-student quiz state machine.
//! - [`engine`]: the operations callers use, each one a single transaction.
//! - [`api`]: a JSON HTTP front end over the engine.

pub mod api;
pub mod catalog;
pub mod clock;
pub mod config;
pub mod domain;
pub mod engine;
pub mod error;
pub mod progress;
pub mod quiz;

pub use domain::*;
pub use engine::Engine;
pub use error::{EngineError, EngineResult, ErrorKind};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::student::StudentId;

/// Kind of scoring-relevant event stored in the event log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Login,
    TopicCompleted,
    QuizSubmitted,
    ChallengeSubmitted,
    ChatTurn,
    FlashcardSession,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Login => "login",
            Self::TopicCompleted => "topic_completed",
            Self::QuizSubmitted => "quiz_submitted",
            Self::ChallengeSubmitted => "challenge_submitted",
            Self::ChatTurn => "chat_turn",
            Self::FlashcardSession => "flashcard_session",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "login" => Some(Self::Login),
            "topic_completed" => Some(Self::TopicCompleted),
            "quiz_submitted" => Some(Self::QuizSubmitted),
            "challenge_submitted" => Some(Self::ChallengeSubmitted),
            "chat_turn" => Some(Self::ChatTurn),
            "flashcard_session" => Some(Self::FlashcardSession),
            _ => None,
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An event about to be appended to the log.
///
/// `source_key` identifies the real-world occurrence (e.g. `topic:12`). The
/// log holds at most one event per (student, source key), which is what makes
/// retried requests collapse into one effect.
#[derive(Debug, Clone)]
pub struct NewEvent {
    pub student_id: StudentId,
    pub kind: EventKind,
    pub source_key: String,
    pub payload: serde_json::Value,
    pub occurred_at: i64,
    /// Student-local calendar day of `occurred_at`
    pub day: NaiveDate,
    /// Student-local hour of `occurred_at` (0-23)
    pub hour: u32,
}

/// A stored event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LearningEvent {
    pub id: i64,
    pub student_id: StudentId,
    pub kind: EventKind,
    pub source_key: String,
    pub payload: serde_json::Value,
    pub occurred_at: i64,
    pub day: NaiveDate,
    pub hour: u32,
}

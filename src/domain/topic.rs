use serde::{Deserialize, Serialize};

use super::student::{StudentId, Track};

pub type TopicId = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Beginner => "beginner",
            Self::Intermediate => "intermediate",
            Self::Advanced => "advanced",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "beginner" => Some(Self::Beginner),
            "intermediate" => Some(Self::Intermediate),
            "advanced" => Some(Self::Advanced),
            _ => None,
        }
    }
}

/// One curriculum unit within a track. Read-only to the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Topic {
    pub id: TopicId,
    pub track: Track,
    /// Position inside the track (1-based)
    pub order_num: u32,
    pub title: String,
    pub description: String,
    pub difficulty: Difficulty,
    /// Expected read time in minutes
    pub read_time: u32,
}

/// Topic definition as loaded from a curriculum catalog
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTopic {
    pub track: Track,
    pub order_num: u32,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(default = "default_read_time")]
    pub read_time: u32,
}

fn default_read_time() -> u32 {
    10
}

/// Per (student, topic) progress row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicProgress {
    pub student_id: StudentId,
    pub topic_id: TopicId,
    pub completed: bool,
    pub completed_at: Option<i64>,
    pub best_quiz_score: Option<f64>,
    pub quiz_attempts: u32,
}

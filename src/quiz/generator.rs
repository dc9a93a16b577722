//! Question generator seam

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;

use crate::domain::{Difficulty, Question, TopicId, Track};

/// What the generator is asked for
#[derive(Debug, Clone, Serialize)]
pub struct QuestionRequest {
    pub topic_id: TopicId,
    pub topic_title: String,
    pub topic_description: String,
    pub track: Track,
    pub difficulty: Difficulty,
    pub count: usize,
}

/// Produces an ordered question set for a topic.
///
/// The engine bounds every call with a timeout and never retries; a failed
/// or empty result aborts the quiz.
#[async_trait]
pub trait QuestionGenerator: Send + Sync {
    async fn generate(&self, request: &QuestionRequest) -> Result<Vec<Question>>;

    /// Generator ID for logs
    fn id(&self) -> &str;
}

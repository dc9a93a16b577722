//! Request bodies and shared state for the HTTP API.

use std::sync::Arc;

use serde::Deserialize;
use tokio::runtime::Handle;

use crate::domain::{AttemptId, StudentId, TopicId};
use crate::engine::Engine;

/// Shared state handed to every handler
#[derive(Clone)]
pub struct ApiState {
    pub engine: Arc<Engine>,
    /// Runtime used to drive async engine calls from the server thread
    pub runtime: Handle,
    pub max_body_bytes: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub name: String,
    pub pin: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TopicRequest {
    pub topic_id: TopicId,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnswerRequest {
    pub topic_id: TopicId,
    #[serde(default)]
    pub attempt_id: Option<AttemptId>,
    pub answer: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChallengeSubmitRequest {
    pub challenge_id: String,
    pub response: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatTurnRequest {
    #[serde(default)]
    pub turn_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FlashcardSessionRequest {
    pub deck: String,
    pub cards_reviewed: u32,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RepairRequest {
    #[serde(default)]
    pub student_id: Option<StudentId>,
}

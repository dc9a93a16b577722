//! HTTP client for an external question generation service.
//!
//! POSTs a [`QuestionRequest`] as JSON and accepts either a bare array of
//! questions or `{"questions": [...]}`.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;

use super::generator::{QuestionGenerator, QuestionRequest};
use crate::domain::Question;

#[derive(Deserialize)]
#[serde(untagged)]
enum GeneratorResponse {
    Bare(Vec<Question>),
    Wrapped { questions: Vec<Question> },
}

impl GeneratorResponse {
    fn into_questions(self) -> Vec<Question> {
        match self {
            Self::Bare(questions) | Self::Wrapped { questions } => questions,
        }
    }
}

#[derive(Clone)]
pub struct HttpQuestionGenerator {
    endpoint: String,
    api_key: Option<String>,
    client: ureq::Agent,
}

impl HttpQuestionGenerator {
    pub fn new(endpoint: impl Into<String>, read_timeout: Duration) -> Self {
        let client = ureq::AgentBuilder::new()
            .timeout_connect(Duration::from_secs(5))
            .timeout_read(read_timeout)
            .build();

        Self {
            endpoint: endpoint.into(),
            api_key: None,
            client,
        }
    }

    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key.filter(|k| !k.is_empty());
        self
    }

    fn fetch(&self, request: &QuestionRequest) -> Result<Vec<Question>> {
        let mut call = self.client.post(&self.endpoint);
        if let Some(key) = &self.api_key {
            call = call.set("Authorization", &format!("Bearer {key}"));
        }
        let response: GeneratorResponse = call
            .send_json(request)
            .context("Failed to reach question generator")?
            .into_json()
            .context("Failed to parse generator response")?;
        Ok(response.into_questions())
    }
}

#[async_trait]
impl QuestionGenerator for HttpQuestionGenerator {
    async fn generate(&self, request: &QuestionRequest) -> Result<Vec<Question>> {
        let this = self.clone();
        let request = request.clone();
        tokio::task::spawn_blocking(move || this.fetch(&request))
            .await
            .context("Generator task panicked")?
    }

    fn id(&self) -> &str {
        "http"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_both_response_shapes() {
        let bare: GeneratorResponse = serde_json::from_str(
            r#"[{"question":"Q1","options":["A","B"],"correct":"A"}]"#,
        )
        .unwrap();
        assert_eq!(bare.into_questions().len(), 1);

        let wrapped: GeneratorResponse = serde_json::from_str(
            r#"{"questions":[{"prompt":"Q1","options":["A","B"],"correct":"B","explanation":"because"}]}"#,
        )
        .unwrap();
        let questions = wrapped.into_questions();
        assert_eq!(questions[0].correct, "B");
        assert_eq!(questions[0].explanation.as_deref(), Some("because"));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_fails() {
        // Port 9 (discard) is not listening on test hosts
        let generator = HttpQuestionGenerator::new("http://127.0.0.1:9/generate", Duration::from_secs(1));
        let request = QuestionRequest {
            topic_id: 1,
            topic_title: "NPCs".to_string(),
            topic_description: String::new(),
            track: crate::domain::Track::Gaming,
            difficulty: crate::domain::Difficulty::Beginner,
            count: 3,
        };
        assert!(generator.generate(&request).await.is_err());
    }
}

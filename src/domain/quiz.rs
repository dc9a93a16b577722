use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::student::StudentId;
use super::topic::TopicId;
use crate::progress::gamification::EarnedBadge;

pub type AttemptId = Uuid;

/// A generated question. The engine treats the content as opaque and only
/// compares chosen options against `correct`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    #[serde(alias = "question")]
    pub prompt: String,
    pub options: Vec<String>,
    pub correct: String,
    #[serde(default)]
    pub explanation: Option<String>,
    #[serde(default)]
    pub difficulty: Option<String>,
}

impl Question {
    /// A question is usable when it has at least two options and the
    /// designated answer is one of them.
    pub fn is_well_formed(&self) -> bool {
        !self.prompt.trim().is_empty()
            && self.options.len() >= 2
            && self.options.iter().any(|o| o == &self.correct)
    }

    pub fn has_option(&self, option: &str) -> bool {
        self.options.iter().any(|o| o == option)
    }
}

/// Question as delivered to the learner (answer withheld)
#[derive(Debug, Clone, Serialize)]
pub struct QuestionView {
    pub index: usize,
    pub prompt: String,
    pub options: Vec<String>,
    pub difficulty: Option<String>,
}

impl QuestionView {
    pub fn from_question(index: usize, q: &Question) -> Self {
        Self {
            index,
            prompt: q.prompt.clone(),
            options: q.options.clone(),
            difficulty: q.difficulty.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerRecord {
    pub question: String,
    pub chosen: String,
    pub correct: String,
    pub is_correct: bool,
}

/// A finished quiz instance. Immutable once stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizAttempt {
    pub id: AttemptId,
    pub student_id: StudentId,
    pub topic_id: TopicId,
    pub answers: Vec<AnswerRecord>,
    pub correct: u32,
    pub total: u32,
    pub score: f64,
    pub xp_awarded: u64,
    pub perfect: bool,
    pub best_answer_streak: u32,
    pub taken_at: i64,
}

impl QuizAttempt {
    /// Score as a percentage of correct answers
    pub fn score_for(correct: u32, total: u32) -> f64 {
        if total == 0 {
            0.0
        } else {
            100.0 * correct as f64 / total as f64
        }
    }
}

/// Feedback for a single answer while a quiz is in progress
#[derive(Debug, Clone, Serialize)]
pub struct AnswerFeedback {
    pub index: usize,
    pub is_correct: bool,
    pub correct: String,
    pub explanation: Option<String>,
    /// Consecutive correct answers so far (telemetry only)
    pub answer_streak: u32,
    pub remaining: usize,
}

/// Returned by `start_quiz`
#[derive(Debug, Clone, Serialize)]
pub struct StartedQuiz {
    pub attempt_id: AttemptId,
    pub topic_id: TopicId,
    pub topic_title: String,
    pub questions: Vec<QuestionView>,
}

/// Submission payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizSubmission {
    pub topic_id: TopicId,
    /// Guards against submitting into a newer attempt for the same topic
    #[serde(default)]
    pub attempt_id: Option<AttemptId>,
    /// Chosen options for the questions not yet answered, in order
    #[serde(default)]
    pub answers: Vec<String>,
}

/// Result of a scored attempt
#[derive(Debug, Clone, Serialize)]
pub struct QuizOutcome {
    pub attempt_id: AttemptId,
    pub correct: u32,
    pub total: u32,
    pub score: f64,
    pub xp_earned: u64,
    pub perfect: bool,
    pub total_xp: u64,
    pub new_badges: Vec<EarnedBadge>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(options: &[&str], correct: &str) -> Question {
        Question {
            prompt: "What is an NPC?".to_string(),
            options: options.iter().map(|s| s.to_string()).collect(),
            correct: correct.to_string(),
            explanation: None,
            difficulty: None,
        }
    }

    #[test]
    fn test_well_formed_requires_correct_among_options() {
        assert!(question(&["A", "B"], "A").is_well_formed());
        assert!(!question(&["A", "B"], "C").is_well_formed());
        assert!(!question(&["A"], "A").is_well_formed());
    }

    #[test]
    fn test_score_for() {
        assert_eq!(QuizAttempt::score_for(5, 5), 100.0);
        assert_eq!(QuizAttempt::score_for(0, 4), 0.0);
        assert!((QuizAttempt::score_for(1, 3) - 33.333).abs() < 0.01);
        assert_eq!(QuizAttempt::score_for(0, 0), 0.0);
    }

    #[test]
    fn test_question_accepts_generator_field_name() {
        let q: Question = serde_json::from_str(
            r#"{"question":"Q?","options":["True","False"],"correct":"True"}"#,
        )
        .unwrap();
        assert_eq!(q.prompt, "Q?");
        assert!(q.explanation.is_none());
    }
}

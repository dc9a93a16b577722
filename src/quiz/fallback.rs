//! Built-in question set used when no generator endpoint is configured.
//!
//! Questions are generic study-skill prompts about the topic; the set is
//! deterministic so repeated attempts see the same quiz.

use anyhow::Result;
use async_trait::async_trait;

use super::generator::{QuestionGenerator, QuestionRequest};
use crate::domain::Question;

struct Template {
    prompt: &'static str,
    options: &'static [&'static str],
    correct: &'static str,
    explanation: &'static str,
}

static TEMPLATES: &[Template] = &[
    Template {
        prompt: "True or False: an AI model learns patterns from examples rather than following only hand-written rules. ({topic})",
        options: &["True", "False"],
        correct: "True",
        explanation: "Machine learning systems infer patterns from training data.",
    },
    Template {
        prompt: "While studying \"{topic}\", which of these is the best first step?",
        options: &[
            "Understand the core idea in plain words",
            "Memorize every definition",
            "Skip to the hardest example",
            "Only read the summary",
        ],
        correct: "Understand the core idea in plain words",
        explanation: "A plain-language grasp of the core idea makes the details stick.",
    },
    Template {
        prompt: "What does a model need most to learn something new about \"{topic}\"?",
        options: &["Relevant data", "A faster screen", "More colors", "A longer name"],
        correct: "Relevant data",
        explanation: "Models learn from data; irrelevant inputs do not help.",
    },
    Template {
        prompt: "True or False: a model that scores perfectly on its training data always works well on new data.",
        options: &["True", "False"],
        correct: "False",
        explanation: "That is overfitting: memorizing the training set without generalizing.",
    },
    Template {
        prompt: "Which habit helps most when applying \"{topic}\" to a real problem?",
        options: &[
            "Start small and test your idea",
            "Build everything at once",
            "Avoid feedback",
            "Guess the result",
        ],
        correct: "Start small and test your idea",
        explanation: "Small experiments give fast feedback.",
    },
    Template {
        prompt: "What is a good way to check you really understood \"{topic}\"?",
        options: &[
            "Explain it to someone else",
            "Re-read the title",
            "Count the paragraphs",
            "Close the page quickly",
        ],
        correct: "Explain it to someone else",
        explanation: "Teaching an idea exposes the gaps in your understanding.",
    },
    Template {
        prompt: "True or False: AI output should be checked before it is trusted.",
        options: &["True", "False"],
        correct: "True",
        explanation: "Models can be confidently wrong; verification matters.",
    },
    Template {
        prompt: "Which of these is a risk to watch for when using AI for \"{topic}\"?",
        options: &["Biased training data", "Too much practice", "Clear goals", "Good documentation"],
        correct: "Biased training data",
        explanation: "Bias in data carries through to the model's decisions.",
    },
];

#[derive(Debug, Clone, Copy, Default)]
pub struct StaticQuestionGenerator;

impl StaticQuestionGenerator {
    pub fn questions_for(topic_title: &str, count: usize) -> Vec<Question> {
        TEMPLATES
            .iter()
            .take(count.min(TEMPLATES.len()))
            .map(|t| Question {
                prompt: t.prompt.replace("{topic}", topic_title),
                options: t.options.iter().map(|o| o.to_string()).collect(),
                correct: t.correct.to_string(),
                explanation: Some(t.explanation.to_string()),
                difficulty: Some("easy".to_string()),
            })
            .collect()
    }
}

#[async_trait]
impl QuestionGenerator for StaticQuestionGenerator {
    async fn generate(&self, request: &QuestionRequest) -> Result<Vec<Question>> {
        Ok(Self::questions_for(&request.topic_title, request.count))
    }

    fn id(&self) -> &str {
        "static"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_questions_are_well_formed() {
        let questions = StaticQuestionGenerator::questions_for("Pathfinding", 5);
        assert_eq!(questions.len(), 5);
        assert!(questions.iter().all(|q| q.is_well_formed()));
        assert!(questions[1].prompt.contains("Pathfinding"));
    }

    #[test]
    fn test_count_is_capped() {
        assert_eq!(StaticQuestionGenerator::questions_for("X", 50).len(), TEMPLATES.len());
        assert!(StaticQuestionGenerator::questions_for("X", 0).is_empty());
    }
}

//! Quiz attempt state machine
//!
//! ```text
//! Select ─▶ Generating ─▶ InProgress ─▶ Submitting ─▶ Scored
//!               │                           │
//!               └────────▶ Aborted ◀────────┘
//! ```
//!
//! Sessions live in memory only, one per (student, topic). Answers are not
//! durable until the attempt is scored.

use std::collections::HashMap;
use std::sync::Mutex;

use serde::Serialize;
use uuid::Uuid;

use crate::domain::{
    AnswerFeedback, AnswerRecord, AttemptId, Question, QuestionView, QuizAttempt, StudentId, TopicId,
};
use crate::error::{EngineError, EngineResult};
use crate::progress::ledger::quiz_xp;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QuizState {
    Select,
    Generating,
    InProgress,
    Submitting,
    Scored,
    Aborted,
}

impl QuizState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Select => "select",
            Self::Generating => "generating",
            Self::InProgress => "in_progress",
            Self::Submitting => "submitting",
            Self::Scored => "scored",
            Self::Aborted => "aborted",
        }
    }

    /// Whether a new attempt may be started from this state
    pub fn can_restart(&self) -> bool {
        !matches!(self, Self::Submitting)
    }
}

/// One in-memory quiz attempt
#[derive(Debug, Clone)]
pub struct QuizSession {
    pub attempt_id: AttemptId,
    pub student_id: StudentId,
    pub topic_id: TopicId,
    pub topic_title: String,
    pub state: QuizState,
    questions: Vec<Question>,
    answers: Vec<AnswerRecord>,
    answer_streak: u32,
    best_answer_streak: u32,
}

impl QuizSession {
    /// New session waiting on the generator
    pub fn generating(student_id: StudentId, topic_id: TopicId, topic_title: impl Into<String>) -> Self {
        Self {
            attempt_id: Uuid::new_v4(),
            student_id,
            topic_id,
            topic_title: topic_title.into(),
            state: QuizState::Generating,
            questions: Vec::new(),
            answers: Vec::new(),
            answer_streak: 0,
            best_answer_streak: 0,
        }
    }

    /// Accept the generated questions. Malformed questions are dropped; if
    /// none remain the session is aborted.
    pub fn begin(&mut self, questions: Vec<Question>) -> EngineResult<Vec<QuestionView>> {
        if self.state != QuizState::Generating {
            return Err(EngineError::conflict(format!(
                "quiz is {}, not generating",
                self.state.as_str()
            )));
        }
        let usable: Vec<Question> = questions.into_iter().filter(|q| q.is_well_formed()).collect();
        if usable.is_empty() {
            self.state = QuizState::Aborted;
            return Err(EngineError::UpstreamUnavailable(
                "generator returned no usable questions".to_string(),
            ));
        }
        self.questions = usable;
        self.state = QuizState::InProgress;
        Ok(self.views())
    }

    pub fn abort(&mut self) {
        self.state = QuizState::Aborted;
    }

    pub fn views(&self) -> Vec<QuestionView> {
        self.questions
            .iter()
            .enumerate()
            .map(|(i, q)| QuestionView::from_question(i, q))
            .collect()
    }

    pub fn total(&self) -> usize {
        self.questions.len()
    }

    pub fn remaining(&self) -> usize {
        self.questions.len() - self.answers.len()
    }

    fn ensure_in_progress(&self) -> EngineResult<()> {
        match self.state {
            QuizState::InProgress => Ok(()),
            QuizState::Scored => Err(EngineError::conflict("quiz already submitted")),
            QuizState::Aborted => Err(EngineError::conflict("quiz was aborted, start a new one")),
            other => Err(EngineError::conflict(format!("quiz is {}", other.as_str()))),
        }
    }

    fn record(&mut self, chosen: &str) -> AnswerFeedback {
        let index = self.answers.len();
        let question = &self.questions[index];
        let is_correct = chosen == question.correct;
        if is_correct {
            self.answer_streak += 1;
            self.best_answer_streak = self.best_answer_streak.max(self.answer_streak);
        } else {
            self.answer_streak = 0;
        }
        let feedback = AnswerFeedback {
            index,
            is_correct,
            correct: question.correct.clone(),
            explanation: question.explanation.clone(),
            answer_streak: self.answer_streak,
            remaining: self.questions.len() - index - 1,
        };
        self.answers.push(AnswerRecord {
            question: question.prompt.clone(),
            chosen: chosen.to_string(),
            correct: question.correct.clone(),
            is_correct,
        });
        feedback
    }

    /// Answer the next question in order
    pub fn answer(&mut self, chosen: &str) -> EngineResult<AnswerFeedback> {
        self.ensure_in_progress()?;
        let Some(question) = self.questions.get(self.answers.len()) else {
            return Err(EngineError::validation("all questions already answered"));
        };
        if !question.has_option(chosen) {
            return Err(EngineError::validation(format!(
                "\"{chosen}\" is not an option for question {}",
                self.answers.len()
            )));
        }
        Ok(self.record(chosen))
    }

    /// Apply the remaining answers and move to `Submitting`. Nothing is
    /// applied if any answer is invalid.
    pub fn submit(&mut self, answers: &[String], taken_at: i64) -> EngineResult<QuizAttempt> {
        self.ensure_in_progress()?;
        let remaining = self.remaining();
        if answers.len() != remaining {
            return Err(EngineError::validation(format!(
                "expected {remaining} answers, got {}",
                answers.len()
            )));
        }
        let offset = self.answers.len();
        for (i, chosen) in answers.iter().enumerate() {
            if !self.questions[offset + i].has_option(chosen) {
                return Err(EngineError::validation(format!(
                    "\"{chosen}\" is not an option for question {}",
                    offset + i
                )));
            }
        }
        for chosen in answers {
            self.record(chosen);
        }
        self.state = QuizState::Submitting;
        Ok(self.attempt(taken_at))
    }

    /// Scored result of the answers so far
    fn attempt(&self, taken_at: i64) -> QuizAttempt {
        let total = self.questions.len() as u32;
        let correct = self.answers.iter().filter(|a| a.is_correct).count() as u32;
        let perfect = total > 0 && correct == total;
        QuizAttempt {
            id: self.attempt_id,
            student_id: self.student_id,
            topic_id: self.topic_id,
            answers: self.answers.clone(),
            correct,
            total,
            score: QuizAttempt::score_for(correct, total),
            xp_awarded: quiz_xp(correct, perfect),
            perfect,
            best_answer_streak: self.best_answer_streak,
            taken_at,
        }
    }

    pub fn mark_scored(&mut self) {
        self.state = QuizState::Scored;
    }
}

/// Registry of live sessions keyed by (student, topic)
#[derive(Default)]
pub struct QuizSessions {
    inner: Mutex<HashMap<(StudentId, TopicId), QuizSession>>,
}

impl QuizSessions {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<(StudentId, TopicId), QuizSession>> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Replace any previous session for the pair with a fresh one in
    /// `Generating`. Fails while the previous attempt is being persisted.
    pub fn start(&self, student_id: StudentId, topic_id: TopicId, topic_title: &str) -> EngineResult<AttemptId> {
        let mut sessions = self.lock();
        if let Some(existing) = sessions.get(&(student_id, topic_id)) {
            if !existing.state.can_restart() {
                return Err(EngineError::conflict("previous attempt is still being submitted"));
            }
        }
        let session = QuizSession::generating(student_id, topic_id, topic_title);
        let attempt_id = session.attempt_id;
        sessions.insert((student_id, topic_id), session);
        Ok(attempt_id)
    }

    /// Run `f` against the session, provided it is still the given attempt
    /// (or any attempt when `attempt_id` is None).
    pub fn with_session<T>(
        &self,
        student_id: StudentId,
        topic_id: TopicId,
        attempt_id: Option<AttemptId>,
        f: impl FnOnce(&mut QuizSession) -> EngineResult<T>,
    ) -> EngineResult<T> {
        let mut sessions = self.lock();
        let session = sessions
            .get_mut(&(student_id, topic_id))
            .filter(|s| attempt_id.is_none_or(|id| s.attempt_id == id))
            .ok_or_else(|| EngineError::not_found(format!("Quiz session for topic {topic_id}")))?;
        f(session)
    }

    pub fn state(&self, student_id: StudentId, topic_id: TopicId) -> QuizState {
        self.lock()
            .get(&(student_id, topic_id))
            .map(|s| s.state)
            .unwrap_or(QuizState::Select)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

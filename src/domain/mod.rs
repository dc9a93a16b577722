//! Core domain types for Learnforge

mod challenge;
mod event;
mod quiz;
mod student;
mod topic;

pub use challenge::{Challenge, ChallengeKind, ChallengeResponse, DailyChallenge};
pub use event::{EventKind, LearningEvent, NewEvent};
pub use quiz::{
    AnswerFeedback, AnswerRecord, AttemptId, Question, QuestionView, QuizAttempt, QuizOutcome,
    QuizSubmission, StartedQuiz,
};
pub use student::{NewStudent, Role, Student, StudentId, Track};
pub use topic::{Difficulty, NewTopic, Topic, TopicId, TopicProgress};

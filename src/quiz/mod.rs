//! Quiz flow: question generation and the per-attempt state machine

mod client;
mod fallback;
mod generator;
mod session;

pub use client::HttpQuestionGenerator;
pub use fallback::StaticQuestionGenerator;
pub use generator::{QuestionGenerator, QuestionRequest};
pub use session::{QuizSession, QuizSessions, QuizState};

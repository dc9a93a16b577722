//! Quiz flow: start (generate), answer, submit

use tracing::{info, warn};

use super::activity::{Activity, ensure_on_track, record_activity};
use super::{Engine, load_student, load_topic};
use crate::domain::{
    AnswerFeedback, AttemptId, EventKind, QuizOutcome, QuizSubmission, StartedQuiz, StudentId, TopicId,
};
use crate::error::{EngineError, EngineResult};
use crate::progress::ledger::XpSource;
use crate::progress::{QuizHistoryEntry, QuizStore, TopicStore};
use crate::quiz::QuestionRequest;

impl Engine {
    /// Start a new attempt for a topic and fetch its questions.
    ///
    /// Any previous session for the same topic is abandoned. Generator
    /// failure or timeout aborts the attempt with `UpstreamUnavailable`; the
    /// caller may start again right away.
    pub async fn start_quiz(&self, student_id: StudentId, topic_id: TopicId) -> EngineResult<StartedQuiz> {
        let (student, topic) = self
            .db
            .read(|conn| Ok::<_, EngineError>((load_student(conn, student_id)?, load_topic(conn, topic_id)?)))?;
        if student.is_admin() {
            return Err(EngineError::validation("admins do not take quizzes"));
        }
        ensure_on_track(&student, &topic)?;

        let attempt_id = self.quizzes.start(student_id, topic_id, &topic.title)?;
        let request = QuestionRequest {
            topic_id,
            topic_title: topic.title.clone(),
            topic_description: topic.description.clone(),
            track: topic.track,
            difficulty: topic.difficulty,
            count: self.settings.questions_per_quiz,
        };

        let generated = tokio::time::timeout(
            self.settings.generator_timeout,
            self.generator.generate(&request),
        )
        .await;
        let questions = match generated {
            Ok(Ok(questions)) => questions,
            Ok(Err(e)) => {
                warn!(
                    "[learnforge:quiz] generator {} failed for topic {}: {:#}",
                    self.generator.id(),
                    topic_id,
                    e
                );
                self.abort_attempt(student_id, topic_id, attempt_id);
                return Err(EngineError::UpstreamUnavailable(format!("{e:#}")));
            }
            Err(_) => {
                warn!(
                    "[learnforge:quiz] generator {} timed out after {:?} for topic {}",
                    self.generator.id(),
                    self.settings.generator_timeout,
                    topic_id
                );
                self.abort_attempt(student_id, topic_id, attempt_id);
                return Err(EngineError::UpstreamUnavailable(format!(
                    "no questions within {}s",
                    self.settings.generator_timeout.as_secs()
                )));
            }
        };

        let views = self
            .quizzes
            .with_session(student_id, topic_id, Some(attempt_id), |s| s.begin(questions))?;
        info!(
            "[learnforge:quiz] student {} started attempt {} on topic {} ({} questions)",
            student_id,
            attempt_id,
            topic_id,
            views.len()
        );
        Ok(StartedQuiz {
            attempt_id,
            topic_id,
            topic_title: topic.title,
            questions: views,
        })
    }

    fn abort_attempt(&self, student_id: StudentId, topic_id: TopicId, attempt_id: AttemptId) {
        // A newer attempt may already have replaced this one
        let _ = self.quizzes.with_session(student_id, topic_id, Some(attempt_id), |s| {
            s.abort();
            Ok(())
        });
    }

    /// Answer the next question of the running attempt
    pub fn answer_question(
        &self,
        student_id: StudentId,
        topic_id: TopicId,
        attempt_id: Option<AttemptId>,
        chosen: &str,
    ) -> EngineResult<AnswerFeedback> {
        self.quizzes
            .with_session(student_id, topic_id, attempt_id, |s| s.answer(chosen))
    }

    /// Score the attempt and persist it. The attempt, the topic's best score,
    /// the event and the XP award commit together.
    pub fn submit_quiz(&self, student_id: StudentId, submission: &QuizSubmission) -> EngineResult<QuizOutcome> {
        let topic_id = submission.topic_id;
        let now = self.now();
        let attempt = self.quizzes.with_session(student_id, topic_id, submission.attempt_id, |s| {
            s.submit(&submission.answers, now.timestamp_millis())
        })?;

        let persisted = self.db.write(|conn| {
            let student = load_student(conn, student_id)?;
            QuizStore::insert(conn, &attempt)?;
            TopicStore::record_quiz_score(conn, student_id, topic_id, attempt.score)?;
            record_activity(
                conn,
                &student,
                Activity {
                    kind: EventKind::QuizSubmitted,
                    source_key: format!("quiz:{}", attempt.id),
                    payload: serde_json::json!({
                        "topic_id": topic_id,
                        "correct": attempt.correct,
                        "total": attempt.total,
                        "score": attempt.score,
                    }),
                    award: Some(XpSource::Quiz {
                        attempt: attempt.id,
                        correct: attempt.correct,
                        perfect: attempt.perfect,
                    }),
                },
                now,
            )
        });

        let activity = match persisted {
            Ok(activity) => activity,
            Err(e) => {
                warn!(
                    "[learnforge:quiz] failed to store attempt {}: {}",
                    attempt.id, e
                );
                self.abort_attempt(student_id, topic_id, attempt.id);
                return Err(e);
            }
        };
        let _ = self
            .quizzes
            .with_session(student_id, topic_id, Some(attempt.id), |s| {
                s.mark_scored();
                Ok(())
            });

        info!(
            "[learnforge:quiz] student {} scored {}/{} on topic {}",
            student_id, attempt.correct, attempt.total, topic_id
        );
        Ok(QuizOutcome {
            attempt_id: attempt.id,
            correct: attempt.correct,
            total: attempt.total,
            score: attempt.score,
            xp_earned: attempt.xp_awarded,
            perfect: attempt.perfect,
            total_xp: activity.total_xp,
            new_badges: activity.new_badges,
        })
    }

    /// Newest attempts first
    pub fn quiz_history(&self, student_id: StudentId) -> EngineResult<Vec<QuizHistoryEntry>> {
        self.db.read(|conn| {
            load_student(conn, student_id)?;
            Ok(QuizStore::history(conn, student_id, self.settings.history_limit)?)
        })
    }
}

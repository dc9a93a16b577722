//! Integration tests for the quiz state machine: generation, answering,
//! scoring and aborts

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{FailingGenerator, SlowGenerator, TestEngine, answers};
use learnforge::domain::{QuizSubmission, Track};
use learnforge::error::ErrorKind;
use learnforge::progress::gamification::BadgeId;
use learnforge::quiz::QuizState;

#[tokio::test]
async fn test_perfect_quiz_scores_and_pays_bonus() {
    let t = TestEngine::new();
    let student = t.enroll("Aalam", Track::Gaming);
    let topics = t.seed_topics(Track::Gaming, 2);

    let started = t.engine.start_quiz(student.id, topics[0]).await.unwrap();
    assert_eq!(started.questions.len(), 5);
    assert_eq!(
        t.engine.quiz_sessions().state(student.id, topics[0]),
        QuizState::InProgress
    );

    let outcome = t
        .engine
        .submit_quiz(
            student.id,
            &QuizSubmission {
                topic_id: topics[0],
                attempt_id: Some(started.attempt_id),
                answers: answers(&["A", "A", "A", "A", "A"]),
            },
        )
        .unwrap();
    assert_eq!(outcome.correct, 5);
    assert_eq!(outcome.total, 5);
    assert_eq!(outcome.score, 100.0);
    assert_eq!(outcome.xp_earned, 100);
    assert!(outcome.perfect);
    assert_eq!(outcome.total_xp, 100);
    assert!(outcome.new_badges.iter().any(|b| b.id == BadgeId::Perfectionist));
    assert_eq!(
        t.engine.quiz_sessions().state(student.id, topics[0]),
        QuizState::Scored
    );

    let history = t.engine.quiz_history(student.id).unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].attempt.id, started.attempt_id);

    let progress = t.engine.get_progress(student.id).unwrap();
    let status = progress.topics.iter().find(|s| s.topic.id == topics[0]).unwrap();
    assert_eq!(status.best_quiz_score, Some(100.0));
    assert_eq!(status.quiz_attempts, 1);
    assert!(!status.completed);
}

#[tokio::test]
async fn test_answers_one_by_one_then_submit_rest() {
    let t = TestEngine::new();
    let student = t.enroll("Adham", Track::Business);
    let topic = t.seed_topics(Track::Business, 1)[0];

    let started = t.engine.start_quiz(student.id, topic).await.unwrap();
    let first = t
        .engine
        .answer_question(student.id, topic, Some(started.attempt_id), "A")
        .unwrap();
    assert!(first.is_correct);
    assert_eq!(first.remaining, 4);

    let second = t.engine.answer_question(student.id, topic, None, "B").unwrap();
    assert!(!second.is_correct);
    assert_eq!(second.correct, "A");

    let outcome = t
        .engine
        .submit_quiz(
            student.id,
            &QuizSubmission {
                topic_id: topic,
                attempt_id: None,
                answers: answers(&["A", "C", "A"]),
            },
        )
        .unwrap();
    assert_eq!(outcome.correct, 3);
    assert_eq!(outcome.score, 60.0);
    assert_eq!(outcome.xp_earned, 30);
    assert!(!outcome.perfect);
}

#[tokio::test]
async fn test_invalid_submission_leaves_attempt_open() {
    let t = TestEngine::new();
    let student = t.enroll("Irfan", Track::Business);
    let topic = t.seed_topics(Track::Business, 1)[0];
    let started = t.engine.start_quiz(student.id, topic).await.unwrap();

    let short = QuizSubmission {
        topic_id: topic,
        attempt_id: Some(started.attempt_id),
        answers: answers(&["A", "A"]),
    };
    assert_eq!(
        t.engine.submit_quiz(student.id, &short).unwrap_err().kind(),
        ErrorKind::ValidationError
    );

    let bogus = QuizSubmission {
        answers: answers(&["A", "A", "A", "A", "Z"]),
        ..short.clone()
    };
    assert_eq!(
        t.engine.submit_quiz(student.id, &bogus).unwrap_err().kind(),
        ErrorKind::ValidationError
    );
    assert_eq!(
        t.engine.quiz_sessions().state(student.id, topic),
        QuizState::InProgress
    );
    assert!(t.engine.quiz_history(student.id).unwrap().is_empty());

    let good = QuizSubmission {
        answers: answers(&["A", "A", "A", "A", "B"]),
        ..short
    };
    assert_eq!(t.engine.submit_quiz(student.id, &good).unwrap().correct, 4);
}

#[tokio::test]
async fn test_restart_replaces_previous_attempt() {
    let t = TestEngine::new();
    let student = t.enroll("Adnan", Track::Developer);
    let topic = t.seed_topics(Track::Developer, 1)[0];

    let old = t.engine.start_quiz(student.id, topic).await.unwrap();
    let new = t.engine.start_quiz(student.id, topic).await.unwrap();
    assert_ne!(old.attempt_id, new.attempt_id);

    let stale = QuizSubmission {
        topic_id: topic,
        attempt_id: Some(old.attempt_id),
        answers: answers(&["A", "A", "A", "A", "A"]),
    };
    assert_eq!(
        t.engine.submit_quiz(student.id, &stale).unwrap_err().kind(),
        ErrorKind::NotFound
    );

    let current = QuizSubmission {
        attempt_id: Some(new.attempt_id),
        ..stale
    };
    assert!(t.engine.submit_quiz(student.id, &current).is_ok());
    assert_eq!(t.engine.quiz_history(student.id).unwrap().len(), 1);
}

#[tokio::test]
async fn test_retaking_a_quiz_counts_both_attempts() {
    let t = TestEngine::new();
    let student = t.enroll("Arshad", Track::AiEnthusiast);
    let topic = t.seed_topics(Track::AiEnthusiast, 1)[0];

    for choices in [["B", "B", "B", "B", "B"], ["A", "A", "A", "B", "B"]] {
        let started = t.engine.start_quiz(student.id, topic).await.unwrap();
        t.engine
            .submit_quiz(
                student.id,
                &QuizSubmission {
                    topic_id: topic,
                    attempt_id: Some(started.attempt_id),
                    answers: answers(&choices),
                },
            )
            .unwrap();
    }

    let progress = t.engine.get_progress(student.id).unwrap();
    let status = &progress.topics[0];
    assert_eq!(status.quiz_attempts, 2);
    assert_eq!(status.best_quiz_score, Some(60.0));
    assert_eq!(t.engine.get_student(student.id).unwrap().total_xp, 30);
}

#[tokio::test]
async fn test_generator_failure_aborts_without_attempt() {
    let t = TestEngine::with_generator(Arc::new(FailingGenerator));
    let student = t.enroll("Aalam", Track::Gaming);
    let topic = t.seed_topics(Track::Gaming, 1)[0];

    let err = t.engine.start_quiz(student.id, topic).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UpstreamUnavailable);
    assert!(err.is_retryable());
    assert_eq!(
        t.engine.quiz_sessions().state(student.id, topic),
        QuizState::Aborted
    );
    assert!(t.engine.quiz_history(student.id).unwrap().is_empty());
    assert_eq!(t.engine.get_student(student.id).unwrap().total_xp, 0);

    // an immediate retry goes back to the generator rather than conflicting
    let retry = t.engine.start_quiz(student.id, topic).await.unwrap_err();
    assert_eq!(retry.kind(), ErrorKind::UpstreamUnavailable);
}

#[tokio::test]
async fn test_generator_timeout_aborts() {
    let t = TestEngine::with_generator(Arc::new(SlowGenerator(Duration::from_secs(5))));
    let student = t.enroll("Irfan", Track::Business);
    let topic = t.seed_topics(Track::Business, 1)[0];

    let err = t.engine.start_quiz(student.id, topic).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UpstreamUnavailable);
    assert_eq!(
        t.engine.quiz_sessions().state(student.id, topic),
        QuizState::Aborted
    );

    let submit = t
        .engine
        .submit_quiz(
            student.id,
            &QuizSubmission {
                topic_id: topic,
                attempt_id: None,
                answers: answers(&["A", "A", "A", "A", "A"]),
            },
        )
        .unwrap_err();
    assert_eq!(submit.kind(), ErrorKind::Conflict);
    assert!(t.engine.quiz_history(student.id).unwrap().is_empty());
}

#[tokio::test]
async fn test_admins_and_unknown_topics_cannot_start() {
    let t = TestEngine::new();
    let admin = t.enroll_admin("Uncle");
    let student = t.enroll("Aalam", Track::Gaming);
    let topic = t.seed_topics(Track::Gaming, 1)[0];

    let err = t.engine.start_quiz(admin.id, topic).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ValidationError);

    let missing = t.engine.start_quiz(student.id, topic + 100).await.unwrap_err();
    assert_eq!(missing.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn test_quiz_on_another_track_is_rejected() {
    let t = TestEngine::new();
    let student = t.enroll("Irfan", Track::Business);
    t.seed_topics(Track::Business, 2);
    let gaming = t.seed_topics(Track::Gaming, 2);

    for topic in &gaming {
        let err = t.engine.start_quiz(student.id, *topic).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValidationError);
    }

    let badges = t.engine.student_badges(student.id).unwrap();
    assert!(!badges.earned.iter().any(|b| b.id == BadgeId::CuriousMind));
    assert!(t.engine.quiz_history(student.id).unwrap().is_empty());
}

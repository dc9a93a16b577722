//! Route handlers. Each handler turns a parsed request into an engine call
//! and a JSON value; the server loop owns sockets and status lines.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use super::types::{
    AnswerRequest, ApiState, ChallengeSubmitRequest, ChatTurnRequest, FlashcardSessionRequest,
    LoginRequest, RepairRequest, TopicRequest,
};
use crate::domain::{NewStudent, QuizSubmission, StudentId, TopicId, Track};
use crate::engine::Session;
use crate::error::{EngineError, EngineResult};
use crate::progress::HistoryBucket;
use crate::progress::gamification::LeaderboardPeriod;

/// A request stripped down to what routing needs
#[derive(Debug, Clone, Default)]
pub struct ApiRequest {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub token: Option<String>,
    pub body: String,
}

impl ApiRequest {
    fn query_param(&self, key: &str) -> Option<&str> {
        self.query.as_deref()?.split('&').find_map(|pair| {
            let (k, v) = pair.split_once('=')?;
            (k == key).then_some(v)
        })
    }
}

pub type Reply = EngineResult<(u16, Value)>;

fn ok<T: Serialize>(value: T) -> Reply {
    serde_json::to_value(value)
        .map(|v| (200, v))
        .map_err(|e| EngineError::Internal(e.into()))
}

fn parse_body<T: DeserializeOwned>(body: &str) -> EngineResult<T> {
    let body = if body.trim().is_empty() { "{}" } else { body };
    serde_json::from_str(body).map_err(|e| EngineError::validation(format!("invalid JSON body: {e}")))
}

fn session(state: &ApiState, request: &ApiRequest) -> EngineResult<Session> {
    let token = request.token.as_deref().ok_or(EngineError::InvalidCredential)?;
    state.engine.authorize(token)
}

fn admin_session(state: &ApiState, request: &ApiRequest) -> EngineResult<Session> {
    let token = request.token.as_deref().ok_or(EngineError::InvalidCredential)?;
    state.engine.authorize_admin(token)
}

fn path_id(path: &str, prefix: &str) -> EngineResult<i64> {
    path.strip_prefix(prefix)
        .map(|rest| rest.trim_end_matches('/'))
        .filter(|rest| !rest.is_empty() && !rest.contains('/'))
        .and_then(|rest| rest.parse().ok())
        .ok_or_else(|| EngineError::validation(format!("bad id in {path}")))
}

pub fn route(state: &ApiState, request: &ApiRequest) -> Reply {
    let path = request.path.as_str();
    match (request.method.as_str(), path) {
        ("GET", "/api/health") => ok(json!({
            "status": "ok",
            "version": env!("CARGO_PKG_VERSION"),
        })),
        ("POST", "/api/login") => handle_login(state, request),
        ("POST", "/api/logout") => {
            let token = request.token.as_deref().ok_or(EngineError::InvalidCredential)?;
            ok(json!({ "revoked": state.engine.sessions().revoke(token) }))
        }
        ("GET", "/api/badges") => ok(state.engine.list_badges()),

        ("GET", "/api/students") => {
            session(state, request)?;
            ok(state.engine.list_students()?)
        }
        ("GET", p) if p.starts_with("/api/students/") => {
            session(state, request)?;
            ok(state.engine.get_student(path_id(p, "/api/students/")?)?)
        }
        ("GET", p) if p.starts_with("/api/topics/") => {
            session(state, request)?;
            let name = p.trim_start_matches("/api/topics/").trim_end_matches('/');
            let track = Track::from_str(name)
                .ok_or_else(|| EngineError::not_found(format!("Track {name}")))?;
            ok(state.engine.list_topics(track)?)
        }
        ("GET", p) if p.starts_with("/api/topic/") => {
            session(state, request)?;
            ok(state.engine.get_topic(path_id(p, "/api/topic/")?)?)
        }
        ("GET", p) if p.starts_with("/api/progress/") => {
            session(state, request)?;
            ok(state.engine.get_progress(path_id(p, "/api/progress/")?)?)
        }
        ("POST", "/api/topics/complete") => {
            let session = session(state, request)?;
            let body: TopicRequest = parse_body(&request.body)?;
            let outcome = state.engine.complete_topic(session.student_id, body.topic_id)?;
            ok(json!({ "topic_id": body.topic_id, "completed": true, "outcome": outcome }))
        }

        ("POST", "/api/quiz/start") => handle_quiz_start(state, request),
        ("POST", "/api/quiz/answer") => {
            let session = session(state, request)?;
            let body: AnswerRequest = parse_body(&request.body)?;
            ok(state.engine.answer_question(
                session.student_id,
                body.topic_id,
                body.attempt_id,
                &body.answer,
            )?)
        }
        ("POST", "/api/quiz/submit") => {
            let session = session(state, request)?;
            let body: QuizSubmission = parse_body(&request.body)?;
            ok(state.engine.submit_quiz(session.student_id, &body)?)
        }
        ("GET", p) if p.starts_with("/api/quiz/history/") => {
            session(state, request)?;
            ok(state.engine.quiz_history(path_id(p, "/api/quiz/history/")?)?)
        }

        ("GET", "/api/challenge/today") => {
            let session = session(state, request)?;
            ok(state.engine.today_challenge(session.student_id)?)
        }
        ("POST", "/api/challenge/submit") => {
            let session = session(state, request)?;
            let body: ChallengeSubmitRequest = parse_body(&request.body)?;
            ok(state
                .engine
                .submit_challenge(session.student_id, &body.challenge_id, &body.response)?)
        }
        ("POST", "/api/chat/turn") => {
            let session = session(state, request)?;
            let body: ChatTurnRequest = parse_body(&request.body)?;
            ok(state
                .engine
                .record_chat_turn(session.student_id, body.turn_id.as_deref())?)
        }
        ("POST", "/api/flashcards/session") => {
            let session = session(state, request)?;
            let body: FlashcardSessionRequest = parse_body(&request.body)?;
            ok(state.engine.record_flashcard_session(
                session.student_id,
                &body.deck,
                body.cards_reviewed,
            )?)
        }

        ("GET", "/api/leaderboard") => {
            session(state, request)?;
            let period = match request.query_param("period") {
                None | Some("") => LeaderboardPeriod::All,
                Some(p) => LeaderboardPeriod::from_str(p)
                    .ok_or_else(|| EngineError::validation(format!("unknown period \"{p}\"")))?,
            };
            ok(json!({
                "period": period.as_str(),
                "entries": state.engine.leaderboard(period)?,
            }))
        }
        ("GET", p) if p.starts_with("/api/badges/") => {
            session(state, request)?;
            ok(state.engine.student_badges(path_id(p, "/api/badges/")?)?)
        }
        ("GET", p) if p.starts_with("/api/xp/log/") => {
            session(state, request)?;
            let bucket = match request.query_param("bucket") {
                None | Some("") => HistoryBucket::Day,
                Some(b) => HistoryBucket::from_str(b)
                    .ok_or_else(|| EngineError::validation(format!("unknown bucket \"{b}\"")))?,
            };
            ok(state.engine.xp_log(path_id(p, "/api/xp/log/")?, bucket)?)
        }
        ("GET", p) if p.starts_with("/api/analytics/") => {
            session(state, request)?;
            ok(state.engine.analytics(path_id(p, "/api/analytics/")?)?)
        }

        ("GET", "/api/admin/overview") => {
            admin_session(state, request)?;
            ok(state.engine.admin_overview()?)
        }
        ("POST", "/api/admin/students") => {
            admin_session(state, request)?;
            let body: NewStudent = parse_body(&request.body)?;
            let student = state.engine.enroll(&body)?;
            Ok((201, serde_json::to_value(student).map_err(|e| EngineError::Internal(e.into()))?))
        }
        ("POST", "/api/admin/repair") => {
            admin_session(state, request)?;
            let body: RepairRequest = parse_body(&request.body)?;
            ok(state.engine.repair(body.student_id)?)
        }

        _ => Err(EngineError::not_found(format!(
            "Route {} {}",
            request.method, request.path
        ))),
    }
}

fn handle_login(state: &ApiState, request: &ApiRequest) -> Reply {
    let body: LoginRequest = parse_body(&request.body)?;
    ok(state.engine.identify(&body.name, &body.pin)?)
}

fn handle_quiz_start(state: &ApiState, request: &ApiRequest) -> Reply {
    let session = session(state, request)?;
    let body: TopicRequest = parse_body(&request.body)?;
    let student_id: StudentId = session.student_id;
    let topic_id: TopicId = body.topic_id;
    let started = state
        .runtime
        .block_on(state.engine.start_quiz(student_id, topic_id))?;
    ok(started)
}

/// JSON body for a failed request
pub fn error_body(err: &EngineError) -> Value {
    json!({
        "kind": err.kind().as_str(),
        "detail": err.to_string(),
        "retryable": err.is_retryable(),
    })
}

//! JSON HTTP API
//!
//! A small blocking `tiny_http` server. Routes live under `/api/*`; callers
//! authenticate with `Authorization: Bearer <token>` obtained from
//! `POST /api/login`. Failures are reported as
//! `{"kind": "...", "detail": "...", "retryable": bool}` with the status code
//! of the error kind.

mod handlers;
mod types;

pub use handlers::{ApiRequest, Reply, error_body, route};
pub use types::{
    AnswerRequest, ApiState, ChallengeSubmitRequest, ChatTurnRequest, FlashcardSessionRequest,
    LoginRequest, RepairRequest, TopicRequest,
};

use std::io::Read;
use std::net::SocketAddr;
use std::thread;

use anyhow::{Result, anyhow};
use serde_json::Value;
use tiny_http::{Header, Response, Server};
use tracing::{debug, error, info, warn};

use crate::error::EngineError;

const AUTH_HEADER: &str = "Authorization";

pub struct ApiServer {
    server: Server,
    state: ApiState,
}

impl ApiServer {
    pub fn bind(addr: &str, state: ApiState) -> Result<Self> {
        let server = Server::http(addr).map_err(|e| anyhow!("Failed to bind {}: {}", addr, e))?;
        info!("[learnforge:http] Server listening on http://{}", addr);
        Ok(Self { server, state })
    }

    /// Actual bound address (useful when binding to port 0)
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.server.server_addr().to_ip()
    }

    /// Make [`ApiServer::run`] return. Requests already handed off still
    /// get their response.
    pub fn stop(&self) {
        self.server.unblock();
    }

    /// Serve requests until [`ApiServer::stop`] is called. Blocks the
    /// calling thread and hands each request to a thread of its own. Async
    /// engine calls are driven on the state's runtime handle, so this must
    /// not run on a runtime worker thread.
    pub fn run(&self) {
        for request in self.server.incoming_requests() {
            let state = self.state.clone();
            thread::spawn(move || handle_request(&state, request));
        }
        info!("[learnforge:http] Server stopped");
    }
}

fn handle_request(state: &ApiState, mut request: tiny_http::Request) {
    let method = request.method().to_string();
    let url = request.url().to_string();
    let (path, query) = match url.split_once('?') {
        Some((path, query)) => (path.to_string(), Some(query.to_string())),
        None => (url.clone(), None),
    };

    let body = match read_request_body(&mut request, state.max_body_bytes) {
        Ok(body) => body,
        Err((status, value)) => {
            respond_json(request, status, &value);
            return;
        }
    };

    let api_request = ApiRequest {
        method,
        path,
        query,
        token: bearer_token(&request),
        body,
    };

    let (status, value) = match route(state, &api_request) {
        Ok(reply) => reply,
        Err(err) => {
            log_failure(&api_request, &err);
            (err.kind().http_status(), error_body(&err))
        }
    };
    debug!(
        "[learnforge:http] {} {} -> {}",
        api_request.method, api_request.path, status
    );
    respond_json(request, status, &value);
}

fn log_failure(request: &ApiRequest, err: &EngineError) {
    match err {
        EngineError::Internal(cause) => {
            error!("[learnforge:http] {} {} failed: {:#}", request.method, request.path, cause)
        }
        EngineError::UpstreamUnavailable(_) => {
            warn!("[learnforge:http] {} {}: {}", request.method, request.path, err)
        }
        _ => debug!("[learnforge:http] {} {}: {}", request.method, request.path, err),
    }
}

fn bearer_token(request: &tiny_http::Request) -> Option<String> {
    request
        .headers()
        .iter()
        .find(|h| h.field.equiv(AUTH_HEADER))
        .and_then(|h| h.value.as_str().strip_prefix("Bearer "))
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}

fn json_content_type() -> Option<Header> {
    Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..]).ok()
}

fn read_request_body(request: &mut tiny_http::Request, max_bytes: usize) -> Result<String, (u16, Value)> {
    let mut body = String::new();
    let mut reader = request.as_reader().take((max_bytes + 1) as u64);
    if let Err(e) = reader.read_to_string(&mut body) {
        error!("[learnforge:http] Failed to read body: {}", e);
        return Err((
            400,
            error_body(&EngineError::validation("unreadable request body")),
        ));
    }

    if body.len() > max_bytes {
        return Err((
            413,
            error_body(&EngineError::validation(format!(
                "request body exceeds {max_bytes} bytes"
            ))),
        ));
    }

    Ok(body)
}

fn respond_json(request: tiny_http::Request, status_code: u16, value: &Value) {
    let body = serde_json::to_string(value)
        .unwrap_or_else(|_| "{\"kind\":\"Internal\",\"detail\":\"serialize\"}".to_string());
    let mut response = Response::from_string(body).with_status_code(status_code);
    if let Some(header) = json_content_type() {
        response = response.with_header(header);
    }
    if let Err(e) = request.respond(response) {
        debug!("[learnforge:http] Failed to send response: {}", e);
    }
}

//! PIN digests and bearer sessions

use std::collections::HashMap;
use std::sync::Mutex;

use hex::ToHex;
use serde::Serialize;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::domain::{Role, StudentId};
use crate::error::{EngineError, EngineResult};

pub const PIN_LENGTH: usize = 4;

/// Digest stored in place of the PIN. The student name salts it so two
/// students with the same PIN do not share a digest.
pub fn pin_digest(name: &str, pin: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(name.trim().to_lowercase().as_bytes());
    hasher.update(b":");
    hasher.update(pin.as_bytes());
    hasher.finalize().encode_hex::<String>()
}

pub fn validate_pin(pin: &str) -> EngineResult<()> {
    if pin.len() != PIN_LENGTH || !pin.bytes().all(|b| b.is_ascii_digit()) {
        return Err(EngineError::validation(format!(
            "PIN must be {PIN_LENGTH} digits"
        )));
    }
    Ok(())
}

/// Identity behind a bearer token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Session {
    pub student_id: StudentId,
    pub role: Role,
}

/// In-memory token table. Tokens are random v4 uuids and do not survive a
/// restart. Each student holds at most one token; logging in again replaces
/// the previous one.
#[derive(Default)]
pub struct SessionStore {
    tokens: Mutex<HashMap<String, Session>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&self, session: Session) -> String {
        let token = Uuid::new_v4().simple().to_string();
        let mut tokens = self.tokens.lock().unwrap_or_else(|e| e.into_inner());
        tokens.retain(|_, s| s.student_id != session.student_id);
        tokens.insert(token.clone(), session);
        token
    }

    pub fn len(&self) -> usize {
        self.tokens.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn resolve(&self, token: &str) -> EngineResult<Session> {
        self.tokens
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(token.trim())
            .copied()
            .ok_or(EngineError::InvalidCredential)
    }

    pub fn revoke(&self, token: &str) -> bool {
        self.tokens
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(token.trim())
            .is_some()
    }
}

//! Engine error taxonomy
//!
//! Every failure reported to a caller carries a machine-readable [`ErrorKind`]
//! and a human-readable detail string. Storage and I/O failures travel as
//! `anyhow` errors internally and surface as [`EngineError::Internal`], whose
//! message says nothing about the cause.

use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Invalid name or PIN")]
    InvalidCredential,

    #[error("{0} not found")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Question generator unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    /// The cause stays in the source chain for logs and never reaches the
    /// display text callers see.
    #[error("Internal error")]
    Internal(#[from] anyhow::Error),
}

/// Machine-readable error kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorKind {
    InvalidCredential,
    NotFound,
    Conflict,
    UpstreamUnavailable,
    ValidationError,
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidCredential => "InvalidCredential",
            Self::NotFound => "NotFound",
            Self::Conflict => "Conflict",
            Self::UpstreamUnavailable => "UpstreamUnavailable",
            Self::ValidationError => "ValidationError",
            Self::Internal => "Internal",
        }
    }

    pub fn http_status(&self) -> u16 {
        match self {
            Self::InvalidCredential => 401,
            Self::NotFound => 404,
            Self::Conflict => 409,
            Self::UpstreamUnavailable => 503,
            Self::ValidationError => 422,
            Self::Internal => 500,
        }
    }
}

impl EngineError {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn conflict(detail: impl Into<String>) -> Self {
        Self::Conflict(detail.into())
    }

    pub fn validation(detail: impl Into<String>) -> Self {
        Self::Validation(detail.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidCredential => ErrorKind::InvalidCredential,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Conflict(_) => ErrorKind::Conflict,
            Self::UpstreamUnavailable(_) => ErrorKind::UpstreamUnavailable,
            Self::Validation(_) => ErrorKind::ValidationError,
            Self::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Whether the caller may simply try the same request again
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::UpstreamUnavailable(_))
    }
}

impl From<rusqlite::Error> for EngineError {
    fn from(e: rusqlite::Error) -> Self {
        Self::Internal(anyhow::Error::new(e))
    }
}

pub type EngineResult<T> = std::result::Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds_map_to_statuses() {
        assert_eq!(EngineError::InvalidCredential.kind().http_status(), 401);
        assert_eq!(EngineError::not_found("Topic 9").kind().http_status(), 404);
        assert_eq!(EngineError::conflict("dup").kind().http_status(), 409);
        assert_eq!(
            EngineError::UpstreamUnavailable("timeout".into())
                .kind()
                .http_status(),
            503
        );
        assert_eq!(EngineError::validation("x").kind().as_str(), "ValidationError");
    }

    #[test]
    fn test_only_upstream_is_retryable() {
        assert!(EngineError::UpstreamUnavailable("timeout".into()).is_retryable());
        assert!(!EngineError::conflict("dup").is_retryable());
        assert!(!EngineError::Internal(anyhow::anyhow!("disk")).is_retryable());
    }

    #[test]
    fn test_internal_detail_hides_cause() {
        let err = EngineError::from(anyhow::anyhow!("no such table: students").context("/srv/progress.db"));
        assert_eq!(err.to_string(), "Internal error");
        let source = std::error::Error::source(&err).map(|s| s.to_string());
        assert!(source.is_some());
    }

    #[test]
    fn test_not_found_message() {
        assert_eq!(EngineError::not_found("Student 4").to_string(), "Student 4 not found");
    }
}

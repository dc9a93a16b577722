//! Settings sections of `config.toml`

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// `[storage]`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageSettings {
    /// Database file; defaults to `~/.learnforge/progress.db`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub db_path: Option<PathBuf>,
}

/// `[server]`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_bind")]
    pub bind: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Request bodies larger than this are rejected with 413
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,

    /// Entries returned by history endpoints
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
}

fn default_bind() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8787
}

fn default_max_body_bytes() -> usize {
    64 * 1024
}

fn default_history_limit() -> usize {
    50
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
            max_body_bytes: default_max_body_bytes(),
            history_limit: default_history_limit(),
        }
    }
}

/// `[generator]`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorSettings {
    /// Question service URL. When unset the built-in question set is used.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    /// Sent as a bearer token to the question service
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Upper bound on one generation call
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_questions_per_quiz")]
    pub questions_per_quiz: usize,
}

fn default_timeout_secs() -> u64 {
    20
}

fn default_questions_per_quiz() -> usize {
    5
}

impl Default for GeneratorSettings {
    fn default() -> Self {
        Self {
            endpoint: None,
            api_key: None,
            timeout_secs: default_timeout_secs(),
            questions_per_quiz: default_questions_per_quiz(),
        }
    }
}

/// `[calendar]`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CalendarSettings {
    /// Offset used for new students that do not specify one, and for
    /// calendar-wide views (weekly leaderboard, admin "today")
    #[serde(default)]
    pub default_utc_offset_minutes: i32,

    /// Streak freezes granted at enrollment
    #[serde(default)]
    pub starting_freezes: u32,
}

//! Configuration for learnforge
//!
//! Configuration is stored globally in `~/.learnforge/config.toml`. Every
//! field has a default, so a missing file or a partial file is fine.

mod settings;

pub use settings::{CalendarSettings, GeneratorSettings, ServerSettings, StorageSettings};

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use fs2::FileExt;
use serde::{Deserialize, Serialize};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageSettings,

    #[serde(default)]
    pub server: ServerSettings,

    #[serde(default)]
    pub generator: GeneratorSettings,

    #[serde(default)]
    pub calendar: CalendarSettings,
}

impl Config {
    /// Global config directory (~/.learnforge)
    pub fn global_config_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".learnforge")
    }

    /// Global config file path (~/.learnforge/config.toml)
    pub fn global_config_path() -> PathBuf {
        Self::global_config_dir().join("config.toml")
    }

    /// Database path, resolved against the global directory when unset
    pub fn db_path(&self) -> PathBuf {
        self.storage
            .db_path
            .clone()
            .unwrap_or_else(|| Self::global_config_dir().join("progress.db"))
    }

    /// Server socket address as `host:port`
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.bind, self.server.port)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    /// Load from `path` if given, otherwise from the global config.
    ///
    /// A missing global config yields defaults; a missing explicit path is
    /// an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::from_file(path);
        }

        let global_path = Self::global_config_path();
        if !global_path.exists() {
            tracing::debug!(
                "No config at {}, using defaults",
                global_path.display()
            );
            return Ok(Self::default());
        }
        Self::from_file(&global_path)
    }

    /// Save configuration atomically.
    ///
    /// Holds an exclusive lock on a sibling `.toml.lock` file while the
    /// content is written to a temp file and renamed into place.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;

        let lock_path = path.with_extension("toml.lock");
        let lock_file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(&lock_path)
            .with_context(|| format!("Failed to create lock file: {}", lock_path.display()))?;
        lock_file
            .lock_exclusive()
            .with_context(|| format!("Failed to lock config: {}", lock_path.display()))?;

        let temp_path = path.with_extension("toml.tmp");
        let result = (|| -> Result<()> {
            let mut temp = std::fs::File::create(&temp_path).with_context(|| {
                format!("Failed to create temp config file: {}", temp_path.display())
            })?;
            temp.write_all(content.as_bytes())
                .context("Failed to write config")?;
            temp.sync_all().context("Failed to sync config")?;
            std::fs::rename(&temp_path, path)
                .with_context(|| format!("Failed to write config file: {}", path.display()))?;
            Ok(())
        })();

        let _ = lock_file.unlock();
        if result.is_err() {
            let _ = std::fs::remove_file(&temp_path);
        }
        result
    }
}

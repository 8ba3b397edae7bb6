//! Environment-backed configuration.
//!
//! One credential is required; everything else has a sensible default. The
//! loader runs once at startup, before any window exists, so a missing key
//! halts the process instead of surfacing mid-session.

use std::env;
use std::path::PathBuf;

/// Default directory for saved artifacts, relative to the working directory.
pub const DEFAULT_CONTENT_DIR: &str = "projects";

const DEFAULT_COMPLETION_MODEL: &str = "gpt-4o-mini";
const DEFAULT_TRANSCRIPTION_MODEL: &str = "whisper-1";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("OPENAI_API_KEY is not set. Add it to your environment or .env file.")]
    MissingApiKey,
}

#[derive(Debug, Clone)]
pub struct AssistantSettings {
    pub api_key: String,
    pub completion_model: String,
    pub transcription_model: String,
    pub content_dir: PathBuf,
}

impl AssistantSettings {
    /// Load settings from the process environment.
    ///
    /// `OPENAI_API_KEY` is required. `WORKBENCH_COMPLETION_MODEL`,
    /// `WORKBENCH_TRANSCRIPTION_MODEL` and `WORKBENCH_CONTENT_DIR` override
    /// the defaults when set and non-blank.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_key = env::var("OPENAI_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or(ConfigError::MissingApiKey)?;

        Ok(Self {
            api_key,
            completion_model: env_or("WORKBENCH_COMPLETION_MODEL", DEFAULT_COMPLETION_MODEL),
            transcription_model: env_or(
                "WORKBENCH_TRANSCRIPTION_MODEL",
                DEFAULT_TRANSCRIPTION_MODEL,
            ),
            content_dir: PathBuf::from(env_or("WORKBENCH_CONTENT_DIR", DEFAULT_CONTENT_DIR)),
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

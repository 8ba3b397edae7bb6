//! Thin adapters over the remote completion and transcription capabilities.
//!
//! Both adapters make a single blocking-per-action attempt with no retry and
//! surface failures as tagged errors. Deciding what a failure means for the
//! run (fold into displayable text, or abort) is the pipeline's call, not the
//! adapter's.

pub mod openai;
pub mod whisper;

use async_trait::async_trait;
use reqwest::Client;
use shared::chat::ChatMessage;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use std::time::Duration;

pub use openai::OpenAIClient;
pub use whisper::WhisperClient;

pub(crate) static SHARED_HTTP: LazyLock<Client> = LazyLock::new(|| {
    Client::builder()
        .timeout(Duration::from_secs(120))
        .pool_max_idle_per_host(2)
        .build()
        .expect("failed to build HTTP client")
});

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com";

#[derive(Debug, thiserror::Error)]
pub enum CompletionError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("completion endpoint returned {status}: {detail}")]
    Api {
        status: reqwest::StatusCode,
        detail: String,
    },

    #[error("completion response contained no choices")]
    EmptyResponse,
}

#[derive(Debug, thiserror::Error)]
pub enum TranscriptionError {
    #[error("could not read audio file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("transcription endpoint returned {status}: {detail}")]
    Api {
        status: reqwest::StatusCode,
        detail: String,
    },
}

/// Remote text-completion capability.
#[async_trait]
pub trait CompletionApi: Send + Sync {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        temperature: f32,
    ) -> Result<String, CompletionError>;
}

/// Remote speech-to-text capability over a local audio file.
#[async_trait]
pub trait TranscriptionApi: Send + Sync {
    async fn transcribe(&self, audio_path: &Path) -> Result<String, TranscriptionError>;
}

/// Trim an error body to something worth showing inline.
pub(crate) fn truncate_detail(body: &str) -> String {
    body.chars().take(800).collect()
}

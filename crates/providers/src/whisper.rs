use async_trait::async_trait;
use reqwest::multipart;
use serde::Deserialize;
use std::path::Path;

use crate::{truncate_detail, TranscriptionApi, TranscriptionError, DEFAULT_BASE_URL, SHARED_HTTP};

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    text: String,
}

/// Speech-to-text over the hosted transcription endpoint. The audio is read
/// from a local file and uploaded as-is; codec handling is entirely the
/// remote side's problem.
pub struct WhisperClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl WhisperClient {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            http: SHARED_HTTP.clone(),
            api_key: api_key.into(),
            model: model.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }
}

#[async_trait]
impl TranscriptionApi for WhisperClient {
    async fn transcribe(&self, audio_path: &Path) -> Result<String, TranscriptionError> {
        let bytes = tokio::fs::read(audio_path)
            .await
            .map_err(|source| TranscriptionError::Io {
                path: audio_path.to_path_buf(),
                source,
            })?;

        let file_name = audio_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "audio".to_string());

        tracing::debug!(model = %self.model, file = %file_name, bytes = bytes.len(), "dispatching transcription");

        let form = multipart::Form::new()
            .text("model", self.model.clone())
            .part("file", multipart::Part::bytes(bytes).file_name(file_name));

        let url = format!("{}/v1/audio/transcriptions", self.base_url);
        let resp = self
            .http
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .multipart(form)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(TranscriptionError::Api {
                status,
                detail: truncate_detail(&body),
            });
        }

        let body: TranscriptionResponse = resp.json().await?;
        Ok(body.text.trim().to_string())
    }
}

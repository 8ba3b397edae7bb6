//! The shared pipeline state machine.
//!
//! Validating -> Dispatching -> Persisting -> RecordingHistory, with two
//! early exits: a blank required field rejects the run before any remote
//! call, and a transcription failure aborts the voice run before any
//! persistence. Completion failures do not abort: the pipeline folds them
//! into warning-marked text that is displayed, persisted and recorded like
//! any other result, so a flaky endpoint never loses a run.

use providers::{CompletionApi, TranscriptionApi, TranscriptionError};
use services::ArtifactStore;
use shared::chat::ChatMessage;
use shared::history::{HistoryRecord, Mode, SessionContext};
use std::path::PathBuf;

use crate::spec::{
    ModeSpec, PersistPolicy, VOICE_MISSING_AUDIO, VOICE_REQUIRED_EXT, VOICE_SYSTEM_PROMPT,
    VOICE_TEMPERATURE,
};

/// Prefix marking completion failures that were folded into result text.
pub const WARNING_MARKER: &str = "⚠️ Error: ";

/// Form input for the four text modes, one value per [`FieldSpec`].
///
/// [`FieldSpec`]: crate::spec::FieldSpec
#[derive(Debug, Clone, Default)]
pub struct TextRequest {
    pub values: Vec<String>,
    /// Target filename as typed; blank means "use the default" for modes
    /// that always persist, and "skip persistence" for opt-in modes.
    pub filename: String,
}

/// An uploaded audio payload for the voice mode.
#[derive(Debug, Clone)]
pub struct VoiceRequest {
    pub audio_name: String,
    pub audio_bytes: Vec<u8>,
    pub filename: String,
}

/// What one pipeline run produced.
#[derive(Debug)]
pub struct RunReport {
    pub mode: Mode,
    /// Text to display (the model reply, or warning-marked failure text).
    pub text: String,
    /// Voice runs also carry the transcript for display.
    pub transcript: Option<String>,
    pub saved_path: Option<PathBuf>,
    /// Set when persistence was attempted and failed; no history record
    /// exists for such a run.
    pub save_error: Option<String>,
    /// True when the completion call failed and `text` is the folded error.
    pub degraded: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Validation failure. Terminal, no side effects, message names the
    /// missing field.
    #[error("{0}")]
    Rejected(String),

    #[error("Voice processing failed: {0}")]
    Transcription(#[from] TranscriptionError),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// Run one of the four text-mode pipelines to completion.
pub async fn run_text_pipeline(
    spec: &ModeSpec,
    request: &TextRequest,
    completion: &dyn CompletionApi,
    store: &ArtifactStore,
    history: &mut SessionContext,
) -> Result<RunReport, PipelineError> {
    // Validating
    for (i, field) in spec.fields.iter().enumerate() {
        let value = request.values.get(i).map(|v| v.trim()).unwrap_or("");
        if value.is_empty() {
            return Err(PipelineError::Rejected(field.missing.to_string()));
        }
    }

    tracing::info!(mode = spec.mode.display_name(), "pipeline dispatching");

    // Dispatching
    let messages = [
        ChatMessage::system(spec.system_prompt),
        ChatMessage::user(spec.compose_user_content(&request.values)),
    ];
    let (text, degraded) = fold_completion(
        completion.complete(&messages, spec.temperature).await,
        spec.mode,
    );

    // Persisting
    let should_persist = match spec.persist {
        PersistPolicy::Always => true,
        PersistPolicy::WhenNamed => !request.filename.trim().is_empty(),
    };

    let mut report = RunReport {
        mode: spec.mode,
        text,
        transcript: None,
        saved_path: None,
        save_error: None,
        degraded,
    };
    if !should_persist {
        return Ok(report);
    }

    match store.save(&report.text, &request.filename, spec.required_ext) {
        Ok(path) => {
            // RecordingHistory: exactly one record, only after a good save.
            history.append(HistoryRecord::new(
                spec.mode,
                request.values[spec.history_field].clone(),
                request.filename.clone(),
                Some(path.clone()),
            ));
            report.saved_path = Some(path);
        }
        Err(e) => {
            tracing::error!(mode = spec.mode.display_name(), error = %e, "artifact save failed");
            report.save_error = Some(e.to_string());
        }
    }

    Ok(report)
}

/// Run the two-stage voice pipeline: spool the upload, transcribe it, answer
/// the transcript, persist transcript and response together.
pub async fn run_voice_pipeline(
    request: &VoiceRequest,
    completion: &dyn CompletionApi,
    transcription: &dyn TranscriptionApi,
    store: &ArtifactStore,
    history: &mut SessionContext,
) -> Result<RunReport, PipelineError> {
    if request.audio_bytes.is_empty() {
        return Err(PipelineError::Rejected(VOICE_MISSING_AUDIO.to_string()));
    }

    tracing::info!(file = %request.audio_name, "voice pipeline dispatching");

    let temp_path = store.spool_temp(&request.audio_name, &request.audio_bytes)?;
    let transcribed = transcription.transcribe(&temp_path).await;
    // The spool copy is only needed for the upload; drop it before looking
    // at the outcome so cleanup happens on the failure path too.
    store.discard_temp(&temp_path);
    let transcript = transcribed?;

    let messages = [
        ChatMessage::system(VOICE_SYSTEM_PROMPT),
        ChatMessage::user(transcript.clone()),
    ];
    let (reply, degraded) = fold_completion(
        completion.complete(&messages, VOICE_TEMPERATURE).await,
        Mode::Voice,
    );

    let combined = format!("Transcript:\n{transcript}\n\nResponse:\n{reply}");

    let mut report = RunReport {
        mode: Mode::Voice,
        text: reply,
        transcript: Some(transcript.clone()),
        saved_path: None,
        save_error: None,
        degraded,
    };

    match store.save(&combined, &request.filename, VOICE_REQUIRED_EXT) {
        Ok(path) => {
            history.append(HistoryRecord::new(
                Mode::Voice,
                transcript,
                request.filename.clone(),
                Some(path.clone()),
            ));
            report.saved_path = Some(path);
        }
        Err(e) => {
            tracing::error!(error = %e, "voice artifact save failed");
            report.save_error = Some(e.to_string());
        }
    }

    Ok(report)
}

/// Fold a completion outcome into displayable/persistable text. Failures
/// become warning-marked text instead of aborting the run.
fn fold_completion(
    result: Result<String, providers::CompletionError>,
    mode: Mode,
) -> (String, bool) {
    match result {
        Ok(text) => (text, false),
        Err(e) => {
            tracing::warn!(mode = mode.display_name(), error = %e, "completion failed; folding into result text");
            (format!("{WARNING_MARKER}{e}"), true)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec;
    use async_trait::async_trait;
    use providers::CompletionError;
    use std::fs;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    struct FixedCompletion {
        reply: &'static str,
        calls: AtomicUsize,
    }

    impl FixedCompletion {
        fn new(reply: &'static str) -> Self {
            Self {
                reply,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl CompletionApi for FixedCompletion {
        async fn complete(
            &self,
            _messages: &[ChatMessage],
            _temperature: f32,
        ) -> Result<String, CompletionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.reply.to_string())
        }
    }

    struct FailingCompletion;

    #[async_trait]
    impl CompletionApi for FailingCompletion {
        async fn complete(
            &self,
            _messages: &[ChatMessage],
            _temperature: f32,
        ) -> Result<String, CompletionError> {
            Err(CompletionError::EmptyResponse)
        }
    }

    struct FixedTranscription(&'static str);

    #[async_trait]
    impl TranscriptionApi for FixedTranscription {
        async fn transcribe(&self, audio_path: &Path) -> Result<String, TranscriptionError> {
            // The spool file must exist while we are "uploading" it.
            assert!(audio_path.exists());
            Ok(self.0.to_string())
        }
    }

    struct FailingTranscription;

    #[async_trait]
    impl TranscriptionApi for FailingTranscription {
        async fn transcribe(&self, audio_path: &Path) -> Result<String, TranscriptionError> {
            Err(TranscriptionError::Io {
                path: audio_path.to_path_buf(),
                source: std::io::Error::new(std::io::ErrorKind::Other, "simulated"),
            })
        }
    }

    fn setup() -> (TempDir, ArtifactStore, SessionContext) {
        let temp = TempDir::new().unwrap();
        let store = ArtifactStore::open(temp.path().join("projects")).unwrap();
        (temp, store, SessionContext::new())
    }

    fn artifact_count(store: &ArtifactStore) -> usize {
        fs::read_dir(store.root()).unwrap().count()
    }

    #[tokio::test]
    async fn test_blank_input_rejects_without_side_effects() {
        let (_temp, store, mut history) = setup();
        let completion = FixedCompletion::new("unused");
        let request = TextRequest {
            values: vec!["   ".to_string()],
            filename: "app.py".to_string(),
        };

        let err = run_text_pipeline(&spec::BUILD, &request, &completion, &store, &mut history)
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::Rejected(ref m) if m == "Please describe what to build."));
        assert_eq!(completion.calls.load(Ordering::SeqCst), 0);
        assert!(history.is_empty());
        assert_eq!(artifact_count(&store), 0);
    }

    #[tokio::test]
    async fn test_rejection_names_the_missing_field() {
        let (_temp, store, mut history) = setup();
        let completion = FixedCompletion::new("unused");
        let request = TextRequest {
            values: vec!["print(1)".to_string(), "".to_string()],
            filename: "updated_app.py".to_string(),
        };

        let err = run_text_pipeline(&spec::MODIFY, &request, &completion, &store, &mut history)
            .await
            .unwrap_err();

        assert!(
            matches!(err, PipelineError::Rejected(ref m) if m == "Please describe the changes you want.")
        );
    }

    #[tokio::test]
    async fn test_build_run_persists_and_records() {
        let (_temp, store, mut history) = setup();
        let completion = FixedCompletion::new("print('hello')");
        let request = TextRequest {
            values: vec!["a hello script".to_string()],
            filename: "hello.py".to_string(),
        };

        let report = run_text_pipeline(&spec::BUILD, &request, &completion, &store, &mut history)
            .await
            .unwrap();

        assert_eq!(report.text, "print('hello')");
        assert!(!report.degraded);
        let path = report.saved_path.expect("artifact saved");
        assert_eq!(fs::read_to_string(&path).unwrap(), "print('hello')");

        assert_eq!(history.len(), 1);
        let record = &history.records()[0];
        assert_eq!(record.mode, Mode::Build);
        assert_eq!(record.prompt, "a hello script");
        assert_eq!(record.filename, "hello.py");
        assert_eq!(record.path.as_deref(), Some(path.as_path()));
    }

    #[tokio::test]
    async fn test_completion_failure_still_persists_and_records() {
        let (_temp, store, mut history) = setup();
        let request = TextRequest {
            values: vec!["anything".to_string()],
            filename: "app.py".to_string(),
        };

        let report = run_text_pipeline(
            &spec::BUILD,
            &request,
            &FailingCompletion,
            &store,
            &mut history,
        )
        .await
        .unwrap();

        assert!(report.degraded);
        assert!(report.text.starts_with(WARNING_MARKER));

        let path = report.saved_path.expect("failure text is still persisted");
        let content = fs::read_to_string(&path).unwrap();
        assert!(content.starts_with(WARNING_MARKER));
        assert_eq!(history.len(), 1);
    }

    #[tokio::test]
    async fn test_ask_without_filename_skips_persistence_and_history() {
        let (_temp, store, mut history) = setup();
        let completion = FixedCompletion::new("42");
        let request = TextRequest {
            values: vec!["meaning of life?".to_string()],
            filename: "   ".to_string(),
        };

        let report = run_text_pipeline(&spec::ASK, &request, &completion, &store, &mut history)
            .await
            .unwrap();

        assert_eq!(report.text, "42");
        assert!(report.saved_path.is_none());
        assert!(report.save_error.is_none());
        assert!(history.is_empty());
        assert_eq!(artifact_count(&store), 0);
    }

    #[tokio::test]
    async fn test_ask_with_filename_opts_into_persistence() {
        let (_temp, store, mut history) = setup();
        let completion = FixedCompletion::new("42");
        let request = TextRequest {
            values: vec!["meaning of life?".to_string()],
            filename: "answer.txt".to_string(),
        };

        let report = run_text_pipeline(&spec::ASK, &request, &completion, &store, &mut history)
            .await
            .unwrap();

        assert!(report.saved_path.is_some());
        assert_eq!(history.len(), 1);
        assert_eq!(history.records()[0].mode, Mode::Ask);
    }

    #[tokio::test]
    async fn test_save_failure_surfaces_error_and_records_nothing() {
        let (_temp, store, mut history) = setup();
        let completion = FixedCompletion::new("result");
        let request = TextRequest {
            values: vec!["prompt".to_string()],
            filename: "app.py".to_string(),
        };

        // Force the save to fail by removing the content root.
        fs::remove_dir_all(store.root()).unwrap();

        let report = run_text_pipeline(&spec::BUILD, &request, &completion, &store, &mut history)
            .await
            .unwrap();

        assert_eq!(report.text, "result"); // still displayable
        assert!(report.saved_path.is_none());
        assert!(report.save_error.is_some());
        assert!(history.is_empty());
    }

    #[tokio::test]
    async fn test_voice_run_concatenates_and_cleans_up() {
        let (_temp, store, mut history) = setup();
        let request = VoiceRequest {
            audio_name: "note.wav".to_string(),
            audio_bytes: b"RIFFxxxx".to_vec(),
            filename: "transcript.txt".to_string(),
        };

        let report = run_voice_pipeline(
            &request,
            &FixedCompletion::new("hi there"),
            &FixedTranscription("hello"),
            &store,
            &mut history,
        )
        .await
        .unwrap();

        assert_eq!(report.transcript.as_deref(), Some("hello"));
        assert_eq!(report.text, "hi there");

        let path = report.saved_path.expect("artifact saved");
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "Transcript:\nhello\n\nResponse:\nhi there"
        );

        // Only the artifact remains; the temp spool copy is gone.
        assert_eq!(artifact_count(&store), 1);
        assert_eq!(history.len(), 1);
        assert_eq!(history.records()[0].prompt, "hello");
    }

    #[tokio::test]
    async fn test_voice_transcription_failure_aborts_after_cleanup() {
        let (_temp, store, mut history) = setup();
        let request = VoiceRequest {
            audio_name: "note.wav".to_string(),
            audio_bytes: b"RIFFxxxx".to_vec(),
            filename: "transcript.txt".to_string(),
        };

        let err = run_voice_pipeline(
            &request,
            &FixedCompletion::new("unused"),
            &FailingTranscription,
            &store,
            &mut history,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, PipelineError::Transcription(_)));
        assert!(history.is_empty());
        // No artifact, and no leaked temp spool file either.
        assert_eq!(artifact_count(&store), 0);
    }

    #[tokio::test]
    async fn test_voice_without_upload_rejects() {
        let (_temp, store, mut history) = setup();
        let request = VoiceRequest {
            audio_name: String::new(),
            audio_bytes: Vec::new(),
            filename: "transcript.txt".to_string(),
        };

        let err = run_voice_pipeline(
            &request,
            &FixedCompletion::new("unused"),
            &FixedTranscription("unused"),
            &store,
            &mut history,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, PipelineError::Rejected(ref m) if m == "Please upload an audio file."));
        assert_eq!(artifact_count(&store), 0);
    }

    #[tokio::test]
    async fn test_history_keeps_completion_order() {
        let (_temp, store, mut history) = setup();
        let completion = FixedCompletion::new("out");

        let build = TextRequest {
            values: vec!["first".to_string()],
            filename: "a.py".to_string(),
        };
        run_text_pipeline(&spec::BUILD, &build, &completion, &store, &mut history)
            .await
            .unwrap();

        let ask = TextRequest {
            values: vec!["second".to_string()],
            filename: "b.txt".to_string(),
        };
        run_text_pipeline(&spec::ASK, &ask, &completion, &store, &mut history)
            .await
            .unwrap();

        let modes: Vec<Mode> = history.records().iter().map(|r| r.mode).collect();
        assert_eq!(modes, vec![Mode::Build, Mode::Ask]);
    }
}

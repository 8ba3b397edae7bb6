//! Form buffers and per-run feedback for the window.

use pipelines::executor::RunReport;
use pipelines::spec;

/// One text buffer per form input, prefilled with each mode's default
/// filename. Buffers survive tab switches; only the user clears them.
pub struct Forms {
    pub build_prompt: String,
    pub build_filename: String,
    /// Picked quick template, if any; `None` means no prefill.
    pub template_choice: Option<usize>,

    pub modify_code: String,
    pub modify_request: String,
    pub modify_filename: String,

    pub edit_content: String,
    pub edit_request: String,
    pub edit_filename: String,

    pub ask_question: String,
    pub ask_filename: String,

    /// Picked audio upload: (original file name, raw bytes).
    pub voice_audio: Option<(String, Vec<u8>)>,
    pub voice_filename: String,
}

impl Default for Forms {
    fn default() -> Self {
        Self {
            build_prompt: String::new(),
            build_filename: spec::BUILD.default_filename.to_string(),
            template_choice: None,
            modify_code: String::new(),
            modify_request: String::new(),
            modify_filename: spec::MODIFY.default_filename.to_string(),
            edit_content: String::new(),
            edit_request: String::new(),
            edit_filename: spec::EDIT.default_filename.to_string(),
            ask_question: String::new(),
            ask_filename: spec::ASK.default_filename.to_string(),
            voice_audio: None,
            voice_filename: spec::VOICE_DEFAULT_FILENAME.to_string(),
        }
    }
}

/// Outcome of the most recent action, rendered inline under the form.
pub enum Feedback {
    /// A pipeline ran to completion (possibly degraded or with a failed save).
    Report(RunReport),
    /// Validation rejected the input; nothing happened.
    Rejected(String),
    /// The run aborted (transcription failure, spool failure).
    Failed(String),
}

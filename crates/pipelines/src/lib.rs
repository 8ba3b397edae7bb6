//! The request dispatch and persistence pipeline.
//!
//! All five modes run the same state machine: validate the form input,
//! dispatch a role-structured prompt to the completion endpoint, persist the
//! result as an artifact, and append one history record. The per-mode
//! differences (system instruction, input fields, default filename, persist
//! policy) live in a [`spec::ModeSpec`] configuration record rather than in
//! five copies of the flow.

pub mod executor;
pub mod spec;

pub use executor::{
    run_text_pipeline, run_voice_pipeline, PipelineError, RunReport, TextRequest, VoiceRequest,
    WARNING_MARKER,
};
pub use spec::{text_mode_spec, FieldSpec, ModeSpec, PersistPolicy};

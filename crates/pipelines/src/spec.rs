//! Per-mode pipeline configuration.
//!
//! Each mode keeps its own system instruction, form fields, default filename
//! and persistence policy; everything else about the flow is shared.

use shared::history::Mode;

/// Whether a run always persists its result or only when the user opted in
/// by naming a target file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistPolicy {
    Always,
    WhenNamed,
}

/// One required text input on a mode's form.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    /// Form label.
    pub label: &'static str,
    /// Literal prefix inserted before this field's value when composing the
    /// user message.
    pub prefix: Option<&'static str>,
    /// User-facing rejection message when the field is blank.
    pub missing: &'static str,
}

/// Configuration record for one mode's pipeline.
#[derive(Debug, Clone, Copy)]
pub struct ModeSpec {
    pub mode: Mode,
    pub system_prompt: &'static str,
    pub temperature: f32,
    pub fields: &'static [FieldSpec],
    /// Index of the field recorded as the history prompt.
    pub history_field: usize,
    pub default_filename: &'static str,
    pub required_ext: &'static str,
    pub persist: PersistPolicy,
}

impl ModeSpec {
    /// Concatenate field values into the single user message.
    pub fn compose_user_content(&self, values: &[String]) -> String {
        let mut out = String::new();
        for (field, value) in self.fields.iter().zip(values) {
            if let Some(prefix) = field.prefix {
                out.push_str(prefix);
            }
            out.push_str(value);
        }
        out
    }
}

pub const BUILD: ModeSpec = ModeSpec {
    mode: Mode::Build,
    system_prompt:
        "You are a helpful software engineer. Return only runnable code unless asked otherwise.",
    temperature: 0.2,
    fields: &[FieldSpec {
        label: "Describe the software to build",
        prefix: None,
        missing: "Please describe what to build.",
    }],
    history_field: 0,
    default_filename: "app.py",
    required_ext: ".py",
    persist: PersistPolicy::Always,
};

pub const MODIFY: ModeSpec = ModeSpec {
    mode: Mode::Modify,
    system_prompt: "You are a senior software engineer. Transform the provided code according to the request. Return only the full updated code.",
    temperature: 0.2,
    fields: &[
        FieldSpec {
            label: "Paste your existing code here",
            prefix: Some("Original code:\n\n"),
            missing: "Please paste the code to modify.",
        },
        FieldSpec {
            label: "Describe the changes or new features",
            prefix: Some("\n\nChange request:\n"),
            missing: "Please describe the changes you want.",
        },
    ],
    history_field: 1,
    default_filename: "updated_app.py",
    required_ext: ".py",
    persist: PersistPolicy::Always,
};

pub const EDIT: ModeSpec = ModeSpec {
    mode: Mode::Edit,
    system_prompt: "You are a precise editor. Apply the requested changes faithfully. Return only the edited content.",
    temperature: 0.2,
    fields: &[
        FieldSpec {
            label: "Paste any text or code to edit",
            prefix: Some("Content:\n\n"),
            missing: "Please paste the content to edit.",
        },
        FieldSpec {
            label: "Describe the edit",
            prefix: Some("\n\nEdit request:\n"),
            missing: "Please describe the edit you want.",
        },
    ],
    history_field: 1,
    default_filename: "edited.txt",
    required_ext: ".txt",
    persist: PersistPolicy::Always,
};

pub const ASK: ModeSpec = ModeSpec {
    mode: Mode::Ask,
    system_prompt: "You are a helpful, factual assistant. Provide clear, concise answers. If a calculation depends on live data, explain the method and give an approximate answer.",
    temperature: 0.0,
    fields: &[FieldSpec {
        label: "Ask anything (facts, time zones, currency, how-to, etc.)",
        prefix: None,
        missing: "Please enter your question.",
    }],
    history_field: 0,
    default_filename: "answer.txt",
    required_ext: ".txt",
    persist: PersistPolicy::WhenNamed,
};

/// Voice is two-stage (transcribe, then respond) and does not fit the text
/// form shape, so it carries its own constants instead of a ModeSpec.
pub const VOICE_SYSTEM_PROMPT: &str =
    "You are a helpful assistant. Respond clearly and concisely to the user's transcribed voice request.";
pub const VOICE_TEMPERATURE: f32 = 0.2;
pub const VOICE_DEFAULT_FILENAME: &str = "transcript.txt";
pub const VOICE_REQUIRED_EXT: &str = ".txt";
pub const VOICE_MISSING_AUDIO: &str = "Please upload an audio file.";

/// Spec for the four single-shot text modes. Voice runs through
/// [`crate::run_voice_pipeline`] instead.
pub fn text_mode_spec(mode: Mode) -> Option<&'static ModeSpec> {
    match mode {
        Mode::Build => Some(&BUILD),
        Mode::Modify => Some(&MODIFY),
        Mode::Edit => Some(&EDIT),
        Mode::Ask => Some(&ASK),
        Mode::Voice => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compose_user_content_applies_prefixes() {
        let values = vec!["print(1)".to_string(), "add logging".to_string()];
        let content = MODIFY.compose_user_content(&values);
        assert_eq!(
            content,
            "Original code:\n\nprint(1)\n\nChange request:\nadd logging"
        );
    }

    #[test]
    fn test_single_field_modes_pass_value_through() {
        let values = vec!["what time is it in New York?".to_string()];
        assert_eq!(
            ASK.compose_user_content(&values),
            "what time is it in New York?"
        );
    }

    #[test]
    fn test_every_text_mode_has_a_spec() {
        for mode in Mode::all() {
            let spec = text_mode_spec(*mode);
            match mode {
                Mode::Voice => assert!(spec.is_none()),
                _ => {
                    let spec = spec.unwrap();
                    assert_eq!(spec.mode, *mode);
                    assert!(!spec.fields.is_empty());
                    assert!(spec.history_field < spec.fields.len());
                    assert!(spec.default_filename.ends_with(spec.required_ext));
                }
            }
        }
    }

    #[test]
    fn test_ask_is_deterministic_and_opt_in() {
        assert_eq!(ASK.temperature, 0.0);
        assert_eq!(ASK.persist, PersistPolicy::WhenNamed);
    }
}

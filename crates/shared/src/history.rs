//! Session history: an ordered, append-only log of completed pipeline runs.
//!
//! The presentation layer owns the [`SessionContext`] and hands it `&mut` to
//! each pipeline run. The UI only ever iterates; pipelines only ever append.

use chrono::Local;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// The five assistant modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mode {
    Build,
    Modify,
    Edit,
    Ask,
    Voice,
}

impl Mode {
    pub fn all() -> &'static [Mode] {
        &[Mode::Build, Mode::Modify, Mode::Edit, Mode::Ask, Mode::Voice]
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Mode::Build => "Build Code",
            Mode::Modify => "Modify Code",
            Mode::Edit => "Edit Anything",
            Mode::Ask => "Ask Anything",
            Mode::Voice => "Voice",
        }
    }
}

/// Record of one completed pipeline run.
///
/// Created exactly once, after the persisting step succeeds. Immutable from
/// then on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub mode: Mode,
    /// The primary user request (for Modify/Edit this is the change/edit
    /// request, not the pasted source).
    pub prompt: String,
    /// Filename as the user typed it, before sanitizing.
    pub filename: String,
    /// Where the artifact landed, when one was saved.
    pub path: Option<PathBuf>,
    /// Local wall-clock time, second precision.
    pub timestamp: String,
}

impl HistoryRecord {
    pub fn new(
        mode: Mode,
        prompt: impl Into<String>,
        filename: impl Into<String>,
        path: Option<PathBuf>,
    ) -> Self {
        Self {
            mode,
            prompt: prompt.into(),
            filename: filename.into(),
            path,
            timestamp: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }

    /// Short prompt preview for the sidebar.
    pub fn prompt_preview(&self, max_chars: usize) -> String {
        let mut preview: String = self.prompt.chars().take(max_chars).collect();
        if self.prompt.chars().count() > max_chars {
            preview.push_str("...");
        }
        preview
    }
}

/// Per-session run log. Records are kept in completion order; rendering
/// newest-first is the sidebar's concern.
#[derive(Debug, Default)]
pub struct SessionContext {
    records: Vec<HistoryRecord>,
}

impl SessionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, record: HistoryRecord) {
        self.records.push(record);
    }

    pub fn records(&self) -> &[HistoryRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

//! Filename sanitizing for user-supplied artifact names.

use regex::Regex;
use std::sync::LazyLock;

/// Base name used when the user supplies nothing usable.
pub const DEFAULT_STEM: &str = "artifact";

static UNSAFE_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9_\-.]").expect("valid regex"));

/// Normalize a user-supplied name into a safe, extension-correct filename.
///
/// Blank input yields `DEFAULT_STEM` plus `required_ext`. Otherwise the name
/// is trimmed, every character outside `[A-Za-z0-9_-.]` becomes `_`, and
/// `required_ext` is appended unless already present. Pure and total.
pub fn sanitize(name: &str, required_ext: &str) -> String {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return format!("{DEFAULT_STEM}{required_ext}");
    }
    let mut safe = UNSAFE_CHARS.replace_all(trimmed, "_").into_owned();
    if !safe.ends_with(required_ext) {
        safe.push_str(required_ext);
    }
    safe
}

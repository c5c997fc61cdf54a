//! Internal helpers for input validation and normalization.
//!
//! These utilities are **not** part of the public API. They centralize
//! validation so every entry point enforces the same rules.

use unicode_normalization::{UnicodeNormalization, char::is_combining_mark};

use crate::{EngineError, ResultEngine};

/// Reject empty owner ids: every row is scoped by owner.
pub(crate) fn require_owner(owner_id: &str) -> ResultEngine<&str> {
    let trimmed = owner_id.trim();
    if trimmed.is_empty() {
        return Err(EngineError::Validation("owner id must not be empty".to_string()));
    }
    Ok(trimmed)
}

/// Trim a required name and collapse inner whitespace.
pub(crate) fn normalize_required_name(value: &str, label: &str) -> ResultEngine<String> {
    let collapsed = value.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        return Err(EngineError::Validation(format!(
            "{label} name must not be empty"
        )));
    }
    Ok(collapsed)
}

/// Comparison key for names: NFKD, no combining marks, lowercase, punctuation
/// folded into single spaces. "Café", "cafe" and " CAFE " share a key.
pub(crate) fn normalize_name_key(display: &str) -> String {
    let mut out = String::new();
    let mut prev_space = false;
    for ch in display.nfkd() {
        if is_combining_mark(ch) {
            continue;
        }
        if ch.is_alphanumeric() {
            out.extend(ch.to_lowercase());
            prev_space = false;
        } else if !out.is_empty() && !prev_space {
            out.push(' ');
            prev_space = true;
        }
    }
    out.trim_end().to_string()
}

/// Comparison key of a registry name (wallet or category). A name without
/// any letter or digit has no key and is rejected.
pub(crate) fn require_name_key(display: &str, label: &str) -> ResultEngine<String> {
    let key = normalize_name_key(display);
    if key.is_empty() {
        return Err(EngineError::Validation(format!(
            "{label} name must contain a letter or a digit"
        )));
    }
    Ok(key)
}

/// Trim a description and enforce the configured length bound (in characters).
pub(crate) fn normalize_description(value: &str, max_len: usize) -> ResultEngine<String> {
    let trimmed = value.trim();
    let len = trimmed.chars().count();
    if len > max_len {
        return Err(EngineError::Validation(format!(
            "description is {len} characters long, the limit is {max_len}"
        )));
    }
    Ok(trimmed.to_string())
}

//! Prompt normalization.
//!
//! Every generation request goes through [`normalize`], which guarantees the
//! LoRA trigger token is present in the prompt sent upstream. The user's
//! original text is kept separately for the gallery.

use crate::{MemeError, MemeResult};

/// Trigger token the image model was fine-tuned on.
pub const TRIGGER: &str = "ralphwiggum";

/// Standalone tokens rewritten to [`TRIGGER`], applied in order.
const ALIASES: [&str; 2] = ["ralph", "wiggum"];

/// Normalize raw user text into a generation prompt.
///
/// Whole-word, case-insensitive occurrences of `ralph` and `wiggum` become
/// the trigger token; if the trigger is still absent it is prepended.
/// Never fails.
///
/// ```
/// use meme_core::prompt::normalize;
///
/// assert_eq!(
///     normalize("a picture of ralph eating paste"),
///     "a picture of ralphwiggum eating paste"
/// );
/// assert_eq!(normalize("a cat"), "ralphwiggum a cat");
/// ```
#[must_use]
pub fn normalize(raw: &str) -> String {
    let mut result = raw.to_string();
    for alias in ALIASES {
        result = replace_word(&result, alias, TRIGGER);
    }

    if result.to_lowercase().contains(TRIGGER) {
        result
    } else {
        format!("{TRIGGER} {result}")
    }
}

/// Reject blank prompts before any request is made.
///
/// # Errors
///
/// Returns [`MemeError::EmptyPrompt`] if `raw` is empty or whitespace only.
pub fn validate_prompt(raw: &str) -> MemeResult<&str> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(MemeError::EmptyPrompt);
    }
    Ok(trimmed)
}

/// Word characters for boundary detection (`[A-Za-z0-9_]`).
fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// Replace every whole-word, ASCII case-insensitive occurrence of `word`.
fn replace_word(haystack: &str, word: &str, replacement: &str) -> String {
    let bytes = haystack.as_bytes();
    let needle = word.as_bytes();
    let mut out = String::with_capacity(haystack.len());
    let mut copied = 0;
    let mut i = 0;

    while i + needle.len() <= bytes.len() {
        let end = i + needle.len();
        let starts_word = i == 0 || !is_word_byte(bytes[i - 1]);
        let ends_word = end == bytes.len() || !is_word_byte(bytes[end]);

        if starts_word && ends_word && bytes[i..end].eq_ignore_ascii_case(needle) {
            // Match bounds are ASCII, so both slice points are char boundaries.
            out.push_str(&haystack[copied..i]);
            out.push_str(replacement);
            copied = end;
            i = end;
        } else {
            i += 1;
        }
    }

    out.push_str(&haystack[copied..]);
    out
}

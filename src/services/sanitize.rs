//! Input/output text filters.
//!
//! Input is reduced to an explicit character allow-list and hard-capped;
//! model output has `<script>` and `<iframe>` blocks replaced with neutral
//! placeholders before it reaches the caller or the history log.

use std::sync::OnceLock;

use regex::Regex;

use crate::config::MAX_INPUT_LENGTH;

const INPUT_PUNCTUATION: &str = ".,!?()-:;@#$%^&*";

fn allowed_input_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c.is_whitespace() || INPUT_PUNCTUATION.contains(c)
}

/// Trim, strip everything outside the allow-list, and cap at
/// [`MAX_INPUT_LENGTH`] characters.
pub fn sanitize_input(input: &str) -> String {
    input
        .trim()
        .chars()
        .filter(|&c| allowed_input_char(c))
        .take(MAX_INPUT_LENGTH)
        .collect()
}

fn script_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?is)<script\b[^>]*>.*?</script>").expect("valid pattern"))
}

fn iframe_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?is)<iframe\b[^>]*>.*?</iframe>").expect("valid pattern"))
}

/// Strip script/iframe blocks from model output, case-insensitively, each
/// replaced with a visible placeholder.
pub fn sanitize_output(response: &str) -> String {
    let cleaned = script_re().replace_all(response, "[script removed]");
    iframe_re().replace_all(&cleaned, "[iframe removed]").into_owned()
}

// Input validation for values that end up on a command line

use crate::error::CommandError;
use regex::Regex;
use std::sync::LazyLock;

/// Owners, repositories, branch names and numeric ids: ASCII word characters,
/// hyphen, dot and slash, nothing else.
static IDENTIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_\-./]+$").expect("identifier pattern is valid"));

/// Check an identifier against the allowed-character pattern.
///
/// Returns the input unchanged when it matches in its entirety; any other
/// character (shell metacharacters, quotes, whitespace, non-ASCII) rejects it.
pub fn sanitize_identifier(value: &str) -> Result<&str, CommandError> {
    if IDENTIFIER.is_match(value) {
        Ok(value)
    } else {
        Err(CommandError::InvalidInput(value.to_string()))
    }
}

/// Escape `\` and `"` so the text can sit inside a double-quoted segment.
pub fn escape_quotes(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if c == '"' || c == '\\' {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

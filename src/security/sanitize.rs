//! Best-effort cleaning of free-text input before it reaches an external
//! collaborator. Never fails; always returns a cleaned string.

/// Strips all markup from `input` and truncates to `max_length` characters.
///
/// Tags are removed entirely, not escaped. The contents of `<script>` and
/// `<style>` elements are dropped along with the tags, since leaked script
/// bodies are as dangerous as the tags themselves. Unterminated tags swallow
/// the rest of the input, matching how sanitizing parsers treat them.
pub fn sanitize_text(input: &str, max_length: Option<usize>) -> String {
    let mut out = String::with_capacity(input.len().min(4096));
    let mut rest = input;

    while let Some(open) = rest.find('<') {
        out.push_str(&rest[..open]);
        rest = &rest[open..];

        // Drop script/style element content entirely
        let skip_to = if starts_with_ci(rest, "<script") {
            find_ci(rest, "</script").and_then(|i| rest[i..].find('>').map(|j| i + j + 1))
        } else if starts_with_ci(rest, "<style") {
            find_ci(rest, "</style").and_then(|i| rest[i..].find('>').map(|j| i + j + 1))
        } else {
            rest.find('>').map(|i| i + 1)
        };

        match skip_to {
            Some(end) => rest = &rest[end..],
            None => {
                rest = "";
            }
        }
    }
    out.push_str(rest);

    if let Some(max) = max_length {
        if out.chars().count() > max {
            out = out.chars().take(max).collect();
        }
    }
    out
}

fn starts_with_ci(s: &str, prefix: &str) -> bool {
    s.len() >= prefix.len() && s.as_bytes()[..prefix.len()].eq_ignore_ascii_case(prefix.as_bytes())
}

// Byte-wise ASCII case-insensitive search. A match consists of ASCII bytes
// only, so the returned index is always a char boundary.
fn find_ci(haystack: &str, needle: &str) -> Option<usize> {
    if haystack.len() < needle.len() {
        return None;
    }
    haystack
        .as_bytes()
        .windows(needle.len())
        .position(|w| w.eq_ignore_ascii_case(needle.as_bytes()))
}

/// Sanitizes any JSON value: non-string values are coerced to their textual
/// representation first.
pub fn sanitize_value(value: &serde_json::Value, max_length: Option<usize>) -> String {
    match value.as_str() {
        Some(s) => sanitize_text(s, max_length),
        None => sanitize_text(&value.to_string(), max_length),
    }
}

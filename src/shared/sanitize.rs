//! Log-safe rendering of caller-supplied strings.

const MAX_LOG_FIELD_LEN: usize = 200;

/// Strip control whitespace that could forge log lines and cap the length.
pub fn sanitize_for_log(input: &str) -> String {
    input
        .trim()
        .chars()
        .filter(|c| !matches!(c, '\r' | '\n' | '\t'))
        .take(MAX_LOG_FIELD_LEN)
        .collect()
}

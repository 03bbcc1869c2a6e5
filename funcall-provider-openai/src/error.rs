//! Mapping HTTP/reqwest errors to [`CompletionError`].

use std::time::Duration;

use funcall_types::CompletionError;

/// Map an HTTP status code from the chat completions API to a
/// [`CompletionError`].
///
/// Reference: <https://platform.openai.com/docs/guides/error-codes>
pub(crate) fn map_http_status(status: reqwest::StatusCode, body: &str) -> CompletionError {
    match status.as_u16() {
        401 | 403 => CompletionError::Authentication(body.to_string()),
        400 | 404 => CompletionError::InvalidRequest(body.to_string()),
        429 => CompletionError::RateLimit {
            retry_after: parse_retry_after(body),
        },
        500 | 502 | 503 => CompletionError::ServiceUnavailable(body.to_string()),
        _ => CompletionError::InvalidRequest(format!("HTTP {status}: {body}")),
    }
}

/// Best-effort parse of "retry after N seconds" from an error body.
fn parse_retry_after(body: &str) -> Option<Duration> {
    let lower = body.to_lowercase();
    let idx = lower.find("retry after ")?;
    let digits: String = lower[idx + 12..]
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse::<u64>().ok().map(Duration::from_secs)
}

/// Map a [`reqwest::Error`] to a [`CompletionError`].
pub(crate) fn map_reqwest_error(err: reqwest::Error) -> CompletionError {
    if err.is_timeout() {
        CompletionError::Timeout(Duration::from_secs(30))
    } else {
        CompletionError::Network(Box::new(err))
    }
}

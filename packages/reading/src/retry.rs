//! HTTP retry helpers for transient errors.
//!
//! Upstream fetches go through [`send_json`] instead of calling
//! `reqwest::RequestBuilder::send()` directly, so every request gets
//! retried with exponential backoff on timeouts, connection resets,
//! rate limiting, and server errors.
//!
//! ```ignore
//! let body = retry::send_json(|| client.get(&url).query(&params), 2).await?;
//! ```

use std::time::Duration;

use crate::ReadingError;

/// Delay before the first retry; doubles on each subsequent attempt.
const BASE_DELAY_MS: u64 = 500;

/// Maximum length of the response body preview included in error logs.
const BODY_PREVIEW_LEN: usize = 300;

/// Sends an HTTP request and parses the response body as JSON.
///
/// The `build_request` closure is called on each attempt to construct a
/// fresh [`reqwest::RequestBuilder`] (builders are consumed by
/// `.send()`).
///
/// Retries up to `max_retries` times on connection errors, timeouts,
/// HTTP 429, and HTTP 5xx. HTTP 4xx (other than 429) is permanent. When
/// the upstream explains a failure with a JSON `reason` field, the
/// reason is carried in the error message.
///
/// # Errors
///
/// Returns [`ReadingError::Transport`] if the request fails after all
/// retries or the server returns a non-retryable status, and
/// [`ReadingError::Json`] if the body is not valid JSON.
#[allow(clippy::future_not_send)]
pub async fn send_json<F>(
    build_request: F,
    max_retries: u32,
) -> Result<serde_json::Value, ReadingError>
where
    F: Fn() -> reqwest::RequestBuilder,
{
    let response = send_inner(&build_request, max_retries).await?;
    let url = response.url().to_string();
    let status = response.status();

    let text = response.text().await.map_err(|e| ReadingError::Transport {
        message: format!("failed to read response body from {url}: {e}"),
    })?;

    serde_json::from_str(&text).map_err(|e| {
        log::error!(
            "JSON parse failed\n  url: {url}\n  status: {status}\n  body preview: {}",
            preview(&text)
        );
        ReadingError::Json(e)
    })
}

/// Core retry loop. Returns the successful [`reqwest::Response`].
#[allow(clippy::future_not_send)]
async fn send_inner<F>(
    build_request: &F,
    max_retries: u32,
) -> Result<reqwest::Response, ReadingError>
where
    F: Fn() -> reqwest::RequestBuilder,
{
    let mut last_error: Option<ReadingError> = None;

    for attempt in 0..=max_retries {
        if attempt > 0 {
            let delay = backoff(attempt);
            log::warn!("  retry {attempt}/{max_retries} in {delay:?}...");
            tokio::time::sleep(delay).await;
        }

        match build_request().send().await {
            Err(e) => {
                if is_transient(&e) && attempt < max_retries {
                    log::warn!("  transient error: {e}");
                    last_error = Some(ReadingError::Http(e));
                    continue;
                }
                return Err(ReadingError::Transport {
                    message: e.to_string(),
                });
            }
            Ok(response) => {
                let status = response.status();

                if status == reqwest::StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
                    if attempt < max_retries {
                        log::warn!("  HTTP {status} from {}", response.url());
                        last_error = Some(ReadingError::Transport {
                            message: format!("HTTP {status}"),
                        });
                        continue;
                    }
                    return Err(ReadingError::Transport {
                        message: format!("HTTP {status} after {max_retries} retries"),
                    });
                }

                if !status.is_success() {
                    let body = response.text().await.unwrap_or_default();
                    let message = upstream_reason(&body).map_or_else(
                        || format!("HTTP {status}"),
                        |reason| format!("HTTP {status}: {reason}"),
                    );
                    return Err(ReadingError::Transport { message });
                }

                return Ok(response);
            }
        }
    }

    Err(last_error.unwrap_or_else(|| ReadingError::Transport {
        message: "request failed after all retries".to_string(),
    }))
}

/// Exponential backoff: 500ms, 1s, 2s, ...
fn backoff(attempt: u32) -> Duration {
    Duration::from_millis(BASE_DELAY_MS << (attempt - 1).min(6))
}

/// Extracts the `reason` string from an upstream JSON error body such as
/// `{"error": true, "reason": "Parameter 'start_date' is out of range"}`.
fn upstream_reason(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value
        .get("reason")
        .and_then(serde_json::Value::as_str)
        .map(str::to_string)
}

fn preview(text: &str) -> &str {
    if text.len() <= BODY_PREVIEW_LEN {
        return text;
    }
    let mut end = BODY_PREVIEW_LEN;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

/// Returns `true` if the error is likely transient and worth retrying.
///
/// Builder and other request-construction errors are permanent: every
/// attempt builds the same URL and query.
fn is_transient(e: &reqwest::Error) -> bool {
    e.is_timeout() || e.is_connect() || e.is_body()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles() {
        assert_eq!(backoff(1), Duration::from_millis(500));
        assert_eq!(backoff(2), Duration::from_millis(1000));
        assert_eq!(backoff(3), Duration::from_millis(2000));
    }

    #[test]
    fn extracts_upstream_reason() {
        let body = r#"{"error":true,"reason":"Latitude must be in range of -90 to 90°."}"#;
        assert_eq!(
            upstream_reason(body).as_deref(),
            Some("Latitude must be in range of -90 to 90°.")
        );
        assert_eq!(upstream_reason("<html>bad gateway</html>"), None);
        assert_eq!(upstream_reason(r#"{"error":true}"#), None);
    }

    #[tokio::test]
    async fn malformed_url_is_not_retried() {
        let client = reqwest::Client::new();
        let err = client.get("http://[::1").send().await.unwrap_err();
        assert!(!is_transient(&err));

        let started = std::time::Instant::now();
        let err = send_json(|| client.get("http://[::1"), 3).await.unwrap_err();
        assert!(matches!(err, ReadingError::Transport { .. }));
        assert!(started.elapsed() < Duration::from_millis(BASE_DELAY_MS));
    }

    #[test]
    fn preview_respects_char_boundaries() {
        let text = "µ".repeat(BODY_PREVIEW_LEN);
        let cut = preview(&text);
        assert!(cut.len() <= BODY_PREVIEW_LEN);
        assert!(text.starts_with(cut));
        assert_eq!(preview("short"), "short");
    }
}

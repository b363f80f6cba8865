use std::future::Future;
use std::time::Duration;

use crate::error::LlmError;

const BASE_BACKOFF_SECS: u64 = 1;
const MAX_BACKOFF_SHIFT: u32 = 6;

/// Parse the `Retry-After` header value as seconds, falling back to exponential backoff.
pub(crate) fn retry_delay(response: &reqwest::Response, attempt: u32) -> Duration {
    if let Some(val) = response.headers().get(reqwest::header::RETRY_AFTER)
        && let Ok(s) = val.to_str()
        && let Ok(secs) = s.trim().parse::<u64>()
    {
        return Duration::from_secs(secs);
    }
    backoff(attempt)
}

fn backoff(attempt: u32) -> Duration {
    Duration::from_secs(BASE_BACKOFF_SECS << attempt.min(MAX_BACKOFF_SHIFT))
}

/// Send a request, retrying up to `max_retries` times on 429 responses.
///
/// Returns the first non-429 response for the caller to inspect.
///
/// # Errors
///
/// Returns `LlmError::RateLimited` once all attempts are exhausted and
/// `LlmError::ConnectionFailure` when the request never reached the endpoint.
pub(crate) async fn send_with_retry<F, Fut>(
    endpoint: &str,
    max_retries: u32,
    mut f: F,
) -> Result<reqwest::Response, LlmError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<reqwest::Response, reqwest::Error>>,
{
    for attempt in 0..=max_retries {
        let response = f().await.map_err(|source| LlmError::ConnectionFailure {
            endpoint: endpoint.to_owned(),
            source,
        })?;

        if response.status() != reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Ok(response);
        }
        if attempt == max_retries {
            break;
        }

        let delay = retry_delay(&response, attempt);
        tracing::warn!(
            endpoint,
            attempt = attempt + 1,
            max_retries,
            delay_secs = delay.as_secs(),
            "rate limited, retrying"
        );
        tokio::time::sleep(delay).await;
    }

    Err(LlmError::RateLimited {
        endpoint: endpoint.to_owned(),
    })
}

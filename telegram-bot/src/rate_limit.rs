//! Retry wrapper for outbound chat requests (spec.md §4.2.4, §5
//! "Cancellation and timeouts"). The transport's own limiter is the main
//! serialization point; this wrapper only handles the explicit
//! rate-limit-exceeded signal and a bounded retry for un-hinted 429s.

use std::time::Duration;
use teloxide::RequestError;

const MAX_RETRIES: u32 = 5;
const BASE_BACKOFF_MS: u64 = 500;

/// Runs `attempt` (typically `.send().await` on a teloxide request),
/// retrying on `RetryAfter` (suspending for the hinted duration) and on
/// transient network errors (exponential backoff), up to `MAX_RETRIES`.
/// Any other error propagates immediately.
pub async fn with_retry<T, F, Fut>(mut attempt: F) -> Result<T, RequestError>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, RequestError>>,
{
    let mut retries = 0u32;
    loop {
        match attempt().await {
            Ok(value) => return Ok(value),
            Err(RequestError::RetryAfter(seconds)) => {
                retries += 1;
                if retries > MAX_RETRIES {
                    tracing::warn!("exceeded retry cap waiting on rate-limit hints");
                    return Err(RequestError::RetryAfter(seconds));
                }
                let wait = Duration::from(seconds);
                tracing::debug!(?wait, retries, "rate limited, suspending");
                tokio::time::sleep(wait).await;
            }
            Err(RequestError::Network(e)) => {
                retries += 1;
                if retries > MAX_RETRIES {
                    return Err(RequestError::Network(e));
                }
                let backoff = Duration::from_millis(BASE_BACKOFF_MS * 2u64.pow(retries - 1));
                tracing::debug!(?backoff, retries, "transient network error, backing off");
                tokio::time::sleep(backoff).await;
            }
            Err(other) => return Err(other),
        }
    }
}

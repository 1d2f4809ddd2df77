use std::fmt::Display;
use std::time::Duration;
use tokio::time::sleep;
use tracing::warn;

/// Delay used once the base schedule is exhausted.
const FINAL_DELAY_SECS: u64 = 10;

/// Retry an async operation with a fixed backoff schedule.
///
/// The operation is attempted `base_delays.len() + final_retries` times
/// (at least once even for an empty schedule). Between attempts it sleeps
/// the next entry of `base_delays`, falling back to ten seconds once the
/// schedule runs out. The last error is returned if every attempt fails.
pub async fn retry_with_backoff<F, Fut, T, E>(
    mut operation: F,
    base_delays: &[u64],
    final_retries: usize,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
    E: Display,
{
    let total_attempts = (base_delays.len() + final_retries).max(1);
    let mut attempt = 1_usize;

    loop {
        match operation().await {
            Ok(result) => return Ok(result),
            Err(e) => {
                if attempt >= total_attempts {
                    return Err(e);
                }
                let delay_secs = base_delays
                    .get(attempt - 1)
                    .copied()
                    .unwrap_or(FINAL_DELAY_SECS);
                warn!(
                    "Request failed (attempt {attempt}/{total_attempts}): {e}. Retrying after {delay_secs}s..."
                );
                sleep(Duration::from_secs(delay_secs)).await;
                attempt += 1;
            }
        }
    }
}

//! Caller-level retry with exponential back-off and jitter.
//!
//! The pipeline never retries on its own. Each retry here re-invokes the
//! whole operation. An unseeded generation retry draws a fresh sample; with
//! `--seed` every attempt samples the same responses and sends the same prompt.

use std::future::Future;
use std::time::Duration;

use vcode_codeframe::CodeframeError;

const MAX_DELAY_MS: u64 = 60_000;

/// Runs `operation` with up to `max_retries` additional attempts while the
/// error is [`CodeframeError::is_retryable`].
///
/// Back-off schedule with `backoff_base_ms = 1_000`:
///
/// | Attempt | Sleep before next attempt    |
/// |---------|------------------------------|
/// | 1       | 1 000 ms × 2⁰ ± 25 % jitter |
/// | 2       | 1 000 ms × 2¹ ± 25 % jitter |
/// | 3       | 1 000 ms × 2² ± 25 % jitter |
///
/// Delay is capped at 60 s.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    label: &str,
    max_retries: u32,
    backoff_base_ms: u64,
    mut operation: F,
) -> Result<T, CodeframeError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, CodeframeError>>,
{
    let mut attempt = 0u32;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !err.is_retryable() || attempt >= max_retries {
                    return Err(err);
                }
                attempt += 1;
                let delay_ms = backoff_delay_ms(backoff_base_ms, attempt);
                tracing::warn!(
                    label,
                    attempt,
                    max_retries,
                    delay_ms,
                    error = %err,
                    "retryable failure, backing off"
                );
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }
        }
    }
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn backoff_delay_ms(backoff_base_ms: u64, attempt: u32) -> u64 {
    let computed = backoff_base_ms.saturating_mul(1u64 << attempt.saturating_sub(1).min(10));
    let capped = computed.min(MAX_DELAY_MS);
    (capped as f64 * (rand::random::<f64>() * 0.5 + 0.75)) as u64
}

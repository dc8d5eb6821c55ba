//! Retry logic with exponential backoff for transient apply errors.

use crate::context::RetryCallback;
use crate::error::ApplyError;
use crate::types::RetryConfig;
use std::thread;

/// Execute an operation with retry logic.
///
/// Retries the operation while it returns [`ApplyError::Retryable`], using
/// exponential backoff between attempts. Fatal errors are returned at once.
///
/// # Returns
/// The result of the operation, or the last error if all attempts failed.
pub fn with_retry<T, F>(
    config: &RetryConfig,
    callback: Option<&dyn RetryCallback>,
    mut operation: F,
) -> Result<T, ApplyError>
where
    F: FnMut() -> Result<T, ApplyError>,
{
    let max_attempts = config.max_attempts.max(1);
    let mut last_error: Option<ApplyError> = None;

    for attempt in 0..max_attempts {
        match operation() {
            Ok(result) => return Ok(result),
            Err(e) => {
                if !e.is_retryable() {
                    return Err(e);
                }

                if attempt + 1 >= max_attempts {
                    last_error = Some(e);
                    break;
                }

                let delay = config.delay_for_attempt(attempt);
                if let Some(cb) = callback {
                    cb.on_retry(attempt + 1, max_attempts, &e, delay.as_secs_f64());
                }

                thread::sleep(delay);
                last_error = Some(e);
            }
        }
    }

    Err(last_error.unwrap_or_else(|| ApplyError::fatal("retry exhausted")))
}

//! Retry of transient UI failures.

use std::future::Future;

use flowscribe_protocols::ExtractionError;
use tracing::warn;

/// Run `operation`, retrying up to `max_retries` times while it fails with a
/// transient error. The closure receives the attempt number, starting at 0,
/// so callers can lengthen their settle delay on retries.
pub async fn retry_transient<F, Fut, T>(
    what: &str,
    max_retries: u32,
    mut operation: F,
) -> Result<T, ExtractionError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, ExtractionError>>,
{
    let mut attempt = 0;
    loop {
        match operation(attempt).await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_transient() && attempt < max_retries => {
                warn!(
                    "{} failed (attempt {}/{}): {}, retrying",
                    what,
                    attempt + 1,
                    max_retries + 1,
                    e
                );
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    #[tokio::test]
    async fn test_succeeds_after_transient_failure() {
        let calls = AtomicU32::new(0);
        let result = retry_transient("select", 1, |attempt| {
            calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if attempt == 0 {
                    Err(ExtractionError::TransientUi("not yet".to_string()))
                } else {
                    Ok(attempt)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_retries() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = retry_transient("select", 1, |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(ExtractionError::TransientUi("never".to_string())) }
        })
        .await;

        assert!(result.unwrap_err().is_transient());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_does_not_retry_fatal_errors() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = retry_transient("select", 3, |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(ExtractionError::FatalSession("gone".to_string())) }
        })
        .await;

        assert!(result.unwrap_err().is_fatal());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}

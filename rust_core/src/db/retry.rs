//! Retry logic for transient store failures.
//!
//! Automatic retry with exponential backoff for store operations. Only
//! `Dependency` errors are retried; domain errors (NotFound, InvalidInput,
//! InvalidState) fail immediately.

use std::future::Future;
use std::time::Duration;
use tracing::warn;

use crate::error::EngineResult;

/// Execute a store operation with automatic retry on transient failures.
///
/// # Example
/// ```ignore
/// let fixture = execute_with_retry(|| store.get(sport, id), 3).await?;
/// ```
pub async fn execute_with_retry<F, Fut, T>(mut f: F, max_attempts: u32) -> EngineResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = EngineResult<T>>,
{
    execute_with_retry_custom(&mut f, max_attempts, 100, 5_000).await
}

/// Execute with retry and custom backoff configuration.
pub async fn execute_with_retry_custom<F, Fut, T>(
    mut f: F,
    max_attempts: u32,
    base_backoff_ms: u64,
    max_backoff_ms: u64,
) -> EngineResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = EngineResult<T>>,
{
    let mut attempt = 0;
    loop {
        attempt += 1;
        match f().await {
            Ok(result) => return Ok(result),
            Err(e) if attempt < max_attempts && e.is_retriable() => {
                let backoff_ms = (base_backoff_ms * 2_u64.pow(attempt - 1)).min(max_backoff_ms);
                warn!(
                    "Store operation failed (attempt {}/{}): {}. Retrying in {}ms",
                    attempt, max_attempts, e, backoff_ms
                );
                tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_retries_transient_failures() {
        let calls = Arc::new(AtomicU32::new(0));
        let calls2 = calls.clone();

        let result = execute_with_retry_custom(
            move || {
                let calls = calls2.clone();
                async move {
                    if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                        Err(EngineError::Dependency("store unreachable".into()))
                    } else {
                        Ok(42)
                    }
                }
            },
            5,
            1,
            10,
        )
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_domain_errors_fail_immediately() {
        let calls = Arc::new(AtomicU32::new(0));
        let calls2 = calls.clone();

        let result: EngineResult<()> = execute_with_retry_custom(
            move || {
                let calls = calls2.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err(EngineError::InvalidState("already stopped".into()))
                }
            },
            5,
            1,
            10,
        )
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let calls = Arc::new(AtomicU32::new(0));
        let calls2 = calls.clone();

        let result: EngineResult<()> = execute_with_retry_custom(
            move || {
                let calls = calls2.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err(EngineError::Dependency("still down".into()))
                }
            },
            3,
            1,
            10,
        )
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}

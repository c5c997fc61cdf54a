use std::future::Future;

use crate::{ResultEngine, RetryPolicy};

/// Runs `op` until it succeeds, fails with a non-transient error or runs out
/// of attempts. Waits `policy.delay_for(n)` between attempts.
pub(crate) async fn with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    label: &'static str,
    mut op: F,
) -> ResultEngine<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ResultEngine<T>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match op().await {
            Err(err) if err.is_transient() && attempt < max_attempts => {
                let delay = policy.delay_for(attempt);
                tracing::warn!(
                    op = label,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    "transient store failure, retrying: {err}"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            outcome => return outcome,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EngineError;

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            base_delay_ms: 0,
            max_delay_ms: 0,
        }
    }

    #[tokio::test]
    async fn retries_conflicts_until_success() {
        let mut calls = 0;
        let result = with_retry(&fast_policy(5), "test", || {
            calls += 1;
            let n = calls;
            async move {
                if n < 3 {
                    Err(EngineError::Conflict("busy".to_string()))
                } else {
                    Ok(n)
                }
            }
        })
        .await;
        assert_eq!(result, Ok(3));
        assert_eq!(calls, 3);
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts() {
        let mut calls = 0;
        let result: ResultEngine<()> = with_retry(&fast_policy(3), "test", || {
            calls += 1;
            async { Err(EngineError::Unavailable("down".to_string())) }
        })
        .await;
        assert_eq!(result, Err(EngineError::Unavailable("down".to_string())));
        assert_eq!(calls, 3);
    }

    #[tokio::test]
    async fn validation_errors_are_not_retried() {
        let mut calls = 0;
        let result: ResultEngine<()> = with_retry(&fast_policy(5), "test", || {
            calls += 1;
            async { Err(EngineError::Validation("bad".to_string())) }
        })
        .await;
        assert!(matches!(result, Err(EngineError::Validation(_))));
        assert_eq!(calls, 1);
    }
}

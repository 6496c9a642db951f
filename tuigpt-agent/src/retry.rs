//! Bounded retry with an interrupt escape hatch.

use std::future::Future;
use std::time::Duration;
use tuigpt_error::Error;

/// Retry attempts after the initial one during the handshake
pub const HANDSHAKE_RETRIES: usize = 5;
/// Pause between handshake attempts
pub const RETRY_DELAY: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts after the first; `retries + 1` calls at most
    pub retries: usize,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: HANDSHAKE_RETRIES,
            delay: RETRY_DELAY,
        }
    }
}

impl RetryPolicy {
    pub fn new(retries: usize) -> Self {
        Self {
            retries,
            ..Self::default()
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// Terminal failure of [`retry`]
#[derive(Debug)]
pub enum RetryError {
    /// Every attempt failed. A `RetriesExhausted` error whose source is the
    /// last failure, marked persistent.
    Exhausted(Error),
    /// The interrupt future completed first
    Interrupted,
}

impl RetryError {
    pub fn into_error(self, operation: &'static str) -> Error {
        match self {
            RetryError::Exhausted(err) => err.with_operation(operation),
            RetryError::Interrupted => Error::interrupted(operation),
        }
    }
}

/// Run `attempt` until it succeeds or `policy.retries` retries have failed.
///
/// `on_failure` sees every failed attempt (zero-based index) before the
/// next one starts. `interrupt` is raced against every attempt and every
/// pause; when it wins, nothing else runs.
pub async fn retry<T, A, Fut, I, F>(
    policy: RetryPolicy,
    interrupt: I,
    mut attempt: A,
    mut on_failure: F,
) -> Result<T, RetryError>
where
    A: FnMut() -> Fut,
    Fut: Future<Output = Result<T, Error>>,
    I: Future<Output = ()>,
    F: FnMut(usize, &Error),
{
    tokio::pin!(interrupt);
    let mut failures = 0;

    loop {
        let result = tokio::select! {
            biased;
            _ = &mut interrupt => return Err(RetryError::Interrupted),
            result = attempt() => result,
        };

        let err = match result {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };

        tracing::warn!(attempt = failures + 1, error = %err, "attempt failed");
        on_failure(failures, &err);

        if failures >= policy.retries {
            return Err(RetryError::Exhausted(Error::retries_exhausted(failures + 1, err.persist())));
        }
        failures += 1;

        if !policy.delay.is_zero() {
            tokio::select! {
                biased;
                _ = &mut interrupt => return Err(RetryError::Interrupted),
                _ = tokio::time::sleep(policy.delay) => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use tuigpt_error::{ErrorKind, ErrorStatus};

    fn no_delay(retries: usize) -> RetryPolicy {
        RetryPolicy::new(retries).with_delay(Duration::ZERO)
    }

    #[tokio::test]
    async fn test_success_after_failures() {
        let calls = Cell::new(0);
        let mut seen = Vec::new();

        let result = retry(
            no_delay(5),
            std::future::pending(),
            || {
                let n = calls.get() + 1;
                calls.set(n);
                async move {
                    if n < 3 {
                        Err(Error::new(ErrorKind::NetworkFailed, "connection reset"))
                    } else {
                        Ok("Ок")
                    }
                }
            },
            |index, _| seen.push(index),
        )
        .await;

        assert_eq!(result.unwrap(), "Ок");
        assert_eq!(calls.get(), 3);
        assert_eq!(seen, vec![0, 1]);
    }

    #[tokio::test]
    async fn test_exhaustion_after_one_plus_retries() {
        let calls = Cell::new(0);

        let result: Result<(), _> = retry(
            no_delay(5),
            std::future::pending(),
            || {
                calls.set(calls.get() + 1);
                async { Err(Error::config_invalid("malformed reply")) }
            },
            |_, _| {},
        )
        .await;

        assert_eq!(calls.get(), 6);
        match result {
            Err(RetryError::Exhausted(err)) => {
                assert_eq!(err.kind(), ErrorKind::RetriesExhausted);
                assert!(err.context().contains(&("attempts", "6".to_string())));
                assert!(err.context().contains(&("last_kind", "ConfigInvalid".to_string())));
            }
            other => panic!("expected exhaustion, got {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn test_retryable_error_becomes_persistent() {
        let result: Result<(), _> = retry(
            no_delay(0),
            std::future::pending(),
            || async { Err(Error::new(ErrorKind::NetworkFailed, "down")) },
            |_, _| {},
        )
        .await;

        let Err(RetryError::Exhausted(err)) = result else {
            panic!("expected exhaustion");
        };
        let last = err.source_ref().and_then(|source| source.downcast_ref::<Error>()).unwrap();
        assert_eq!(last.kind(), ErrorKind::NetworkFailed);
        assert_eq!(last.status(), ErrorStatus::Persistent);
    }

    #[test]
    fn test_into_error_names_operation() {
        let err = RetryError::Interrupted.into_error("session::handshake");
        assert_eq!(err.kind(), ErrorKind::Interrupted);
        assert_eq!(err.operation(), "session::handshake");

        let exhausted = Error::retries_exhausted(2, Error::config_invalid("bad"));
        let err = RetryError::Exhausted(exhausted).into_error("session::handshake");
        assert_eq!(err.kind(), ErrorKind::RetriesExhausted);
        assert_eq!(err.operation(), "session::handshake");
    }

    #[tokio::test]
    async fn test_interrupt_wins() {
        let polled = Cell::new(false);

        let result: Result<(), _> = retry(
            no_delay(5),
            async {},
            || {
                let polled = &polled;
                async move {
                    polled.set(true);
                    Ok(())
                }
            },
            |_, _| {},
        )
        .await;

        assert!(matches!(result, Err(RetryError::Interrupted)));
        assert!(!polled.get());
    }

    #[tokio::test]
    async fn test_interrupt_during_pause() {
        let calls = Cell::new(0);

        let result: Result<(), _> = retry(
            RetryPolicy::new(5).with_delay(Duration::from_secs(60)),
            tokio::time::sleep(Duration::from_millis(20)),
            || {
                calls.set(calls.get() + 1);
                async { Err(Error::new(ErrorKind::NetworkFailed, "down")) }
            },
            |_, _| {},
        )
        .await;

        assert!(matches!(result, Err(RetryError::Interrupted)));
        assert_eq!(calls.get(), 1);
    }
}

//! Caller-injected deadlines.

use std::future::Future;
use std::time::Duration;

use crate::error::PollyError;

/// Run a client call under a deadline.
///
/// The client imposes no deadline of its own beyond the transport timeout. When the
/// deadline elapses the call is dropped, which closes any response body it had open.
pub async fn with_deadline<T>(
    deadline: Duration,
    call: impl Future<Output = Result<T, PollyError>>,
) -> Result<T, PollyError> {
    match tokio::time::timeout(deadline, call).await {
        Ok(result) => result,
        Err(_) => {
            tracing::debug!(deadline_ms = deadline.as_millis() as u64, "Call deadline elapsed");
            Err(PollyError::Timeout(deadline.as_millis() as u64))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn elapsed_deadline_yields_timeout() {
        let result = with_deadline(Duration::from_millis(250), async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok::<_, PollyError>(())
        })
        .await;

        assert!(matches!(result, Err(PollyError::Timeout(250))));
    }

    #[tokio::test]
    async fn inner_errors_pass_through() {
        let result = with_deadline(Duration::from_secs(1), async {
            Err::<(), _>(PollyError::Parameter("bad".to_string()))
        })
        .await;

        assert!(matches!(result, Err(PollyError::Parameter(_))));
    }
}

use std::future::Future;
use std::time::Duration;

use crate::error::{CommerceError, CommerceResult};

/// Bound an upstream call; elapsing becomes a retryable `Upstream` error
pub(crate) async fn bounded<T>(
    limit: Duration,
    what: &'static str,
    call: impl Future<Output = CommerceResult<T>>,
) -> CommerceResult<T> {
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(call = what, timeout_ms = limit.as_millis() as u64, "Upstream call timed out");
            Err(CommerceError::Upstream(format!("{what} timed out")))
        }
    }
}

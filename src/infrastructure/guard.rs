//! Cancellation and timeout guard for external calls

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::domain::DomainError;

/// Run an external call for `stage` under the pipeline's token and timeout.
///
/// The token is checked before the call starts and raced against it while it
/// runs. An elapsed timeout reports as `Timeout { operation: stage }`.
pub async fn guarded<T, F>(
    stage: &str,
    timeout: Option<Duration>,
    cancel: &CancellationToken,
    call: F,
) -> Result<T, DomainError>
where
    F: Future<Output = Result<T, DomainError>>,
{
    if cancel.is_cancelled() {
        return Err(DomainError::cancelled(stage));
    }

    let bounded = async {
        match timeout {
            Some(limit) => tokio::time::timeout(limit, call)
                .await
                .map_err(|_| DomainError::timeout(stage))?,
            None => call.await,
        }
    };

    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(DomainError::cancelled(stage)),
        result = bounded => result,
    }
}

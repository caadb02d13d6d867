use std::future::Future;
use std::time::Duration;

/// Marker for an I/O call that outlived its deadline.
#[derive(Debug, Clone, Copy)]
pub struct TimedOut(pub Duration);

/// Runs `fut` under `limit`, folding an elapsed deadline into the caller's error type.
pub async fn with_timeout<T, E, F>(limit: Duration, fut: F) -> Result<T, E>
where
    F: Future<Output = Result<T, E>>,
    E: From<TimedOut>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(E::from(TimedOut(limit))),
    }
}

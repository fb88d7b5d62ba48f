use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::error::WorkerError;

/// Future returned by one pass of a worker loop.
pub type BoxWorkerFuture = Pin<Box<dyn Future<Output = Result<(), WorkerError>> + Send + 'static>>;

/// Shared handle to a worker.
pub type WorkerRef = Arc<dyn Worker>;

/// # Named, cancellable background loop.
///
/// [`spawn`](Worker::spawn) creates a fresh future for every pass, so a
/// worker that failed with a retryable error can be entered again.
/// Implementations should watch the token and return `Ok(())` or
/// [`WorkerError::Canceled`] promptly once it fires.
pub trait Worker: Send + Sync + 'static {
    /// Stable name used in events and logs.
    fn name(&self) -> &str;

    /// Starts one pass of the loop.
    fn spawn(&self, token: CancellationToken) -> BoxWorkerFuture;
}

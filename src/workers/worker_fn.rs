use std::borrow::Cow;
use std::future::Future;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::error::WorkerError;

use super::worker::{BoxWorkerFuture, Worker};

/// Closure-backed worker.
///
/// Wraps a closure that *creates* a new future per pass.
#[derive(Debug)]
pub struct WorkerFn<F> {
    name: Cow<'static, str>,
    f: F,
}

impl<F> WorkerFn<F> {
    pub fn new(name: impl Into<Cow<'static, str>>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }

    /// Creates the worker as a shared handle.
    ///
    /// ## Example
    /// ```rust
    /// use actionbus::{WorkerError, WorkerFn, WorkerRef};
    /// use tokio_util::sync::CancellationToken;
    ///
    /// let w: WorkerRef = WorkerFn::arc("ticker", |token: CancellationToken| async move {
    ///     token.cancelled().await;
    ///     Ok::<_, WorkerError>(())
    /// });
    /// assert_eq!(w.name(), "ticker");
    /// ```
    pub fn arc(name: impl Into<Cow<'static, str>>, f: F) -> Arc<Self> {
        Arc::new(Self::new(name, f))
    }
}

impl<F, Fut> Worker for WorkerFn<F>
where
    F: Fn(CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), WorkerError>> + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn spawn(&self, token: CancellationToken) -> BoxWorkerFuture {
        Box::pin((self.f)(token))
    }
}

//! Pass runner and restart loop for [`Worker`]s.

use std::time::Duration;

use tokio::{select, time};
use tokio_util::sync::CancellationToken;

use crate::error::WorkerError;
use crate::telemetry::{Event, EventKind, Telemetry};

use super::worker::{Worker, WorkerRef};

/// Runs a single pass of `worker` and publishes exactly one terminal event.
///
/// - `Ok(())` and `Err(Canceled)` publish `WorkerStopped`
/// - any other error publishes `WorkerFailed`
pub async fn run_once<W: Worker + ?Sized>(
    worker: &W,
    parent: &CancellationToken,
    pass: u64,
    telemetry: &Telemetry,
) -> Result<(), WorkerError> {
    let res = worker.spawn(parent.child_token()).await;

    match &res {
        Ok(()) | Err(WorkerError::Canceled) => telemetry.publish(
            Event::new(EventKind::WorkerStopped)
                .with_name(worker.name())
                .with_count(pass),
        ),
        Err(e) => telemetry.publish(
            Event::new(EventKind::WorkerFailed)
                .with_name(worker.name())
                .with_count(pass)
                .with_reason(e.to_string()),
        ),
    }
    res
}

/// Runs `worker` until it returns, fails fatally or `token` is cancelled.
///
/// A retryable failure re-enters the loop after `restart_delay`; the sleep is
/// cut short by cancellation.
pub async fn supervise(
    worker: WorkerRef,
    token: CancellationToken,
    telemetry: Telemetry,
    restart_delay: Duration,
) {
    let mut pass: u64 = 0;

    loop {
        if token.is_cancelled() {
            break;
        }
        pass += 1;
        telemetry.publish(
            Event::new(EventKind::WorkerStarting)
                .with_name(worker.name())
                .with_count(pass),
        );

        match run_once(worker.as_ref(), &token, pass, &telemetry).await {
            Ok(()) | Err(WorkerError::Canceled) => break,
            Err(e) if !e.is_retryable() => break,
            Err(_) => {
                let sleep = time::sleep(restart_delay);
                tokio::pin!(sleep);
                select! {
                    _ = &mut sleep => {}
                    _ = token.cancelled() => break,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workers::WorkerFn;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn kinds(rx: &mut tokio::sync::broadcast::Receiver<Event>) -> Vec<(EventKind, Option<u64>)> {
        std::iter::from_fn(|| rx.try_recv().ok())
            .map(|e| (e.kind, e.count))
            .collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_retryable_failure_restarts() {
        let tel = Telemetry::new(64);
        let mut rx = tel.subscribe();
        let passes = Arc::new(AtomicU32::new(0));
        let p = passes.clone();
        let w = WorkerFn::arc("flaky", move |_t: CancellationToken| {
            let p = p.clone();
            async move {
                if p.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(WorkerError::Fail { error: "eof".into() })
                } else {
                    Ok(())
                }
            }
        });

        supervise(w, CancellationToken::new(), tel, Duration::from_secs(1)).await;

        assert_eq!(passes.load(Ordering::SeqCst), 2);
        assert_eq!(
            kinds(&mut rx),
            vec![
                (EventKind::WorkerStarting, Some(1)),
                (EventKind::WorkerFailed, Some(1)),
                (EventKind::WorkerStarting, Some(2)),
                (EventKind::WorkerStopped, Some(2)),
            ]
        );
    }

    #[tokio::test]
    async fn test_fatal_failure_is_not_restarted() {
        let tel = Telemetry::new(64);
        let mut rx = tel.subscribe();
        let w = WorkerFn::arc("broken", |_t: CancellationToken| async {
            Err(WorkerError::Fatal { error: "no device".into() })
        });

        supervise(w, CancellationToken::new(), tel, Duration::ZERO).await;

        let seen = kinds(&mut rx);
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[1].0, EventKind::WorkerFailed);
    }

    #[tokio::test]
    async fn test_cancellation_stops_the_loop() {
        let tel = Telemetry::new(64);
        let mut rx = tel.subscribe();
        let token = CancellationToken::new();
        let w = WorkerFn::arc("idle", |t: CancellationToken| async move {
            t.cancelled().await;
            Err(WorkerError::Canceled)
        });

        let handle = tokio::spawn(supervise(w, token.clone(), tel, Duration::ZERO));
        assert_eq!(rx.recv().await.unwrap().kind, EventKind::WorkerStarting);
        token.cancel();
        handle.await.unwrap();

        let seen = kinds(&mut rx);
        assert_eq!(seen.last().map(|e| e.0), Some(EventKind::WorkerStopped));
    }
}

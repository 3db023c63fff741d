//! Cancellation and deadlines for external calls.
//!
//! Every call that leaves the engine (namespace fetch, scope check,
//! parameter fetch/list, evaluator invocation) is raced against the caller's
//! cancel signal and the configured per-call deadline. The loser is dropped.

use std::future::Future;
use std::time::Duration;

use tokio::sync::watch;

use crate::error::{ClientError, Interrupt};

/// Caller-owned cancellation signal.
///
/// Wraps a `watch` receiver; the evaluation is cancelled once the sender
/// publishes `true` or is dropped after having published `true`.
#[derive(Debug, Clone, Default)]
pub struct CancelSignal {
    rx: Option<watch::Receiver<bool>>,
}

impl CancelSignal {
    /// A signal that never fires.
    pub fn never() -> Self {
        Self { rx: None }
    }

    pub fn new(rx: watch::Receiver<bool>) -> Self {
        Self { rx: Some(rx) }
    }

    /// Create a connected sender/signal pair.
    pub fn channel() -> (watch::Sender<bool>, Self) {
        let (tx, rx) = watch::channel(false);
        (tx, Self::new(rx))
    }

    pub fn is_cancelled(&self) -> bool {
        self.rx.as_ref().is_some_and(|rx| *rx.borrow())
    }

    /// Resolves once cancellation is requested. Pending forever otherwise.
    pub async fn cancelled(&self) {
        let Some(rx) = &self.rx else {
            return std::future::pending().await;
        };
        let mut rx = rx.clone();
        // A closed channel without a `true` can never cancel.
        if rx.wait_for(|cancelled| *cancelled).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

/// Run `fut` unless the signal fires or `deadline` elapses first.
pub async fn guarded<F, T>(cancel: &CancelSignal, deadline: Duration, fut: F) -> Result<T, Interrupt>
where
    F: Future<Output = T>,
{
    if cancel.is_cancelled() {
        return Err(Interrupt::Cancelled);
    }

    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(Interrupt::Cancelled),
        res = tokio::time::timeout(deadline, fut) => {
            res.map_err(|_| Interrupt::DeadlineExceeded(deadline))
        }
    }
}

/// [`guarded`] for resource store calls, folding the interrupt into the
/// call's own error.
pub async fn guarded_call<F, T>(
    cancel: &CancelSignal,
    deadline: Duration,
    fut: F,
) -> Result<T, ClientError>
where
    F: Future<Output = Result<T, ClientError>>,
{
    guarded(cancel, deadline, fut).await?
}

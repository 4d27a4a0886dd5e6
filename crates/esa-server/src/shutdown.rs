//! Shutdown coordination for the listener and generation-backed requests.
//!
//! The listener stops accepting on the shared [`CancellationToken`].
//! Generation-backed requests run through [`ShutdownCoordinator::run`], which
//! tracks them while in flight and abandons them once shutdown begins. An
//! abandoned workflow run is dropped mid-step, which finishes its record as
//! `failed`.

use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{info, warn};

/// How long [`ShutdownCoordinator::graceful_shutdown`] waits by default.
const DEFAULT_DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

/// Owns the shutdown signal and the set of in-flight agent calls.
pub struct ShutdownCoordinator {
    token: CancellationToken,
    requests: TaskTracker,
}

impl ShutdownCoordinator {
    /// Coordinator with no requests in flight.
    pub fn new() -> Self {
        Self {
            token: CancellationToken::new(),
            requests: TaskTracker::new(),
        }
    }

    /// Token the listener waits on.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Signal shutdown. Requests still running are abandoned.
    pub fn shutdown(&self) {
        self.token.cancel();
        self.requests.close();
    }

    /// Whether shutdown has been signalled.
    pub fn is_shutting_down(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Agent calls currently running through [`run`](Self::run).
    pub fn in_flight(&self) -> usize {
        self.requests.len()
    }

    /// Run an agent call unless shutdown begins first.
    ///
    /// Returns `None` without polling `call` when already shutting down, and
    /// drops `call` as soon as shutdown is signalled.
    pub async fn run<F: Future>(&self, call: F) -> Option<F::Output> {
        if self.is_shutting_down() {
            return None;
        }
        let tracked = self.requests.track_future(call);
        tokio::select! {
            biased;
            () = self.token.cancelled() => None,
            output = tracked => Some(output),
        }
    }

    /// Signal shutdown, then wait up to `timeout` for abandoned calls to
    /// unwind and for the listener task to exit.
    pub async fn graceful_shutdown(&self, listener: JoinHandle<()>, timeout: Option<Duration>) {
        let timeout = timeout.unwrap_or(DEFAULT_DRAIN_TIMEOUT);

        self.shutdown();
        info!(
            in_flight = self.in_flight(),
            timeout_secs = timeout.as_secs(),
            "draining agent calls"
        );

        let drain = async {
            self.requests.wait().await;
            if let Err(e) = listener.await {
                warn!(error = %e, "listener task ended abnormally");
            }
        };

        if tokio::time::timeout(timeout, drain).await.is_err() {
            warn!(
                remaining = self.in_flight(),
                "shutdown timed out after {timeout:?}"
            );
        }
    }
}

impl Default for ShutdownCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

//! Graceful shutdown.
//!
//! [`SigDown`] turns the first SIGTERM or SIGINT into a cancelled
//! [`CancellationToken`]. The server hands a clone of the token to
//! `axum::serve(..).with_graceful_shutdown(..)`, which stops accepting connections
//! and drains in-flight requests. Since every relayer request holds the chain lock
//! for its whole duration, no invocation is cut off halfway.

use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

/// Cancels a token on SIGTERM, SIGINT, or when any clone of the token is cancelled.
pub struct SigDown {
    task_tracker: TaskTracker,
    cancellation_token: CancellationToken,
}

impl SigDown {
    /// Registers the signal handlers. Must be called inside a Tokio runtime.
    pub fn try_new() -> Result<Self, std::io::Error> {
        let signals = Signals::register()?;
        let token = CancellationToken::new();
        let watched = token.clone();
        let task_tracker = TaskTracker::new();
        task_tracker.spawn(async move {
            tokio::select! {
                name = signals.recv() => {
                    tracing::info!(signal = name, "Shutting down");
                    watched.cancel();
                }
                _ = watched.cancelled() => {}
            }
        });
        task_tracker.close();
        Ok(Self {
            task_tracker,
            cancellation_token: token,
        })
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation_token.clone()
    }

    /// Waits until shutdown was requested and the signal task has finished.
    pub async fn recv(&self) {
        self.cancellation_token.cancelled().await;
        self.task_tracker.wait().await;
    }
}

#[cfg(unix)]
struct Signals {
    sigterm: tokio::signal::unix::Signal,
    sigint: tokio::signal::unix::Signal,
}

#[cfg(unix)]
impl Signals {
    fn register() -> Result<Self, std::io::Error> {
        use tokio::signal::unix::{SignalKind, signal};
        Ok(Self {
            sigterm: signal(SignalKind::terminate())?,
            sigint: signal(SignalKind::interrupt())?,
        })
    }

    async fn recv(mut self) -> &'static str {
        tokio::select! {
            _ = self.sigterm.recv() => "SIGTERM",
            _ = self.sigint.recv() => "SIGINT",
        }
    }
}

#[cfg(not(unix))]
struct Signals;

#[cfg(not(unix))]
impl Signals {
    fn register() -> Result<Self, std::io::Error> {
        Ok(Self)
    }

    async fn recv(self) -> &'static str {
        let _ = tokio::signal::ctrl_c().await;
        "ctrl-c"
    }
}

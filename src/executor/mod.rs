//! Agent command execution.
//!
//! [`CommandExecutor`] is the seam between the WebSocket layer and the
//! external agent process. Production binds it to [`OpenClawExecutor`];
//! tests substitute scripted executors.

pub mod openclaw;

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;
use tokio_util::sync::{CancellationToken, DropGuard};

use crate::error::ExecError;

/// Deadline used when `now + timeout` does not fit in an [`Instant`].
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

pub use openclaw::OpenClawExecutor;

/// Runs one agent command for a session.
#[async_trait]
pub trait CommandExecutor: Send + Sync + fmt::Debug {
    /// Runs the agent with `message` on behalf of `session_id`.
    ///
    /// Implementations must stop promptly once `ctx` is done and report
    /// the cause as [`ExecError::Cancelled`] or
    /// [`ExecError::DeadlineExceeded`].
    ///
    /// # Errors
    ///
    /// Returns an [`ExecError`] when the command cannot be started, fails,
    /// or is interrupted.
    async fn run(
        &self,
        ctx: &ExecContext,
        session_id: &str,
        message: &str,
    ) -> Result<String, ExecError>;
}

/// Why an [`ExecContext`] finished before the work did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interruption {
    /// The context (or its parent) was cancelled.
    Cancelled,
    /// The deadline elapsed.
    DeadlineExceeded,
}

/// Cancellable execution context with a fixed deadline.
///
/// Derived from a parent [`CancellationToken`]: cancelling the parent
/// cancels every context derived from it, but cancelling a context leaves
/// the parent untouched.
#[derive(Debug, Clone)]
pub struct ExecContext {
    token: CancellationToken,
    deadline: Instant,
}

impl ExecContext {
    /// Creates a context that is done after `timeout` or when `parent` is
    /// cancelled, whichever comes first. Timeouts too large to represent
    /// saturate to a deadline decades away.
    #[must_use]
    pub fn with_timeout(parent: &CancellationToken, timeout: Duration) -> Self {
        let now = Instant::now();
        let deadline = now
            .checked_add(timeout)
            .or_else(|| now.checked_add(FAR_FUTURE))
            .unwrap_or(now);
        Self {
            token: parent.child_token(),
            deadline,
        }
    }

    /// Returns the instant after which the context is done.
    #[must_use]
    pub const fn deadline(&self) -> Instant {
        self.deadline
    }

    /// Cancels the context.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Returns the cause if the context is already done.
    #[must_use]
    pub fn interruption(&self) -> Option<Interruption> {
        if Instant::now() >= self.deadline {
            Some(Interruption::DeadlineExceeded)
        } else if self.token.is_cancelled() {
            Some(Interruption::Cancelled)
        } else {
            None
        }
    }

    /// Resolves once the context is cancelled or its deadline passes.
    pub async fn done(&self) -> Interruption {
        tokio::select! {
            biased;
            () = tokio::time::sleep_until(self.deadline) => {
                self.token.cancel();
                Interruption::DeadlineExceeded
            }
            () = self.token.cancelled() => Interruption::Cancelled,
        }
    }

    /// Returns a guard that cancels the context when dropped.
    #[must_use]
    pub fn cancel_on_drop(&self) -> DropGuard {
        self.token.clone().drop_guard()
    }
}

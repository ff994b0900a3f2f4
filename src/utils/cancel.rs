//! # Cancellation
//!
//! Two independent sources can stop a query: a [`CancelHandle`] held by the
//! caller, and a deadline derived from the query timeout. [`CancelContext`]
//! composes them, and [`abortable`] races an operation against the context,
//! running an abort hook (typically "close the connection") when the context
//! wins.
//!
//! ```rust
//! use server_list_ping::utils::cancel::{abortable, CancelContext, CancelHandle};
//! use server_list_ping::error::ProtocolError;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let handle = CancelHandle::new();
//! handle.cancel_with("shutting down");
//! let ctx = CancelContext::new(Some(handle), None);
//!
//! let result: Result<(), _> = abortable(Some(&ctx), || {}, async { Ok(()) }).await;
//! assert!(matches!(result, Err(ProtocolError::Cancelled(_))));
//! # }
//! ```

use once_cell::sync::OnceCell;
use std::future::{pending, Future};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::{constants, Result};

/// Why an operation was stopped
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CancelReason {
    /// The caller cancelled, with its own explanation
    Cancelled(String),
    /// The deadline elapsed
    TimedOut,
}

/// Caller-owned cancellation handle.
///
/// Clones share state: cancelling any clone cancels them all. The first
/// reason recorded wins.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle {
    token: CancellationToken,
    reason: Arc<OnceCell<CancelReason>>,
}

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel with a generic reason.
    pub fn cancel(&self) {
        self.cancel_with(constants::ERR_CANCELLED);
    }

    /// Cancel, recording `reason` for whoever is waiting.
    pub fn cancel_with(&self, reason: impl Into<String>) {
        self.trigger(CancelReason::Cancelled(reason.into()));
    }

    /// Cancel as a timeout, for callers that run their own timers.
    pub fn time_out(&self) {
        self.trigger(CancelReason::TimedOut);
    }

    fn trigger(&self, reason: CancelReason) {
        // Reason is published before the token fires so waiters always see it.
        let _ = self.reason.set(reason);
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// The recorded reason, once cancelled.
    pub fn reason(&self) -> Option<CancelReason> {
        if !self.is_cancelled() {
            return None;
        }
        Some(self.recorded_reason())
    }

    /// Wait until cancelled and return the reason.
    pub async fn cancelled(&self) -> CancelReason {
        self.token.cancelled().await;
        self.recorded_reason()
    }

    fn recorded_reason(&self) -> CancelReason {
        self.reason
            .get()
            .cloned()
            .unwrap_or_else(|| CancelReason::Cancelled(constants::ERR_CANCELLED.to_string()))
    }
}

/// Optional caller handle plus optional deadline
#[derive(Debug, Clone, Default)]
pub struct CancelContext {
    handle: Option<CancelHandle>,
    deadline: Option<Instant>,
}

impl CancelContext {
    /// Compose `handle` with a deadline `timeout` from now.
    ///
    /// A zero timeout is already expired, so a query under it fails before
    /// connecting. A timeout too large to represent as an instant means no
    /// deadline.
    pub fn new(handle: Option<CancelHandle>, timeout: Option<Duration>) -> Self {
        Self {
            handle,
            deadline: timeout.and_then(|t| Instant::now().checked_add(t)),
        }
    }

    pub fn from_handle(handle: CancelHandle) -> Self {
        Self::new(Some(handle), None)
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self::new(None, Some(timeout))
    }

    pub fn handle(&self) -> Option<&CancelHandle> {
        self.handle.as_ref()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// The reason to stop right now, if any. The caller's handle takes
    /// precedence over the deadline.
    pub fn check(&self) -> Option<CancelReason> {
        if let Some(reason) = self.handle.as_ref().and_then(CancelHandle::reason) {
            return Some(reason);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(CancelReason::TimedOut),
            _ => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.check().is_some()
    }

    /// Resolve with whichever source fires first. Never resolves for an
    /// unbounded context.
    pub async fn cancelled(&self) -> CancelReason {
        let by_caller = async {
            match &self.handle {
                Some(handle) => handle.cancelled().await,
                None => pending().await,
            }
        };
        let by_deadline = async {
            match self.deadline {
                Some(deadline) => {
                    sleep_until(deadline).await;
                    CancelReason::TimedOut
                }
                None => pending().await,
            }
        };

        tokio::select! {
            biased;
            reason = by_caller => reason,
            reason = by_deadline => reason,
        }
    }
}

/// Run `action` under `ctx`, calling `abort` if the context fires first.
///
/// - Without a context the action simply runs.
/// - An already-fired context calls `abort` and fails without polling `action`.
/// - Otherwise the action races the context. The losing side is dropped
///   before this returns, so no listener outlives the call.
///
/// If the action fails while the context has fired (typically because
/// `abort` closed its connection), the cancellation reason is reported
/// instead of the resulting I/O error.
pub async fn abortable<T, A, F>(ctx: Option<&CancelContext>, abort: A, action: F) -> Result<T>
where
    A: FnOnce(),
    F: Future<Output = Result<T>>,
{
    let Some(ctx) = ctx else {
        return action.await;
    };

    if let Some(reason) = ctx.check() {
        debug!(?reason, "Context fired before start");
        abort();
        return Err(reason.into());
    }

    tokio::select! {
        biased;
        result = action => match (result, ctx.check()) {
            (Err(_), Some(reason)) => Err(reason.into()),
            (result, _) => result,
        },
        reason = ctx.cancelled() => {
            debug!(?reason, "Aborting in-flight operation");
            abort();
            Err(reason.into())
        }
    }
}

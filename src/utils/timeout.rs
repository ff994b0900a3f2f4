//! Deadline helpers and default timeouts.

use std::future::Future;
use std::time::Duration;

use crate::error::Result;
use crate::utils::cancel::CancelContext;

/// Default end-to-end timeout for one status query
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Longest timeout a configuration may ask for
pub const MAX_TIMEOUT: Duration = Duration::from_secs(300);

/// Run `action` until it finishes or `ctx` fires.
///
/// This is [`abortable`](crate::utils::cancel::abortable) without an abort
/// hook: the context itself is the only signal, and the in-flight action is
/// dropped when it fires.
pub async fn deadline<T, F>(ctx: Option<&CancelContext>, action: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    let Some(ctx) = ctx else {
        return action.await;
    };
    if let Some(reason) = ctx.check() {
        return Err(reason.into());
    }

    tokio::select! {
        biased;
        result = action => result,
        reason = ctx.cancelled() => Err(reason.into()),
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::error::ProtocolError;
    use crate::utils::cancel::CancelHandle;
    use std::future::pending;

    #[tokio::test(start_paused = true)]
    async fn deadline_times_out_pending_action() {
        let ctx = CancelContext::with_timeout(Duration::from_millis(250));
        let result: Result<()> = deadline(Some(&ctx), pending()).await;
        assert!(matches!(result, Err(ProtocolError::Timeout)));
    }

    #[tokio::test]
    async fn deadline_rejects_fired_handle_up_front() {
        let handle = CancelHandle::new();
        handle.cancel_with("stop");
        let ctx = CancelContext::from_handle(handle);
        let result = deadline(Some(&ctx), async { Ok(1) }).await;
        assert!(matches!(result, Err(ProtocolError::Cancelled(ref m)) if m == "stop"));
    }

    #[tokio::test]
    async fn deadline_without_context_is_transparent() {
        assert_eq!(deadline(None, async { Ok(3) }).await.unwrap(), 3);
    }
}

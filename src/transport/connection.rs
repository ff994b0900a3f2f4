//! # Connection
//!
//! An exclusively-owned byte stream that is released exactly once.
//!
//! The stream is closed by whichever comes first: an explicit [`Connection::close`],
//! an [`AbortHandle::abort`] observed by pending I/O, or drop. After that
//! every read and write fails, so a task blocked on the connection wakes up
//! with an error instead of hanging.

use std::future::Future;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, ReadBuf};
use tokio_util::sync::{CancellationToken, WaitForCancellationFutureOwned};
use tracing::{debug, warn};

use crate::error::constants;

/// Forces a [`Connection`] closed from outside the task that owns it.
#[derive(Debug, Clone)]
pub struct AbortHandle {
    token: CancellationToken,
}

impl AbortHandle {
    /// Close the connection. Pending and future I/O on it fails with
    /// `ConnectionAborted`. Calling this more than once has no further effect.
    pub fn abort(&self) {
        self.token.cancel();
    }

    pub fn is_aborted(&self) -> bool {
        self.token.is_cancelled()
    }
}

type CloseHook = Box<dyn FnOnce() + Send + 'static>;

/// Byte stream with abort support and single release
pub struct Connection<S> {
    inner: Option<S>,
    abort: CancellationToken,
    aborted: Pin<Box<WaitForCancellationFutureOwned>>,
    on_close: Option<CloseHook>,
}

impl<S> Connection<S> {
    pub fn new(stream: S) -> Self {
        let abort = CancellationToken::new();
        let aborted = Box::pin(abort.clone().cancelled_owned());
        Self {
            inner: Some(stream),
            abort,
            aborted,
            on_close: None,
        }
    }

    /// Run `hook` once, when the stream is released.
    pub fn on_close<F>(mut self, hook: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        self.on_close = Some(Box::new(hook));
        self
    }

    pub fn abort_handle(&self) -> AbortHandle {
        AbortHandle {
            token: self.abort.clone(),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.inner.is_none()
    }

    /// Detach the stream; the close hook fires on the first call only.
    fn release(&mut self) -> Option<S> {
        let stream = self.inner.take();
        if stream.is_some() {
            if let Some(hook) = self.on_close.take() {
                hook();
            }
        }
        stream
    }

    /// Release the stream if an abort has been requested.
    fn poll_abort(&mut self, cx: &mut Context<'_>) -> Poll<io::Error> {
        if !self.abort.is_cancelled() && self.aborted.as_mut().poll(cx).is_pending() {
            return Poll::Pending;
        }
        if self.release().is_some() {
            debug!("Connection aborted");
        }
        Poll::Ready(io::Error::new(
            io::ErrorKind::ConnectionAborted,
            constants::ERR_CONNECTION_ABORTED,
        ))
    }

    fn stream_mut(&mut self) -> io::Result<&mut S> {
        self.inner
            .as_mut()
            .ok_or_else(|| io::Error::from(io::ErrorKind::NotConnected))
    }
}

impl<S> Connection<S>
where
    S: AsyncWrite + Unpin,
{
    /// Shut the stream down and release it. Idempotent; shutdown errors are
    /// logged and swallowed.
    pub async fn close(&mut self) {
        let Some(mut stream) = self.release() else {
            return;
        };
        if let Err(e) = stream.shutdown().await {
            warn!(error = %e, "Ignoring error while closing connection");
        }
    }
}

impl<S> Drop for Connection<S> {
    fn drop(&mut self) {
        self.release();
    }
}

impl<S> AsyncRead for Connection<S>
where
    S: AsyncRead + Unpin,
{
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        if let Poll::Ready(err) = this.poll_abort(cx) {
            return Poll::Ready(Err(err));
        }
        Pin::new(this.stream_mut()?).poll_read(cx, buf)
    }
}

impl<S> AsyncWrite for Connection<S>
where
    S: AsyncWrite + Unpin,
{
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        let this = self.get_mut();
        if let Poll::Ready(err) = this.poll_abort(cx) {
            return Poll::Ready(Err(err));
        }
        Pin::new(this.stream_mut()?).poll_write(cx, buf)
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        if let Poll::Ready(err) = this.poll_abort(cx) {
            return Poll::Ready(Err(err));
        }
        Pin::new(this.stream_mut()?).poll_flush(cx)
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        if let Poll::Ready(err) = this.poll_abort(cx) {
            return Poll::Ready(Err(err));
        }
        Pin::new(this.stream_mut()?).poll_shutdown(cx)
    }
}

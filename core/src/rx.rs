//! Result containers returned by request-style interactions.
//!
//! [Mono] resolves to exactly one payload or one error, [Flux] yields zero or more payloads and
//! then ends, or ends early with one error. Only construction and pass-through are provided, the
//! stream operators come from [futures::StreamExt] and [futures::FutureExt].

use crate::{Payload, error::RSocketError};
use futures::channel::mpsc;
use futures::future::{self, BoxFuture};
use futures::stream::{self, BoxStream, Stream};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

/// An eventual single value
pub struct Mono(BoxFuture<'static, Result<Payload, RSocketError>>);

impl Mono {
    #[inline]
    pub fn new<F>(f: F) -> Self
    where
        F: Future<Output = Result<Payload, RSocketError>> + Send + 'static,
    {
        Self(Box::pin(f))
    }

    #[inline]
    pub fn just(payload: Payload) -> Self {
        Self::new(future::ready(Ok(payload)))
    }

    /// An already-failed Mono, it resolves on first poll.
    #[inline]
    pub fn error(e: RSocketError) -> Self {
        Self::new(future::ready(Err(e)))
    }
}

impl Future for Mono {
    type Output = Result<Payload, RSocketError>;

    #[inline]
    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.0.as_mut().poll(cx)
    }
}

impl fmt::Debug for Mono {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Mono")
    }
}

/// A lazy sequence of values which completes or fails
pub struct Flux(BoxStream<'static, Result<Payload, RSocketError>>);

impl Flux {
    #[inline]
    pub fn new<S>(s: S) -> Self
    where
        S: Stream<Item = Result<Payload, RSocketError>> + Send + 'static,
    {
        Self(Box::pin(s))
    }

    pub fn just<I>(items: I) -> Self
    where
        I: IntoIterator<Item = Payload>,
        I::IntoIter: Send + 'static,
    {
        Self::new(stream::iter(items.into_iter().map(Ok)))
    }

    #[inline]
    pub fn empty() -> Self {
        Self::new(stream::empty())
    }

    /// A Flux that fails immediately: one `Err` item, then the end of stream.
    #[inline]
    pub fn error(e: RSocketError) -> Self {
        Self::new(stream::once(future::ready(Err(e))))
    }

    /// Create a push-style Flux, values are emitted through the returned [FluxSink].
    ///
    /// The Flux completes when the sink is completed or dropped.
    pub fn create() -> (FluxSink, Self) {
        let (tx, rx) = mpsc::unbounded();
        (FluxSink { tx }, Self::new(rx))
    }
}

impl Stream for Flux {
    type Item = Result<Payload, RSocketError>;

    #[inline]
    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.0.as_mut().poll_next(cx)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.0.size_hint()
    }
}

impl fmt::Debug for Flux {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Flux")
    }
}

/// The producer half of [Flux::create]
pub struct FluxSink {
    tx: mpsc::UnboundedSender<Result<Payload, RSocketError>>,
}

impl FluxSink {
    /// Returns false when the Flux has been dropped by its subscriber.
    #[inline]
    pub fn next(&self, payload: Payload) -> bool {
        self.tx.unbounded_send(Ok(payload)).is_ok()
    }

    /// Terminate the Flux with an error.
    #[inline]
    pub fn error(self, e: RSocketError) {
        let _ = self.tx.unbounded_send(Err(e));
    }

    /// Terminate the Flux normally.
    #[inline]
    pub fn complete(self) {
        self.tx.close_channel();
    }

    #[inline]
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

impl fmt::Debug for FluxSink {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "FluxSink(closed={})", self.tx.is_closed())
    }
}

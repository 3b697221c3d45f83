//! Settled-future fast path.
//!
//! Most `onResolve` callbacks answer synchronously or hand back a future that
//! is already complete (a cached lookup, an `async` block with no real await).
//! Awaiting those through the executor would cost one scheduler round-trip per
//! specifier, so callback output is polled once with a no-op waker first and
//! only genuinely pending work is awaited.

use std::future::Future;
use std::task::{Context, Poll};

use futures::future::BoxFuture;
use futures::task::noop_waker_ref;
use futures::FutureExt;

use super::error::PluginError;

/// A value a callback may produce now, fail with, or produce later.
///
/// A future may itself resolve to another `MaybeAsync`.
pub enum MaybeAsync<T> {
    Ready(T),
    Failed(PluginError),
    Future(BoxFuture<'static, MaybeAsync<T>>),
}

impl<T> MaybeAsync<T> {
    pub fn pending<F>(fut: F) -> Self
    where
        F: Future<Output = MaybeAsync<T>> + Send + 'static,
    {
        Self::Future(fut.boxed())
    }

    /// Wrap a future producing a plain result.
    pub fn from_future<F>(fut: F) -> Self
    where
        F: Future<Output = Result<T, PluginError>> + Send + 'static,
        T: Send + 'static,
    {
        Self::Future(
            async move {
                match fut.await {
                    Ok(value) => MaybeAsync::Ready(value),
                    Err(err) => MaybeAsync::Failed(err),
                }
            }
            .boxed(),
        )
    }
}

impl<T> From<Result<T, PluginError>> for MaybeAsync<T> {
    fn from(result: Result<T, PluginError>) -> Self {
        match result {
            Ok(value) => Self::Ready(value),
            Err(err) => Self::Failed(err),
        }
    }
}

impl<T> std::fmt::Debug for MaybeAsync<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ready(_) => f.write_str("MaybeAsync::Ready(..)"),
            Self::Failed(err) => write!(f, "MaybeAsync::Failed({err})"),
            Self::Future(_) => f.write_str("MaybeAsync::Future(..)"),
        }
    }
}

/// Where draining stopped.
pub enum Drained<T> {
    /// A concrete value or error, reached without suspending.
    Settled(Result<T, PluginError>),
    /// A future that has not completed yet.
    Pending(BoxFuture<'static, MaybeAsync<T>>),
}

/// Unwrap already-completed futures without yielding.
pub fn drain_settled<T>(mut value: MaybeAsync<T>) -> Drained<T> {
    let mut cx = Context::from_waker(noop_waker_ref());
    loop {
        match value {
            MaybeAsync::Ready(v) => return Drained::Settled(Ok(v)),
            MaybeAsync::Failed(err) => return Drained::Settled(Err(err)),
            MaybeAsync::Future(mut fut) => match fut.poll_unpin(&mut cx) {
                Poll::Ready(next) => value = next,
                Poll::Pending => return Drained::Pending(fut),
            },
        }
    }
}

/// A settled value plus how many times the executor was actually awaited.
#[derive(Debug)]
pub struct Settled<T> {
    pub result: Result<T, PluginError>,
    pub suspensions: u32,
}

/// Drain, awaiting only when a future is genuinely pending.
pub async fn settle<T>(value: MaybeAsync<T>) -> Settled<T> {
    let mut suspensions = 0;
    let mut current = value;
    loop {
        match drain_settled(current) {
            Drained::Settled(result) => {
                return Settled {
                    result,
                    suspensions,
                }
            }
            Drained::Pending(fut) => {
                suspensions += 1;
                current = fut.await;
            }
        }
    }
}

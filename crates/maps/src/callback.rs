//! Single-resolution bridge between callback-style SDK calls and futures.
//!
//! The SDK reports results by invoking a callback. [`callback`] hands out a
//! [`Callback`] for the SDK side and a [`Pending`] for the awaiting side.
//! `Callback::invoke` consumes the callback, so a result can be delivered at
//! most once; dropping it without invoking resolves the waiter with
//! [`CallbackDropped`] instead of hanging forever.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use thiserror::Error;
use tokio::sync::oneshot;

/// The SDK side of a single-resolution callback.
#[derive(Debug)]
pub struct Callback<T> {
    tx: oneshot::Sender<T>,
    name: &'static str,
}

/// The awaiting side of a single-resolution callback.
#[derive(Debug)]
pub struct Pending<T> {
    rx: oneshot::Receiver<T>,
    name: &'static str,
}

/// The callback was dropped before it was invoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{0} callback was dropped without being invoked")]
pub struct CallbackDropped(pub &'static str);

/// Creates a linked callback/waiter pair. `name` labels log lines and errors.
pub fn callback<T>(name: &'static str) -> (Callback<T>, Pending<T>) {
    let (tx, rx) = oneshot::channel();
    (Callback { tx, name }, Pending { rx, name })
}

impl<T> Callback<T> {
    /// Delivers the result. A waiter that has already gone away (its owner
    /// was torn down) is not an error; the value is discarded.
    pub fn invoke(self, value: T) {
        if self.tx.send(value).is_err() {
            tracing::debug!(callback = self.name, "result arrived after its waiter went away");
        }
    }

    /// True once nobody is waiting for this callback any more.
    pub fn is_abandoned(&self) -> bool {
        self.tx.is_closed()
    }

    /// Label given at creation.
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl<T> Pending<T> {
    /// Waits for the single invocation.
    pub async fn wait(self) -> Result<T, CallbackDropped> {
        self.await
    }
}

impl<T> Future for Pending<T> {
    type Output = Result<T, CallbackDropped>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let name = self.name;
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|result| result.map_err(|_| CallbackDropped(name)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_invoke_resolves_waiter() {
        let (cb, pending) = callback::<u32>("idle");
        cb.invoke(7);
        assert_eq!(pending.wait().await, Ok(7));
    }

    #[tokio::test]
    async fn test_dropped_callback_resolves_with_error() {
        let (cb, pending) = callback::<u32>("nearby_search");
        drop(cb);
        assert_eq!(pending.wait().await, Err(CallbackDropped("nearby_search")));
    }

    #[tokio::test]
    async fn test_invoke_after_waiter_gone_is_silent() {
        let (cb, pending) = callback::<u32>("geolocation");
        drop(pending);
        assert!(cb.is_abandoned());
        cb.invoke(1);
    }

    #[tokio::test]
    async fn test_polling_by_reference_keeps_the_waiter() {
        let (cb, mut pending) = callback::<u32>("idle");
        let mut first = tokio_test::task::spawn(&mut pending);
        assert!(first.poll().is_pending());
        drop(first);

        cb.invoke(3);
        assert_eq!((&mut pending).await, Ok(3));
    }

    #[tokio::test]
    async fn test_resolves_across_tasks() {
        let (cb, pending) = callback::<&'static str>("idle");
        tokio::spawn(async move {
            tokio::task::yield_now().await;
            cb.invoke("settled");
        });
        assert_eq!(pending.wait().await, Ok("settled"));
    }
}

//! Closable request channel feeding a subscription's outbound side.
//!
//! A bidirectional subscription keeps its request side open for the life of
//! the stream; the service ends the event stream once the client closes it.
//! [`RequestChannel`] is the producer handle (any number of producers), and
//! [`RequestStream`] is the consuming half handed to the service.
//!
//! Closing enqueues the end marker exactly once; the marker itself is never
//! yielded, and pushes after close are rejected.

use crate::error::{RemoteError, RemoteResult};
use futures_util::Stream;
use parking_lot::Mutex;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::mpsc;

/// Producer side of a subscription's request queue.
pub struct RequestChannel<T> {
    tx: Mutex<Option<mpsc::UnboundedSender<T>>>,
}

impl<T: Send + 'static> RequestChannel<T> {
    /// Create an empty channel.
    #[must_use]
    pub fn open() -> (Self, RequestStream<T>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                tx: Mutex::new(Some(tx)),
            },
            RequestStream { rx },
        )
    }

    /// Create a channel seeded with the initial subscription request.
    #[must_use]
    pub fn with_initial(initial: T) -> (Self, RequestStream<T>) {
        let (channel, stream) = Self::open();
        // Cannot fail: the channel was just opened.
        let _ = channel.push(initial);
        (channel, stream)
    }

    /// Enqueue a request message for transmission.
    ///
    /// Fails once the channel has been closed.
    pub fn push(&self, item: T) -> RemoteResult<()> {
        let guard = self.tx.lock();
        match guard.as_ref() {
            Some(tx) => tx
                .send(item)
                .map_err(|_| RemoteError::RequestChannelClosed),
            None => Err(RemoteError::RequestChannelClosed),
        }
    }

    /// Signal end-of-input. Idempotent.
    ///
    /// Unblocks a consumer currently waiting on the stream.
    pub fn close(&self) {
        self.tx.lock().take();
    }

    /// Whether `close` has been called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.tx.lock().is_none()
    }
}

/// Consuming half of a request channel; yields pushed items in order and
/// terminates at the close marker without yielding it.
pub struct RequestStream<T> {
    rx: mpsc::UnboundedReceiver<T>,
}

impl<T> RequestStream<T> {
    /// Receive the next request, or `None` once the channel is closed and
    /// drained.
    pub async fn recv(&mut self) -> Option<T> {
        self.rx.recv().await
    }
}

impl<T> Stream for RequestStream<T> {
    type Item = T;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<T>> {
        self.rx.poll_recv(cx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::StreamExt;

    #[tokio::test]
    async fn test_push_then_close_yields_exactly_pushed_items() {
        let (channel, stream) = RequestChannel::open();
        channel.push("a").unwrap();
        channel.push("b").unwrap();
        channel.close();

        let items: Vec<_> = stream.collect().await;
        assert_eq!(items, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let (channel, stream) = RequestChannel::<&str>::open();
        channel.close();
        channel.close();
        assert!(channel.is_closed());

        let items: Vec<_> = stream.collect().await;
        assert!(items.is_empty());
    }

    #[tokio::test]
    async fn test_push_after_close_is_rejected() {
        let (channel, _stream) = RequestChannel::open();
        channel.close();
        assert!(matches!(
            channel.push("late"),
            Err(RemoteError::RequestChannelClosed)
        ));
    }

    #[tokio::test]
    async fn test_with_initial_seeds_first_item() {
        let (channel, mut stream) = RequestChannel::with_initial("subscribe");
        assert_eq!(stream.recv().await, Some("subscribe"));
        channel.close();
        assert_eq!(stream.recv().await, None);
    }

    #[tokio::test]
    async fn test_close_unblocks_waiting_consumer() {
        let (channel, mut stream) = RequestChannel::<&str>::open();
        let waiter = tokio::spawn(async move { stream.recv().await });
        tokio::task::yield_now().await;
        channel.close();
        assert_eq!(waiter.await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_multiple_producers() {
        let (channel, stream) = RequestChannel::open();
        let channel = std::sync::Arc::new(channel);

        let mut handles = Vec::new();
        for i in 0..4 {
            let ch = channel.clone();
            handles.push(tokio::spawn(async move { ch.push(i) }));
        }
        for h in handles {
            h.await.unwrap().unwrap();
        }
        channel.close();

        let mut items: Vec<_> = stream.collect().await;
        items.sort_unstable();
        assert_eq!(items, vec![0, 1, 2, 3]);
    }
}

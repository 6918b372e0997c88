//! Per-subscription event consumption.
//!
//! One dedicated task per subscription pulls events in arrival order and
//! dispatches each to its handler. A failure to obtain the next event stops
//! that consumer only; a handler failure is logged (with remote metadata
//! when present) and consumption continues. There is no retry here —
//! reconnection is the remote service's concern.

use crate::error::EngineError;
use futures_util::StreamExt;
use tms_remote::{log_remote_failure, EventStream};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

/// Spawns and represents one subscription's consuming task.
pub struct StreamConsumer;

impl StreamConsumer {
    /// Spawn a consumer for `stream`, dispatching every event to `handler`.
    ///
    /// The returned handle completes when the stream ends (gracefully or on
    /// error); shutdown is cooperative via closing the subscription's
    /// request channel.
    pub fn spawn<E, H>(
        subscription: impl Into<String>,
        stream: EventStream<E>,
        handler: H,
    ) -> JoinHandle<()>
    where
        E: Send + 'static,
        H: FnMut(E) -> Result<(), EngineError> + Send + 'static,
    {
        tokio::spawn(consume(subscription.into(), stream, handler))
    }
}

async fn consume<E, H>(subscription: String, mut stream: EventStream<E>, mut handler: H)
where
    H: FnMut(E) -> Result<(), EngineError>,
{
    debug!(subscription = %subscription, "Event consumer started");
    loop {
        match stream.next().await {
            None => {
                info!(subscription = %subscription, "Event stream completed");
                break;
            }
            Some(Err(err)) => {
                error!(
                    subscription = %subscription,
                    error = %err,
                    "Event stream failed, stopping consumer"
                );
                break;
            }
            Some(Ok(event)) => {
                if let Err(err) = handler(event) {
                    match err {
                        EngineError::Remote(remote) => {
                            log_remote_failure(&subscription, &remote);
                        }
                        other => {
                            error!(
                                subscription = %subscription,
                                error = %other,
                                "Event handler failed"
                            );
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::stream;
    use parking_lot::Mutex;
    use std::sync::Arc;
    use tms_remote::{ErrorDetails, RemoteError, RemoteResult};

    fn boxed<E: Send + 'static>(items: Vec<RemoteResult<E>>) -> EventStream<E> {
        Box::pin(stream::iter(items))
    }

    #[tokio::test]
    async fn test_dispatches_in_order_until_graceful_end() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();

        let consumer = StreamConsumer::spawn(
            "targets",
            boxed(vec![Ok(1), Ok(2), Ok(3)]),
            move |event: i32| {
                sink.lock().push(event);
                Ok(())
            },
        );
        consumer.await.unwrap();
        assert_eq!(*seen.lock(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_handler_error_does_not_stop_consumption() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();

        let consumer = StreamConsumer::spawn(
            "orders",
            boxed(vec![Ok(1), Ok(2), Ok(3)]),
            move |event: i32| {
                sink.lock().push(event);
                if event == 2 {
                    Err(EngineError::MissingField("Leaves"))
                } else {
                    Ok(())
                }
            },
        );
        consumer.await.unwrap();
        assert_eq!(*seen.lock(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_handler_remote_error_renders_metadata_and_continues() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();

        let consumer = StreamConsumer::spawn(
            "orders",
            boxed(vec![Ok(1), Ok(2)]),
            move |event: i32| {
                sink.lock().push(event);
                Err(EngineError::Remote(RemoteError::Rejected {
                    message: "handler-side rejection".to_string(),
                    details: ErrorDetails {
                        exception_class: Some("ValidationException".to_string()),
                        error_code: Some("BadOrder".to_string()),
                        child_messages: vec!["child 0".to_string()],
                    },
                }))
            },
        );
        consumer.await.unwrap();
        assert_eq!(*seen.lock(), vec![1, 2]);
    }

    #[tokio::test]
    async fn test_stream_error_stops_consumer() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();

        let consumer = StreamConsumer::spawn(
            "market-data",
            boxed(vec![
                Ok(1),
                Err(RemoteError::Stream("connection reset".to_string())),
                Ok(2),
            ]),
            move |event: i32| {
                sink.lock().push(event);
                Ok(())
            },
        );
        consumer.await.unwrap();
        // The event after the failure is never dispatched.
        assert_eq!(*seen.lock(), vec![1]);
    }
}

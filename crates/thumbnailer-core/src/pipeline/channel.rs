//! Bounded handoff channels between pipeline stages.
//!
//! A channel closes once every sender is dropped, so a stage signals
//! "no more items" simply by returning. Every wait also watches the run's
//! cancellation token.

use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;

use crate::config::PipelineConfig;

/// Create a bounded channel pair with the configured buffer size.
///
/// When the buffer is full, the sender will block, providing backpressure
/// to prevent memory exhaustion during batch processing.
pub fn bounded_channel<T>(config: &PipelineConfig) -> (mpsc::Sender<T>, mpsc::Receiver<T>) {
    mpsc::channel(config.buffer_size.max(1))
}

/// Send `item` downstream, waiting for buffer space.
///
/// Returns `false` if the run was cancelled or the receiver is gone; the item
/// is dropped in both cases and the caller should stop.
pub async fn forward<T>(output: &mpsc::Sender<T>, item: T, cancel: &CancellationToken) -> bool {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => false,
        sent = output.send(item) => sent.is_ok(),
    }
}

/// Receive the next item, or `None` once the channel is closed and drained
/// or the run is cancelled.
pub async fn recv_or_cancel<T>(
    input: &mut mpsc::Receiver<T>,
    cancel: &CancellationToken,
) -> Option<T> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => None,
        item = input.recv() => item,
    }
}

/// A receiver shared by several workers of the same stage.
///
/// Workers take turns pulling items; each item goes to exactly one worker.
pub struct SharedReceiver<T> {
    inner: Mutex<mpsc::Receiver<T>>,
}

impl<T> SharedReceiver<T> {
    /// Wrap a receiver for shared use.
    pub fn new(receiver: mpsc::Receiver<T>) -> Self {
        Self {
            inner: Mutex::new(receiver),
        }
    }

    /// Receive the next item, or `None` on closure or cancellation.
    pub async fn recv(&self, cancel: &CancellationToken) -> Option<T> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            item = async { self.inner.lock().await.recv().await } => item,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_bounded_channel() {
        let config = PipelineConfig {
            buffer_size: 10,
            ..Default::default()
        };

        let (tx, mut rx) = bounded_channel::<i32>(&config);

        tx.send(42).await.unwrap();
        let received = rx.recv().await;

        assert_eq!(received, Some(42));
    }

    #[tokio::test]
    async fn test_forward_preserves_order_and_closes() {
        let cancel = CancellationToken::new();
        let (tx, mut rx) = mpsc::channel::<i32>(1);

        let producer = {
            let cancel = cancel.clone();
            tokio::spawn(async move {
                for i in 0..5 {
                    assert!(forward(&tx, i, &cancel).await);
                }
            })
        };

        let mut received = Vec::new();
        while let Some(i) = recv_or_cancel(&mut rx, &cancel).await {
            received.push(i);
        }
        producer.await.unwrap();

        assert_eq!(received, vec![0, 1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn test_forward_stops_on_cancel() {
        let cancel = CancellationToken::new();
        let (tx, _rx) = mpsc::channel::<i32>(1);

        assert!(forward(&tx, 1, &cancel).await);
        cancel.cancel();
        // Buffer is full and nobody reads: only cancellation can unblock this.
        assert!(!forward(&tx, 2, &cancel).await);
    }

    #[tokio::test]
    async fn test_forward_fails_when_receiver_dropped() {
        let cancel = CancellationToken::new();
        let (tx, rx) = mpsc::channel::<i32>(1);
        drop(rx);

        assert!(!forward(&tx, 1, &cancel).await);
    }

    #[tokio::test]
    async fn test_recv_returns_none_on_cancel() {
        let cancel = CancellationToken::new();
        let (_tx, mut rx) = mpsc::channel::<i32>(1);

        cancel.cancel();
        assert_eq!(recv_or_cancel(&mut rx, &cancel).await, None);
    }

    #[tokio::test]
    async fn test_shared_receiver_delivers_each_item_once() {
        let cancel = CancellationToken::new();
        let (tx, rx) = mpsc::channel::<u32>(4);
        let shared = Arc::new(SharedReceiver::new(rx));

        let mut workers = Vec::new();
        for _ in 0..3 {
            let shared = shared.clone();
            let cancel = cancel.clone();
            workers.push(tokio::spawn(async move {
                let mut got = Vec::new();
                while let Some(i) = shared.recv(&cancel).await {
                    got.push(i);
                }
                got
            }));
        }

        for i in 0..100 {
            tx.send(i).await.unwrap();
        }
        drop(tx);

        let mut all = Vec::new();
        for worker in workers {
            all.extend(worker.await.unwrap());
        }
        all.sort_unstable();
        assert_eq!(all, (0..100).collect::<Vec<_>>());
    }
}

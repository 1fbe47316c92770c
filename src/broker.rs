//! Multicast pub/sub primitives.
//!
//! [`Broker`] fans every published value out to the receivers that exist at
//! publish time; late subscribers miss past values. [`Latest`] keeps the most
//! recent value and hands it to new subscribers immediately, followed by every
//! later value.
//!
//! Each subscriber owns an unbounded queue, so a slow subscriber never loses
//! values. Dropping a receiver unsubscribes it; closed queues are pruned on the
//! next publish or subscribe.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tokio_stream::Stream;

/// Replay-none multicast channel.
pub struct Broker<T> {
    subscribers: Arc<Mutex<Vec<mpsc::UnboundedSender<T>>>>,
}

impl<T: Clone + Send + 'static> Broker<T> {
    pub fn new() -> Self {
        Self {
            subscribers: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn publish(&self, value: T) {
        let mut subscribers = self.subscribers.lock();
        // A failed send means the receiver was dropped.
        subscribers.retain(|tx| tx.send(value.clone()).is_ok());
    }

    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<T> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut subscribers = self.subscribers.lock();
        subscribers.retain(|tx| !tx.is_closed());
        subscribers.push(tx);
        rx
    }

    pub fn stream(&self) -> impl Stream<Item = T> + Send + 'static {
        UnboundedReceiverStream::new(self.subscribe())
    }

    pub fn receiver_count(&self) -> usize {
        self.subscribers
            .lock()
            .iter()
            .filter(|tx| !tx.is_closed())
            .count()
    }
}

impl<T> Clone for Broker<T> {
    fn clone(&self) -> Self {
        Self {
            subscribers: self.subscribers.clone(),
        }
    }
}

impl<T: Clone + Send + 'static> Default for Broker<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Replay-latest channel: new subscribers receive the current value first,
/// then every value published afterwards.
pub struct Latest<T> {
    inner: Arc<Mutex<LatestInner<T>>>,
}

struct LatestInner<T> {
    current: T,
    subscribers: Vec<mpsc::UnboundedSender<T>>,
}

impl<T: Clone + Send + 'static> Latest<T> {
    pub fn new(initial: T) -> Self {
        Self {
            inner: Arc::new(Mutex::new(LatestInner {
                current: initial,
                subscribers: Vec::new(),
            })),
        }
    }

    /// Replace the current value and deliver it to every subscriber.
    pub fn publish(&self, value: T) {
        let mut inner = self.inner.lock();
        inner.subscribers.retain(|tx| tx.send(value.clone()).is_ok());
        inner.current = value;
    }

    /// Clone of the current value.
    pub fn get(&self) -> T {
        self.inner.lock().current.clone()
    }

    /// The returned receiver already holds the current value.
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<T> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut inner = self.inner.lock();
        // Seeded under the lock so no publish can slip in ahead of it.
        let _ = tx.send(inner.current.clone());
        inner.subscribers.retain(|tx| !tx.is_closed());
        inner.subscribers.push(tx);
        rx
    }

    pub fn stream(&self) -> impl Stream<Item = T> + Send + 'static {
        UnboundedReceiverStream::new(self.subscribe())
    }
}

impl<T> Clone for Latest<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

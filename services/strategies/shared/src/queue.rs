//! Drop-oldest hand-off queue
//!
//! Producers never block. When the queue is full the oldest item is discarded, which is
//! the right policy when each item supersedes the ones before it. Single consumer.

use parking_lot::Mutex;
use std::collections::VecDeque;
use tokio::sync::Notify;

/// Result of a [`BoundedQueue::push`]
#[derive(Debug, PartialEq, Eq)]
pub enum PushOutcome<T> {
    Enqueued,
    /// Queue was full; the returned item was evicted to make room
    DroppedOldest(T),
    /// Queue is closed; the pushed item is handed back
    Closed(T),
}

#[derive(Debug)]
struct QueueState<T> {
    items: VecDeque<T>,
    closed: bool,
}

#[derive(Debug)]
pub struct BoundedQueue<T> {
    state: Mutex<QueueState<T>>,
    notify: Notify,
    capacity: usize,
}

impl<T> BoundedQueue<T> {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            state: Mutex::new(QueueState {
                items: VecDeque::with_capacity(capacity),
                closed: false,
            }),
            notify: Notify::new(),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.state.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().items.is_empty()
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    pub fn push(&self, item: T) -> PushOutcome<T> {
        let outcome = {
            let mut state = self.state.lock();
            if state.closed {
                return PushOutcome::Closed(item);
            }
            let dropped = if state.items.len() >= self.capacity {
                state.items.pop_front()
            } else {
                None
            };
            state.items.push_back(item);
            match dropped {
                Some(old) => PushOutcome::DroppedOldest(old),
                None => PushOutcome::Enqueued,
            }
        };
        self.notify.notify_one();
        outcome
    }

    /// Next item in arrival order. `None` once closed and drained.
    pub async fn recv(&self) -> Option<T> {
        loop {
            let notified = self.notify.notified();
            {
                let mut state = self.state.lock();
                if let Some(item) = state.items.pop_front() {
                    return Some(item);
                }
                if state.closed {
                    return None;
                }
            }
            notified.await;
        }
    }

    /// Stop accepting items. Queued items remain receivable.
    pub fn close(&self) {
        self.state.lock().closed = true;
        // notify_one stores a permit when the consumer is not yet waiting
        self.notify.notify_one();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn test_drop_oldest_when_full() {
        let queue = BoundedQueue::new(2);
        assert_eq!(queue.push(1), PushOutcome::Enqueued);
        assert_eq!(queue.push(2), PushOutcome::Enqueued);
        assert_eq!(queue.push(3), PushOutcome::DroppedOldest(1));

        assert_eq!(queue.recv().await, Some(2));
        assert_eq!(queue.recv().await, Some(3));
        assert!(queue.is_empty());
    }

    #[tokio::test]
    async fn test_close_drains_then_ends() {
        let queue = BoundedQueue::new(4);
        queue.push("a");
        queue.close();

        assert_eq!(queue.push("b"), PushOutcome::Closed("b"));
        assert_eq!(queue.recv().await, Some("a"));
        assert_eq!(queue.recv().await, None);
    }

    #[tokio::test]
    async fn test_waiting_consumer_is_woken() {
        let queue = Arc::new(BoundedQueue::new(1));
        let consumer = {
            let queue = queue.clone();
            tokio::spawn(async move { queue.recv().await })
        };

        tokio::time::sleep(Duration::from_millis(10)).await;
        queue.push(42u32);

        let received = tokio::time::timeout(Duration::from_secs(1), consumer)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(received, Some(42));
    }
}

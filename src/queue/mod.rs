//! Bounded hand-off queue between the tail thread and slow consumers.
//!
//! The producer side is synchronous (it runs inside subscriber callbacks on
//! the tail thread); the consumer drains a capped batch per tick and never
//! blocks.

use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};

/// Default number of queued items.
pub const DEFAULT_CAPACITY: usize = 10_000;

/// Default number of items handed to the consumer per tick.
pub const DEFAULT_DRAIN_PER_TICK: usize = 60;

/// What `push` does when the queue is full.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverflowPolicy {
    /// Wait until the consumer makes room. Stalls the producer.
    #[default]
    Block,
    /// Discard the oldest queued item.
    DropOldest,
}

/// Result of a successful push.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    Queued,
    /// The item was queued after discarding the oldest one.
    DroppedOldest,
}

/// Pushing into a queue that was closed.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Queue closed")]
pub struct QueueClosed;

struct State<T> {
    items: VecDeque<T>,
    closed: bool,
    dropped: u64,
}

struct Inner<T> {
    state: Mutex<State<T>>,
    not_full: Condvar,
    capacity: usize,
    policy: OverflowPolicy,
}

/// Multi-producer bounded FIFO. Clones share the same queue.
pub struct BoundedQueue<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for BoundedQueue<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> std::fmt::Debug for BoundedQueue<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundedQueue")
            .field("capacity", &self.inner.capacity)
            .field("policy", &self.inner.policy)
            .field("len", &self.len())
            .finish()
    }
}

impl<T> BoundedQueue<T> {
    /// Create a queue holding at most `capacity` items (at least one).
    #[must_use]
    pub fn new(capacity: usize, policy: OverflowPolicy) -> Self {
        let capacity = capacity.max(1);
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(State {
                    items: VecDeque::with_capacity(capacity.min(DEFAULT_CAPACITY)),
                    closed: false,
                    dropped: 0,
                }),
                not_full: Condvar::new(),
                capacity,
                policy,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State<T>> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Queue `item`, applying the overflow policy when full.
    ///
    /// # Errors
    ///
    /// Returns [`QueueClosed`] if the queue was closed, including while
    /// waiting for room.
    pub fn push(&self, item: T) -> Result<PushOutcome, QueueClosed> {
        let mut state = self.lock();
        loop {
            if state.closed {
                return Err(QueueClosed);
            }
            if state.items.len() < self.inner.capacity {
                state.items.push_back(item);
                return Ok(PushOutcome::Queued);
            }
            match self.inner.policy {
                OverflowPolicy::Block => {
                    state = self
                        .inner
                        .not_full
                        .wait(state)
                        .unwrap_or_else(PoisonError::into_inner);
                }
                OverflowPolicy::DropOldest => {
                    state.items.pop_front();
                    state.dropped += 1;
                    state.items.push_back(item);
                    return Ok(PushOutcome::DroppedOldest);
                }
            }
        }
    }

    /// Take up to `max` items, oldest first. Never blocks.
    pub fn drain(&self, max: usize) -> Vec<T> {
        let mut state = self.lock();
        let count = max.min(state.items.len());
        let batch: Vec<T> = state.items.drain(..count).collect();
        if !batch.is_empty() {
            self.inner.not_full.notify_all();
        }
        batch
    }

    /// Reject further pushes and wake blocked producers. Queued items stay
    /// available to `drain`.
    pub fn close(&self) {
        self.lock().closed = true;
        self.inner.not_full.notify_all();
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().items.is_empty()
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.inner.capacity
    }

    #[must_use]
    pub fn policy(&self) -> OverflowPolicy {
        self.inner.policy
    }

    /// Items discarded under [`OverflowPolicy::DropOldest`].
    #[must_use]
    pub fn dropped(&self) -> u64 {
        self.lock().dropped
    }
}

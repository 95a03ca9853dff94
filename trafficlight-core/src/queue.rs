//! Blocking message queue
//!
//! An unbounded FIFO guarded by a `Mutex` with a `Condvar` that wakes
//! receivers when an element arrives. Values are moved in by [`send`] and
//! moved out by exactly one [`receive`]; nothing is copied, duplicated or
//! dropped on the way through.
//!
//! The queue is a hand-off channel, not a broadcast: with several receivers
//! each value goes to whichever receiver wins the lock first.
//!
//! [`send`]: MessageQueue::send
//! [`receive`]: MessageQueue::receive

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Thread-safe FIFO with a blocking receive.
///
/// Share it between threads behind an `Arc`. Any number of threads may call
/// [`send`](Self::send) and [`receive`](Self::receive) concurrently.
pub struct MessageQueue<T> {
    /// Queued values, oldest at the front. Only touched with the lock held.
    items: Mutex<VecDeque<T>>,
    /// Signalled once per `send` to wake a single waiting receiver.
    available: Condvar,
}

impl<T> MessageQueue<T> {
    /// Creates an empty queue.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            items: Mutex::new(VecDeque::new()),
            available: Condvar::new(),
        }
    }

    /// Acquires the item lock.
    ///
    /// A panic in another thread cannot leave the `VecDeque` half-mutated
    /// (every critical section is a single push or pop), so a poisoned lock
    /// is recovered instead of propagated.
    fn lock(&self) -> MutexGuard<'_, VecDeque<T>> {
        self.items.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Appends `value` to the back of the queue and wakes one receiver.
    ///
    /// Never blocks beyond the lock acquisition and never fails.
    pub fn send(&self, value: T) {
        {
            let mut items = self.lock();
            items.push_back(value);
        }
        self.available.notify_one();
    }

    /// Removes and returns the oldest value, blocking until one is available.
    ///
    /// The wait re-checks the queue on every wakeup, so spurious wakeups and
    /// receivers racing for the same element are handled by waiting again.
    /// There is no timeout: the call returns only after some `send`.
    pub fn receive(&self) -> T {
        let mut items = self.lock();
        loop {
            if let Some(value) = items.pop_front() {
                return value;
            }
            items = self
                .available
                .wait(items)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Like [`receive`](Self::receive), but gives up after `timeout`.
    ///
    /// Returns `None` if the queue stayed empty for the whole timeout. A zero
    /// timeout behaves like [`try_receive`](Self::try_receive).
    pub fn receive_timeout(&self, timeout: Duration) -> Option<T> {
        let Some(deadline) = Instant::now().checked_add(timeout) else {
            return Some(self.receive());
        };

        let mut items = self.lock();
        loop {
            if let Some(value) = items.pop_front() {
                return Some(value);
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return None;
            }
            let (guard, _) = self
                .available
                .wait_timeout(items, remaining)
                .unwrap_or_else(PoisonError::into_inner);
            items = guard;
        }
    }

    /// Removes and returns the oldest value without waiting.
    pub fn try_receive(&self) -> Option<T> {
        self.lock().pop_front()
    }

    /// Removes every queued value, oldest first.
    pub fn drain(&self) -> Vec<T> {
        self.lock().drain(..).collect()
    }

    /// Returns the number of queued values at the moment of the call.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns `true` if nothing is queued at the moment of the call.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

impl<T> Default for MessageQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for MessageQueue<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageQueue")
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}

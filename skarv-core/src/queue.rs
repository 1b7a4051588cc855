//! Minimal thread-safe FIFO queue.
//!
//! Blocking consumers park on a condvar until a producer pushes. The queue
//! knows nothing about shutdown; owners that need to terminate a consumer
//! push a sentinel value of the element type instead (see the worker pool
//! and the pipeline dispatcher).

use std::collections::VecDeque;

use parking_lot::{Condvar, Mutex};

/// Unbounded thread-safe FIFO.
pub struct BlockingQueue<T> {
    items: Mutex<VecDeque<T>>,
    available: Condvar,
}

impl<T> BlockingQueue<T> {
    pub fn new() -> Self {
        Self {
            items: Mutex::new(VecDeque::new()),
            available: Condvar::new(),
        }
    }

    /// Appends `value` and wakes at most one blocked consumer.
    pub fn push(&self, value: T) {
        {
            let mut items = self.items.lock();
            items.push_back(value);
        }
        // Notify after releasing the lock so the woken consumer does not
        // immediately contend with us.
        self.available.notify_one();
    }

    /// Blocks the calling thread until an element is available.
    pub fn pop(&self) -> T {
        let mut items = self.items.lock();
        loop {
            if let Some(value) = items.pop_front() {
                return value;
            }
            self.available.wait(&mut items);
        }
    }

    /// Returns the front element if one is queued right now.
    pub fn try_pop(&self) -> Option<T> {
        self.items.lock().pop_front()
    }

    /// Current queue depth.
    ///
    /// Advisory only: stale the instant it is read under concurrent
    /// modification. Meant for diagnostics, never for control flow.
    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.lock().is_empty()
    }

    /// Drops every queued element.
    pub fn clear(&self) {
        self.items.lock().clear();
    }
}

impl<T> Default for BlockingQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

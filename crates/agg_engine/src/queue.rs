//! Fixed-capacity ring buffer for concurrent producers and consumers.
//!
//! The ring allocates `capacity + 1` slots and leaves one deliberately
//! unused, so full and empty are distinguished by the head/tail indices
//! alone. `head` is the next write position, `tail` the next read
//! position: empty ⇔ `head == tail`, full ⇔ advancing `head` by one
//! (mod `capacity + 1`) would land on `tail`.
//!
//! Both indices sit behind a single mutex with condvars for the
//! capacity/data handoff. A full queue is backpressure, not an error: a
//! push parks on the condvar with a short timeout and re-checks capacity,
//! the closed flag, and the cancel token on every wake-up.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use contracts::PipelineError;
use tracing::trace;

/// How long a blocked push waits before re-checking the queue state.
const FULL_RECHECK: Duration = Duration::from_millis(50);

/// Cooperative cancellation flag shared across the pipeline.
///
/// Checked at every suspension point (the full-queue wait) so no worker
/// blocks forever when another part of the pipeline fails or the user
/// interrupts the run.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    /// Create a fresh, un-cancelled token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation has been requested.
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

struct RingState<T> {
    slots: Box<[Option<T>]>,
    /// Next write position
    head: usize,
    /// Next read position
    tail: usize,
    closed: bool,
}

impl<T> RingState<T> {
    #[inline]
    fn is_empty(&self) -> bool {
        self.head == self.tail
    }

    #[inline]
    fn is_full(&self) -> bool {
        (self.head + 1) % self.slots.len() == self.tail
    }

    #[inline]
    fn len(&self) -> usize {
        (self.head + self.slots.len() - self.tail) % self.slots.len()
    }
}

/// Bounded FIFO queue shared by all producers and all consumers.
///
/// FIFO order is preserved among items pushed by a single producer; no
/// global order across producers is guaranteed (and none is needed, the
/// downstream aggregation is commutative).
pub struct BoundedQueue<T> {
    capacity: usize,
    state: Mutex<RingState<T>>,
    space_free: Condvar,
    data_ready: Condvar,
    cancel: CancelToken,
}

impl<T> BoundedQueue<T> {
    /// Create a queue holding at most `capacity` items.
    ///
    /// `capacity` must be at least 1; the blueprint validator enforces
    /// this before a queue is ever built.
    pub fn new(capacity: usize, cancel: CancelToken) -> Self {
        assert!(capacity > 0, "queue capacity must be at least 1");

        let slots = (0..capacity + 1).map(|_| None).collect::<Vec<_>>();
        Self {
            capacity,
            state: Mutex::new(RingState {
                slots: slots.into_boxed_slice(),
                head: 0,
                tail: 0,
                closed: false,
            }),
            space_free: Condvar::new(),
            data_ready: Condvar::new(),
            cancel,
        }
    }

    /// Maximum number of unconsumed items.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Insert an item, waiting while the queue is full.
    ///
    /// # Errors
    /// `QueueClosed` once [`close`](Self::close) has been called,
    /// `Cancelled` once the cancel token fires.
    pub fn push(&self, item: T) -> Result<(), PipelineError> {
        let mut state = self.lock_state();

        loop {
            if state.closed {
                return Err(PipelineError::QueueClosed);
            }
            if self.cancel.is_cancelled() {
                return Err(PipelineError::Cancelled);
            }
            if !state.is_full() {
                break;
            }
            trace!(len = state.len(), "queue full, waiting for capacity");
            let (next, _timed_out) = self
                .space_free
                .wait_timeout(state, FULL_RECHECK)
                .unwrap_or_else(PoisonError::into_inner);
            state = next;
        }

        let head = state.head;
        state.slots[head] = Some(item);
        state.head = (head + 1) % state.slots.len();
        drop(state);

        self.data_ready.notify_one();
        Ok(())
    }

    /// Remove the oldest unconsumed item without blocking.
    ///
    /// Returns `None` when the queue is empty at this instant, which says
    /// nothing about producers still being mid-flight.
    pub fn try_pop(&self) -> Option<T> {
        let mut state = self.lock_state();

        if state.is_empty() {
            return None;
        }

        let tail = state.tail;
        let item = state.slots[tail].take();
        debug_assert!(item.is_some(), "occupied ring slot was empty");
        state.tail = (tail + 1) % state.slots.len();
        drop(state);

        self.space_free.notify_one();
        item
    }

    /// Park until data arrives, the queue closes, or `timeout` elapses.
    ///
    /// Returns true when the queue is non-empty or closed. Consumers call
    /// this between polls so the polling termination design does not burn
    /// CPU while producers are mid-flight.
    pub fn wait_for_data(&self, timeout: Duration) -> bool {
        let state = self.lock_state();
        if !state.is_empty() || state.closed {
            return true;
        }
        let (state, _timed_out) = self
            .data_ready
            .wait_timeout(state, timeout)
            .unwrap_or_else(PoisonError::into_inner);
        !state.is_empty() || state.closed
    }

    /// Close the queue: pending and future pushes fail, waiters wake.
    ///
    /// Draining through [`try_pop`](Self::try_pop) remains allowed.
    pub fn close(&self) {
        let mut state = self.lock_state();
        state.closed = true;
        drop(state);
        self.space_free.notify_all();
        self.data_ready.notify_all();
    }

    /// Whether the queue has been closed.
    pub fn is_closed(&self) -> bool {
        self.lock_state().closed
    }

    /// Number of unconsumed items at this instant.
    pub fn len(&self) -> usize {
        self.lock_state().len()
    }

    /// Whether the queue is empty at this instant.
    pub fn is_empty(&self) -> bool {
        self.lock_state().is_empty()
    }

    fn lock_state(&self) -> MutexGuard<'_, RingState<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T> std::fmt::Debug for BoundedQueue<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock_state();
        f.debug_struct("BoundedQueue")
            .field("capacity", &self.capacity)
            .field("len", &state.len())
            .field("closed", &state.closed)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_fifo_order() {
        let queue = BoundedQueue::new(10, CancelToken::new());

        for i in 0..5 {
            queue.push(i).unwrap();
        }
        for i in 0..5 {
            assert_eq!(queue.try_pop(), Some(i));
        }
        assert_eq!(queue.try_pop(), None);
    }

    #[test]
    fn test_try_pop_empty_returns_none() {
        let queue: BoundedQueue<u32> = BoundedQueue::new(4, CancelToken::new());
        assert_eq!(queue.try_pop(), None);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_wrap_around() {
        let queue = BoundedQueue::new(2, CancelToken::new());

        // Push/pop enough times to wrap the indices several times over
        for round in 0..10 {
            queue.push(round * 2).unwrap();
            queue.push(round * 2 + 1).unwrap();
            assert_eq!(queue.len(), 2);
            assert_eq!(queue.try_pop(), Some(round * 2));
            assert_eq!(queue.try_pop(), Some(round * 2 + 1));
        }
    }

    #[test]
    fn test_push_blocks_until_capacity_frees() {
        let queue = Arc::new(BoundedQueue::new(1, CancelToken::new()));
        queue.push(1u32).unwrap();

        let q = Arc::clone(&queue);
        let pusher = thread::spawn(move || q.push(2));

        // The pusher must wait for the pop below
        thread::sleep(Duration::from_millis(20));
        assert_eq!(queue.len(), 1);

        assert_eq!(queue.try_pop(), Some(1));
        pusher.join().unwrap().unwrap();
        assert_eq!(queue.try_pop(), Some(2));
    }

    #[test]
    fn test_close_fails_blocked_push() {
        let queue = Arc::new(BoundedQueue::new(1, CancelToken::new()));
        queue.push(1u32).unwrap();

        let q = Arc::clone(&queue);
        let pusher = thread::spawn(move || q.push(2));

        thread::sleep(Duration::from_millis(20));
        queue.close();

        let result = pusher.join().unwrap();
        assert!(matches!(result, Err(PipelineError::QueueClosed)));

        // Draining is still allowed after close
        assert_eq!(queue.try_pop(), Some(1));
    }

    #[test]
    fn test_cancel_fails_blocked_push() {
        let cancel = CancelToken::new();
        let queue = Arc::new(BoundedQueue::new(1, cancel.clone()));
        queue.push(1u32).unwrap();

        let q = Arc::clone(&queue);
        let pusher = thread::spawn(move || q.push(2));

        thread::sleep(Duration::from_millis(20));
        cancel.cancel();

        let result = pusher.join().unwrap();
        assert!(matches!(result, Err(PipelineError::Cancelled)));
    }

    #[test]
    fn test_occupancy_never_exceeds_capacity() {
        for capacity in [1usize, 16, 100] {
            let queue = Arc::new(BoundedQueue::new(capacity, CancelToken::new()));
            let total = 2_000u32;

            let producers: Vec<_> = (0..4)
                .map(|_| {
                    let q = Arc::clone(&queue);
                    thread::spawn(move || {
                        for i in 0..total / 4 {
                            q.push(i).unwrap();
                        }
                    })
                })
                .collect();

            let q = Arc::clone(&queue);
            let consumer = thread::spawn(move || {
                let mut seen = 0;
                while seen < total {
                    // Sampled occupancy must stay within the bound
                    assert!(q.len() <= capacity, "capacity {capacity} exceeded");
                    if q.try_pop().is_some() {
                        seen += 1;
                    } else {
                        q.wait_for_data(Duration::from_millis(5));
                    }
                }
            });

            for p in producers {
                p.join().unwrap();
            }
            consumer.join().unwrap();
            assert!(queue.is_empty());
        }
    }

    #[test]
    fn test_wait_for_data_wakes_on_push() {
        let queue = Arc::new(BoundedQueue::new(4, CancelToken::new()));

        let q = Arc::clone(&queue);
        let waiter = thread::spawn(move || q.wait_for_data(Duration::from_secs(5)));

        thread::sleep(Duration::from_millis(20));
        queue.push(9u32).unwrap();

        assert!(waiter.join().unwrap());
    }
}

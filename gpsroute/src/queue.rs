//! Thread-safe bounded double-ended queue.
//!
//! A capacity of zero means unbounded. When the queue is full a push
//! either blocks until space frees up (`wait = true`) or evicts an item
//! from the opposite end (`wait = false`):
//!
//! ```text
//!   push_front(x, false) on full [a b c]  ->  [x a b]   (c evicted)
//!   push_back(x, false)  on full [a b c]  ->  [b c x]   (a evicted)
//! ```
//!
//! Pops block until an item is available or the timeout expires.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex, MutexGuard};

#[derive(Debug)]
pub struct BoundedQueue<T> {
    state: Mutex<QueueState<T>>,
    changed: Condvar,
}

#[derive(Debug)]
struct QueueState<T> {
    items: VecDeque<T>,
    max_size: usize,
}

impl<T> QueueState<T> {
    fn is_full(&self) -> bool {
        self.max_size != 0 && self.items.len() >= self.max_size
    }
}

#[derive(Clone, Copy)]
enum End {
    Front,
    Back,
}

impl<T> Default for BoundedQueue<T> {
    fn default() -> Self {
        Self::unbounded()
    }
}

impl<T> BoundedQueue<T> {
    /// Creates a queue holding at most `max_size` items (0 = unbounded).
    pub fn new(max_size: usize) -> Self {
        Self {
            state: Mutex::new(QueueState {
                items: VecDeque::new(),
                max_size,
            }),
            changed: Condvar::new(),
        }
    }

    pub fn unbounded() -> Self {
        Self::new(0)
    }

    pub fn push_front(&self, item: T, wait: bool) {
        self.push(item, wait, End::Front);
    }

    pub fn push_back(&self, item: T, wait: bool) {
        self.push(item, wait, End::Back);
    }

    /// Removes the front item, waiting up to `timeout`.
    pub fn pop_front(&self, timeout: Duration) -> Option<T> {
        self.pop(Some(timeout), End::Front)
    }

    /// Removes the back item, waiting up to `timeout`.
    pub fn pop_back(&self, timeout: Duration) -> Option<T> {
        self.pop(Some(timeout), End::Back)
    }

    pub fn try_pop_front(&self) -> Option<T> {
        self.pop(None, End::Front)
    }

    pub fn try_pop_back(&self) -> Option<T> {
        self.pop(None, End::Back)
    }

    pub fn size(&self) -> usize {
        self.state.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().items.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.state.lock().is_full()
    }

    pub fn max_size(&self) -> usize {
        self.state.lock().max_size
    }

    /// Changes the capacity, dropping items from the back until they fit.
    pub fn resize(&self, max_size: usize) {
        let mut state = self.state.lock();
        state.max_size = max_size;
        if max_size != 0 {
            state.items.truncate(max_size);
        }
        drop(state);
        self.changed.notify_all();
    }

    pub fn clear(&self) {
        self.state.lock().items.clear();
        self.changed.notify_all();
    }

    fn push(&self, item: T, wait: bool, end: End) {
        let mut state = self.state.lock();
        if state.is_full() {
            if wait {
                self.wait_for_space(&mut state);
            } else {
                match end {
                    End::Front => state.items.pop_back(),
                    End::Back => state.items.pop_front(),
                };
            }
        }
        match end {
            End::Front => state.items.push_front(item),
            End::Back => state.items.push_back(item),
        }
        drop(state);
        self.changed.notify_all();
    }

    fn wait_for_space(&self, state: &mut MutexGuard<'_, QueueState<T>>) {
        while state.is_full() {
            self.changed.wait(state);
        }
    }

    fn pop(&self, timeout: Option<Duration>, end: End) -> Option<T> {
        let mut state = self.state.lock();

        if let Some(timeout) = timeout {
            match Instant::now().checked_add(timeout) {
                Some(deadline) => {
                    while state.items.is_empty() {
                        if self.changed.wait_until(&mut state, deadline).timed_out() {
                            break;
                        }
                    }
                }
                None => {
                    while state.items.is_empty() {
                        self.changed.wait(&mut state);
                    }
                }
            }
        }

        let item = match end {
            End::Front => state.items.pop_front(),
            End::Back => state.items.pop_back(),
        };
        drop(state);
        if item.is_some() {
            self.changed.notify_all();
        }
        item
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_zero_capacity_is_unbounded() {
        let queue = BoundedQueue::new(0);
        for i in 0..1000 {
            queue.push_back(i, true);
        }
        assert_eq!(queue.size(), 1000);
        assert!(!queue.is_full());
    }

    #[test]
    fn test_push_front_evicts_back_when_full() {
        let queue = BoundedQueue::new(3);
        queue.push_back('a', false);
        queue.push_back('b', false);
        queue.push_back('c', false);
        assert!(queue.is_full());

        queue.push_front('x', false);
        assert_eq!(queue.size(), 3);
        assert_eq!(queue.try_pop_front(), Some('x'));
        assert_eq!(queue.try_pop_front(), Some('a'));
        assert_eq!(queue.try_pop_front(), Some('b'));
        assert_eq!(queue.try_pop_front(), None);
    }

    #[test]
    fn test_push_back_evicts_front_when_full() {
        let queue = BoundedQueue::new(3);
        for c in ['a', 'b', 'c'] {
            queue.push_back(c, false);
        }
        queue.push_back('x', false);
        assert_eq!(queue.try_pop_front(), Some('b'));
        assert_eq!(queue.try_pop_back(), Some('x'));
        assert_eq!(queue.try_pop_back(), Some('c'));
    }

    #[test]
    fn test_capacity_one_replaces_pending() {
        let queue = BoundedQueue::new(1);
        queue.push_front(1, false);
        queue.push_front(2, false);
        queue.push_front(3, false);
        assert_eq!(queue.size(), 1);
        assert_eq!(queue.try_pop_front(), Some(3));
    }

    #[test]
    fn test_pop_timeout_on_empty() {
        let queue: BoundedQueue<u32> = BoundedQueue::new(4);
        let start = Instant::now();
        assert_eq!(queue.pop_front(Duration::from_millis(30)), None);
        assert!(start.elapsed() >= Duration::from_millis(30));
    }

    #[test]
    fn test_blocked_pop_wakes_on_push() {
        let queue = Arc::new(BoundedQueue::new(4));
        let consumer = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || queue.pop_front(Duration::from_secs(5)))
        };

        thread::sleep(Duration::from_millis(20));
        queue.push_back(42, false);
        assert_eq!(consumer.join().unwrap(), Some(42));
    }

    #[test]
    fn test_unbounded_timeout_waits_without_deadline() {
        let queue = Arc::new(BoundedQueue::new(4));
        queue.push_back(1, false);
        assert_eq!(queue.pop_front(Duration::MAX), Some(1));

        let consumer = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || queue.pop_back(Duration::MAX))
        };
        thread::sleep(Duration::from_millis(20));
        queue.push_front(7, false);
        assert_eq!(consumer.join().unwrap(), Some(7));
    }

    #[test]
    fn test_blocked_push_wakes_on_pop() {
        let queue = Arc::new(BoundedQueue::new(1));
        queue.push_back(1, true);

        let producer = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || queue.push_back(2, true))
        };

        thread::sleep(Duration::from_millis(20));
        assert_eq!(queue.size(), 1);
        assert_eq!(queue.try_pop_front(), Some(1));
        producer.join().unwrap();
        assert_eq!(queue.try_pop_front(), Some(2));
    }

    #[test]
    fn test_resize_drops_from_back() {
        let queue = BoundedQueue::new(0);
        for i in 0..5 {
            queue.push_back(i, false);
        }
        queue.resize(2);
        assert_eq!(queue.max_size(), 2);
        assert_eq!(queue.size(), 2);
        assert_eq!(queue.try_pop_front(), Some(0));
        assert_eq!(queue.try_pop_front(), Some(1));
    }

    #[test]
    fn test_clear() {
        let queue = BoundedQueue::new(2);
        queue.push_back(1, false);
        queue.push_back(2, false);
        queue.clear();
        assert!(queue.is_empty());
        assert!(!queue.is_full());
    }

    #[test]
    fn test_concurrent_producers_respect_capacity() {
        let queue = Arc::new(BoundedQueue::new(8));
        let producers: Vec<_> = (0..4)
            .map(|p| {
                let queue = Arc::clone(&queue);
                thread::spawn(move || {
                    for i in 0..50 {
                        queue.push_back(p * 100 + i, true);
                    }
                })
            })
            .collect();

        let mut received = 0;
        while received < 200 {
            assert!(queue.size() <= 8);
            if queue.pop_front(Duration::from_secs(5)).is_some() {
                received += 1;
            }
        }
        for producer in producers {
            producer.join().unwrap();
        }
        assert!(queue.is_empty());
    }
}

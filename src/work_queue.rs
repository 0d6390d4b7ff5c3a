use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

/// Mutex-guarded FIFO used to hand work from I/O threads to the update loop.
///
/// Any number of threads may `push`. The consumer either polls one task at a
/// time with `pop` or takes a whole batch with `drain_pending`; neither call
/// ever waits for work to show up. The room's update loop drains in batches so
/// that work queued mid-batch lands on the next tick, which leaves `pop` and
/// `is_empty` as the single-item consumer API for other consumers and tests.
pub struct WorkQueue<T> {
    tasks: Mutex<VecDeque<T>>,
}

impl<T> Default for WorkQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> WorkQueue<T> {
    pub fn new() -> Self {
        Self {
            tasks: Mutex::new(VecDeque::new()),
        }
    }

    // A panicking pusher cannot leave a VecDeque half-modified, so a poisoned
    // lock still guards valid data.
    fn lock(&self) -> MutexGuard<'_, VecDeque<T>> {
        self.tasks.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn push(&self, task: T) {
        self.lock().push_back(task);
    }

    /// Removes the oldest task, or returns `None` right away if there is none.
    #[allow(dead_code)]
    pub fn pop(&self) -> Option<T> {
        self.lock().pop_front()
    }

    /// Takes every task queued so far in one lock acquisition.
    ///
    /// Tasks pushed after this returns (including ones pushed by the tasks in
    /// the returned batch) are left for the next call.
    pub fn drain_pending(&self) -> VecDeque<T> {
        std::mem::take(&mut *self.lock())
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    #[test]
    fn pops_in_push_order() {
        let queue = WorkQueue::new();
        for i in 0..100 {
            queue.push(i);
        }
        let popped: Vec<i32> = std::iter::from_fn(|| queue.pop()).collect();
        assert_eq!(popped, (0..100).collect::<Vec<_>>());
        assert!(queue.is_empty());
    }

    #[test]
    fn pop_on_empty_returns_none_immediately() {
        let queue: WorkQueue<String> = WorkQueue::new();
        assert!(queue.pop().is_none());
        assert!(queue.pop().is_none());
        assert_eq!(queue.len(), 0);
    }

    #[test]
    fn multi_producer_pushes_keep_per_producer_order() {
        let queue = Arc::new(WorkQueue::new());
        let handles: Vec<_> = (0..4u32)
            .map(|producer| {
                let queue = queue.clone();
                std::thread::spawn(move || {
                    for seq in 0..250u32 {
                        queue.push((producer, seq));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().expect("producer thread");
        }

        let mut last_seen = [None::<u32>; 4];
        while let Some((producer, seq)) = queue.pop() {
            let slot = &mut last_seen[producer as usize];
            if let Some(prev) = *slot {
                assert!(seq > prev, "producer {producer} out of order");
            }
            *slot = Some(seq);
        }
        assert!(last_seen.iter().all(|s| *s == Some(249)));
    }

    #[test]
    fn concurrent_producers_and_consumer_lose_and_duplicate_nothing() {
        const PRODUCERS: usize = 8;
        const PER_PRODUCER: usize = 1000;

        let queue = Arc::new(WorkQueue::new());
        let producers_done = Arc::new(AtomicBool::new(false));

        let consumer = {
            let queue = queue.clone();
            let producers_done = producers_done.clone();
            std::thread::spawn(move || {
                let mut seen = HashSet::new();
                loop {
                    let finished = producers_done.load(Ordering::Acquire);
                    let mut got_any = false;
                    while let Some(task) = queue.pop() {
                        got_any = true;
                        assert!(seen.insert(task), "task {task} observed twice");
                    }
                    if finished && !got_any {
                        break;
                    }
                    std::thread::yield_now();
                }
                seen
            })
        };

        let producers: Vec<_> = (0..PRODUCERS)
            .map(|p| {
                let queue = queue.clone();
                std::thread::spawn(move || {
                    for i in 0..PER_PRODUCER {
                        queue.push(p * PER_PRODUCER + i);
                    }
                })
            })
            .collect();
        for producer in producers {
            producer.join().expect("producer thread");
        }
        producers_done.store(true, Ordering::Release);

        let seen = consumer.join().expect("consumer thread");
        assert_eq!(seen.len(), PRODUCERS * PER_PRODUCER);
        assert!(queue.is_empty());
    }

    #[test]
    fn drain_pending_takes_snapshot_and_leaves_later_pushes() {
        let queue = WorkQueue::new();
        queue.push("a");
        queue.push("b");

        let batch = queue.drain_pending();
        queue.push("c");

        assert_eq!(batch.into_iter().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.pop(), Some("c"));
    }

    #[test]
    fn draining_an_empty_queue_twice_is_a_no_op() {
        let queue: WorkQueue<u8> = WorkQueue::new();
        assert!(queue.drain_pending().is_empty());
        assert!(queue.drain_pending().is_empty());
        assert!(queue.is_empty());
    }

    #[test]
    fn poisoned_lock_still_accepts_work() {
        let queue = Arc::new(WorkQueue::new());
        queue.push(1);
        let poisoner = queue.clone();
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.tasks.lock().expect("lock");
            panic!("poison the queue");
        })
        .join();

        queue.push(2);
        assert_eq!(queue.pop(), Some(1));
        assert_eq!(queue.pop(), Some(2));
    }
}

//! Fixed-size worker pool with poison-pill shutdown.
//!
//! Fire-and-forget tasks only: no futures, no results. The pool owns the
//! worker lifecycle and the shutdown protocol; the underlying queue stays
//! generic and lifecycle-free. Termination is signalled by pushing one
//! `None` per worker, so every worker observes exactly one pill and no
//! queued task ahead of the pills is lost.
//!
//! Pools are not restartable: after `shutdown` the owner replaces the
//! whole value with a fresh instance instead of resurrecting this one.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use parking_lot::Mutex;
use tracing::{debug, error, warn};

use crate::queue::BlockingQueue;

type Task = Box<dyn FnOnce() + Send + 'static>;

pub struct WorkerPool {
    tasks: Arc<BlockingQueue<Option<Task>>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    stopped: AtomicBool,
}

impl WorkerPool {
    /// Starts a pool with `threads` workers; at least one is always created.
    pub fn new(threads: usize) -> Self {
        let count = threads.max(1);
        let tasks = Arc::new(BlockingQueue::new());

        debug!(count, "starting worker threads");
        let workers = (0..count)
            .map(|i| {
                let tasks = Arc::clone(&tasks);
                thread::Builder::new()
                    .name(format!("skarv-worker-{i}"))
                    .spawn(move || worker_loop(&tasks))
                    .expect("failed to spawn worker thread")
            })
            .collect();

        Self {
            tasks,
            workers: Mutex::new(workers),
            stopped: AtomicBool::new(false),
        }
    }

    /// Enqueues `task` for asynchronous execution.
    ///
    /// Tasks submitted once shutdown has begun are silently dropped.
    pub fn submit<F>(&self, task: F)
    where
        F: FnOnce() + Send + 'static,
    {
        if self.stopped.load(Ordering::SeqCst) {
            return;
        }
        self.tasks.push(Some(Box::new(task)));
    }

    /// Stops accepting tasks, drains everything already queued, and joins
    /// all workers.
    ///
    /// Idempotent and safe to call from any number of threads at once;
    /// the swap ensures exactly one caller performs the teardown.
    pub fn shutdown(&self) {
        if self.stopped.swap(true, Ordering::SeqCst) {
            return;
        }

        let mut workers = self.workers.lock();
        for _ in 0..workers.len() {
            self.tasks.push(None);
        }
        for handle in workers.drain(..) {
            if handle.join().is_err() {
                warn!("worker thread panicked before exit");
            }
        }
        debug!("worker pool shut down");
    }

    /// True once shutdown has begun. Owners use this to lazily replace a
    /// dead pool before the next start.
    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn worker_loop(tasks: &BlockingQueue<Option<Task>>) {
    debug!("worker thread started");
    // `None` is the poison pill.
    while let Some(task) = tasks.pop() {
        if panic::catch_unwind(AssertUnwindSafe(task)).is_err() {
            // One bad task never takes the worker down with it.
            error!("task panicked; worker continuing");
        }
    }
    debug!("worker thread exiting");
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::thread;

    use super::WorkerPool;

    #[test]
    fn runs_every_submitted_task() {
        let pool = WorkerPool::new(4);
        let counter = Arc::new(AtomicUsize::new(0));

        for _ in 0..100 {
            let counter = Arc::clone(&counter);
            pool.submit(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        }
        pool.shutdown();

        assert_eq!(counter.load(Ordering::SeqCst), 100);
    }

    #[test]
    fn zero_threads_requested_still_runs_tasks() {
        let pool = WorkerPool::new(0);
        let counter = Arc::new(AtomicUsize::new(0));

        let c = Arc::clone(&counter);
        pool.submit(move || {
            c.fetch_add(1, Ordering::SeqCst);
        });
        pool.shutdown();

        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn panicking_task_does_not_kill_the_worker() {
        let pool = WorkerPool::new(1);
        let counter = Arc::new(AtomicUsize::new(0));

        pool.submit(|| panic!("boom"));
        let c = Arc::clone(&counter);
        pool.submit(move || {
            c.fetch_add(1, Ordering::SeqCst);
        });
        pool.shutdown();

        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn submissions_after_shutdown_are_dropped() {
        let pool = WorkerPool::new(2);
        let counter = Arc::new(AtomicUsize::new(0));

        pool.shutdown();
        assert!(pool.is_stopped());

        let c = Arc::clone(&counter);
        pool.submit(move || {
            c.fetch_add(1, Ordering::SeqCst);
        });

        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn concurrent_shutdown_is_idempotent() {
        let pool = Arc::new(WorkerPool::new(4));
        let counter = Arc::new(AtomicUsize::new(0));

        for _ in 0..50 {
            let counter = Arc::clone(&counter);
            pool.submit(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        }

        let callers: Vec<_> = (0..8)
            .map(|_| {
                let pool = Arc::clone(&pool);
                thread::spawn(move || pool.shutdown())
            })
            .collect();
        for caller in callers {
            caller.join().unwrap();
        }

        assert!(pool.is_stopped());
        assert_eq!(counter.load(Ordering::SeqCst), 50);
    }
}

use std::cell::Cell;
use std::collections::BTreeMap;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::{Condvar, Mutex};

use crate::progress::{ProgressAggregator, ProgressHandler, ProgressReporter};
use crate::WorkItem;

thread_local! {
    /// Bumped around running a job so that work submitted recursively from
    /// within another work item is scheduled at a higher effective
    /// priority -- children drain before their parent's siblings, which is
    /// what keeps recursive `parallel_for` calls from unbounded queue growth.
    static RECURSION_DEPTH: Cell<i64> = const { Cell::new(0) };
}

struct QueuedJob {
    reserve_memory: usize,
    run: Box<dyn FnOnce() + Send>,
}

struct PoolState {
    queues: BTreeMap<i64, VecDeque<QueuedJob>>,
}

struct Shared {
    state: Mutex<PoolState>,
    not_empty: Condvar,
    memory_limit: AtomicUsize,
    reserved: AtomicUsize,
    shutdown: AtomicBool,
}

impl Shared {
    fn push(&self, priority: i64, job: QueuedJob) {
        let mut state = self.state.lock();
        state.queues.entry(priority).or_default().push_back(job);
        self.not_empty.notify_all();
    }

    /// Pop the highest-priority runnable job. Returns `None` immediately if
    /// the queue is empty (callers poll or sleep-and-retry rather than
    /// blocking here, since "empty" doesn't mean "no more work is coming").
    /// If the queue is non-empty but the head job doesn't fit the memory
    /// budget, this blocks until either more memory frees up or new work
    /// arrives. "Runnable" means its `reserve_memory` plus what's already
    /// reserved fits the current limit; if nothing is reserved yet and a
    /// single job's requirement alone exceeds the limit, the limit is
    /// raised (with a warning) rather than deadlocking.
    fn pop_runnable(&self) -> Option<QueuedJob> {
        let mut state = self.state.lock();
        loop {
            if let Some((&priority, queue)) = state.queues.iter_mut().next_back() {
                let reserve = queue.front().map(|j| j.reserve_memory).unwrap_or(0);
                let limit = self.memory_limit.load(Ordering::Relaxed);
                let reserved = self.reserved.load(Ordering::Relaxed);
                if reserve > limit {
                    log::warn!(
                        "thread-pool: raising memory limit from {limit} to {reserve} bytes to admit a work item that reserves more than the configured ceiling"
                    );
                    self.memory_limit.store(reserve, Ordering::Relaxed);
                }
                let limit = self.memory_limit.load(Ordering::Relaxed);
                if reserved == 0 || reserved + reserve <= limit {
                    let job = queue.pop_front().expect("front checked above");
                    if queue.is_empty() {
                        state.queues.remove(&priority);
                    }
                    self.reserved.fetch_add(reserve, Ordering::Relaxed);
                    return Some(job);
                }
            } else {
                return None;
            }
            self.not_empty.wait(&mut state);
        }
    }

    fn release(&self, reserve: usize) {
        self.reserved.fetch_sub(reserve, Ordering::Relaxed);
        self.not_empty.notify_all();
    }
}

/// Priority-ordered, memory-budget-aware work-stealing thread pool.
///
/// All worker threads and any caller blocked in [`ThreadPool::execute_worklist`]
/// share the same queue: callers don't just wait, they help drain it, which
/// is what lets a single-threaded test or a `--jobs 1` run still make
/// progress.
pub struct ThreadPool {
    shared: Arc<Shared>,
    _workers: Vec<std::thread::JoinHandle<()>>,
}

impl ThreadPool {
    #[must_use]
    pub fn new(num_threads: usize, memory_limit: usize) -> Self {
        let shared = Arc::new(Shared {
            state: Mutex::new(PoolState { queues: BTreeMap::new() }),
            not_empty: Condvar::new(),
            memory_limit: AtomicUsize::new(memory_limit),
            reserved: AtomicUsize::new(0),
            shutdown: AtomicBool::new(false),
        });
        let workers = (0..num_threads)
            .map(|i| {
                let shared = Arc::clone(&shared);
                std::thread::Builder::new()
                    .name(format!("biograph-pool-{i}"))
                    .spawn(move || worker_loop(&shared))
                    .expect("failed to spawn thread-pool worker")
            })
            .collect();
        ThreadPool { shared, _workers: workers }
    }

    #[must_use]
    pub fn new_from_cpus() -> Self {
        // Default ceiling: callers that care set a real one via
        // `set_memory_limit`; usize::MAX effectively disables back-pressure
        // until then.
        ThreadPool::new(num_cpus::get().max(1), usize::MAX)
    }

    pub fn set_memory_limit(&self, bytes: usize) {
        self.shared.memory_limit.store(bytes, Ordering::Relaxed);
        self.shared.not_empty.notify_all();
    }

    #[must_use]
    pub fn memory_limit(&self) -> usize {
        self.shared.memory_limit.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn reserved_bytes(&self) -> usize {
        self.shared.reserved.load(Ordering::Relaxed)
    }

    /// Submit every item in `work`, block until they've all completed (the
    /// calling thread helps process the shared queue rather than idling),
    /// and re-raise the first error encountered by any item.
    pub fn execute_worklist(&self, work: Vec<WorkItem>) -> anyhow::Result<()> {
        self.execute_worklist_with_progress(work, None)
    }

    pub fn execute_worklist_with_progress(
        &self,
        work: Vec<WorkItem>,
        on_progress: Option<ProgressHandler>,
    ) -> anyhow::Result<()> {
        if work.is_empty() {
            return Ok(());
        }

        let remaining = Arc::new(AtomicUsize::new(work.len()));
        let done = Arc::new((Mutex::new(false), Condvar::new()));
        let first_error: Arc<Mutex<Option<anyhow::Error>>> = Arc::new(Mutex::new(None));
        let aggregator = ProgressAggregator::new(work.iter().map(WorkItem::progress_weight).collect(), on_progress);

        let base_priority = RECURSION_DEPTH.with(Cell::get);
        let child_priority = base_priority + 1;

        for (index, item) in work.into_iter().enumerate() {
            let reserve_memory = item.reserve_memory;
            let remaining = Arc::clone(&remaining);
            let done = Arc::clone(&done);
            let first_error = Arc::clone(&first_error);
            let shared = Arc::clone(&self.shared);
            let aggregator = Arc::clone(&aggregator);
            let reporter = ProgressReporter::new(aggregator, index);

            let run: Box<dyn FnOnce() + Send> = Box::new(move || {
                RECURSION_DEPTH.with(|d| d.set(child_priority));
                let result = (item.run)(&reporter);
                RECURSION_DEPTH.with(|d| d.set(base_priority));
                if let Err(err) = result {
                    let mut slot = first_error.lock();
                    if slot.is_none() {
                        *slot = Some(err);
                    }
                }
                shared.release(reserve_memory);
                if remaining.fetch_sub(1, Ordering::AcqRel) == 1 {
                    let (lock, cvar) = &*done;
                    *lock.lock() = true;
                    cvar.notify_all();
                }
            });

            self.shared.push(child_priority, QueuedJob { reserve_memory, run });
        }

        // Help drain the shared queue instead of only waiting; this is what
        // makes a worklist submitted from a single-threaded caller (or from
        // inside another work item) actually run rather than deadlock
        // waiting on workers that might all be blocked on deeper recursion.
        loop {
            let (lock, cvar) = &*done;
            if *lock.lock() {
                break;
            }
            match self.shared.pop_runnable() {
                Some(job) => (job.run)(),
                None => {
                    let mut guard = lock.lock();
                    if !*guard {
                        cvar.wait(&mut guard);
                    }
                }
            }
        }

        let error = first_error.lock().take();
        match error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        self.shared.shutdown.store(true, Ordering::Relaxed);
        self.shared.not_empty.notify_all();
        for worker in self._workers.drain(..) {
            let _ = worker.join();
        }
    }
}

fn worker_loop(shared: &Arc<Shared>) {
    while !shared.shutdown.load(Ordering::Relaxed) {
        match shared.pop_runnable() {
            Some(job) => (job.run)(),
            None => std::thread::sleep(std::time::Duration::from_micros(200)),
        }
    }
}

//! A global, priority-ordered, memory-budget-aware work-stealing thread
//! pool. Every parallel hot path in the workspace (the expander's
//! partition passes, the k-mer counter's per-partition counting, the
//! tracer's per-scaffold-position searches) submits work here instead of
//! spawning its own threads.

mod part_states;
mod pool;
mod progress;

pub use part_states::{clear_state, set_state, snapshot as part_states_snapshot};
pub use pool::ThreadPool;
pub use progress::{ProgressAggregator, ProgressHandler, ProgressReporter};

use once_cell::sync::OnceCell;

static GLOBAL: OnceCell<ThreadPool> = OnceCell::new();

/// Access the process-wide pool, creating it sized from the CPU count on
/// first use.
pub fn global() -> &'static ThreadPool {
    GLOBAL.get_or_init(ThreadPool::new_from_cpus)
}

/// Initialize the process-wide pool with an explicit thread count and
/// memory ceiling, for callers (the CLI binaries' `--threads`/`--max-memory`
/// flags) that need non-default sizing. Best-effort: a no-op if [`global`]
/// was already reached by something else first, since [`OnceCell`] only
/// ever accepts its first write.
pub fn init(num_threads: usize, memory_limit: usize) {
    let _ = GLOBAL.set(ThreadPool::new(num_threads.max(1), memory_limit));
}

pub fn set_memory_limit(bytes: usize) {
    global().set_memory_limit(bytes);
}

/// One unit of work submitted to the pool: a closure taking a
/// [`ProgressReporter`] it can call zero or more times with its own
/// fractional completion, plus scheduling hints.
pub struct WorkItem {
    pub(crate) reserve_memory: usize,
    pub(crate) progress_part: f64,
    pub(crate) run: Box<dyn FnOnce(&ProgressReporter) -> anyhow::Result<()> + Send>,
}

impl WorkItem {
    pub fn new(run: impl FnOnce(&ProgressReporter) -> anyhow::Result<()> + Send + 'static) -> Self {
        WorkItem { reserve_memory: 0, progress_part: 1.0, run: Box::new(run) }
    }

    #[must_use]
    pub fn reserve_memory(mut self, bytes: usize) -> Self {
        self.reserve_memory = bytes;
        self
    }

    #[must_use]
    pub fn progress_part(mut self, weight: f64) -> Self {
        self.progress_part = weight;
        self
    }

    pub(crate) fn progress_weight(&self) -> f64 {
        self.progress_part
    }
}

/// Run `f(item)` for every item in `items` on the global pool, blocking
/// until all have completed and propagating the first error. This is the
/// `parallel_for` primitive recursive work submission goes through: calling
/// it from inside another work item is expected and bumps the effective
/// priority of the children so they finish before the parent's siblings.
pub fn parallel_for<T, F>(items: Vec<T>, f: F) -> anyhow::Result<()>
where
    T: Send + 'static,
    F: Fn(T) -> anyhow::Result<()> + Send + Sync + 'static,
{
    let f = std::sync::Arc::new(f);
    let work = items
        .into_iter()
        .map(|item| {
            let f = std::sync::Arc::clone(&f);
            WorkItem::new(move |_progress| f(item))
        })
        .collect();
    global().execute_worklist(work)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn execute_worklist_runs_everything() {
        let pool = ThreadPool::new(4, usize::MAX);
        let counter = Arc::new(AtomicUsize::new(0));
        let work = (0..100)
            .map(|_| {
                let counter = Arc::clone(&counter);
                WorkItem::new(move |_p| {
                    counter.fetch_add(1, Ordering::Relaxed);
                    Ok(())
                })
            })
            .collect();
        pool.execute_worklist(work).unwrap();
        assert_eq!(counter.load(Ordering::Relaxed), 100);
    }

    #[test]
    fn first_error_is_propagated() {
        let pool = ThreadPool::new(2, usize::MAX);
        let work = vec![
            WorkItem::new(|_p| Ok(())),
            WorkItem::new(|_p| anyhow::bail!("boom")),
            WorkItem::new(|_p| Ok(())),
        ];
        let err = pool.execute_worklist(work).unwrap_err();
        assert_eq!(err.to_string(), "boom");
    }

    #[test]
    fn recursive_submission_from_within_a_work_item_completes() {
        let pool = std::sync::Arc::new(ThreadPool::new(2, usize::MAX));
        let counter = Arc::new(AtomicUsize::new(0));
        let pool_clone = Arc::clone(&pool);
        let counter_clone = Arc::clone(&counter);
        let outer = vec![WorkItem::new(move |_p| {
            let inner = (0..10)
                .map(|_| {
                    let counter = Arc::clone(&counter_clone);
                    WorkItem::new(move |_p| {
                        counter.fetch_add(1, Ordering::Relaxed);
                        Ok(())
                    })
                })
                .collect();
            pool_clone.execute_worklist(inner)
        })];
        pool.execute_worklist(outer).unwrap();
        assert_eq!(counter.load(Ordering::Relaxed), 10);
    }

    #[test]
    fn memory_budget_never_deadlocks_on_oversized_item() {
        let pool = ThreadPool::new(2, 1024);
        let work = vec![WorkItem::new(|_p| Ok(())).reserve_memory(10 * 1024 * 1024)];
        pool.execute_worklist(work).unwrap();
        assert!(pool.memory_limit() >= 10 * 1024 * 1024);
    }

    #[test]
    fn parallel_for_runs_every_item() {
        let counter = Arc::new(AtomicUsize::new(0));
        let counter_clone = Arc::clone(&counter);
        parallel_for((0..50).collect(), move |_i: i32| {
            counter_clone.fetch_add(1, Ordering::Relaxed);
            Ok(())
        })
        .unwrap();
        assert_eq!(counter.load(Ordering::Relaxed), 50);
    }
}

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// A `fn(f64)`-style callback invoked with monotonically non-decreasing
/// values in `[0, 1]` as a worklist progresses. The pool owns fan-in:
/// individual work items report their own fractional completion, weighted
/// by `progress_part`, and the aggregate is forwarded to this handler.
pub type ProgressHandler = Arc<dyn Fn(f64) + Send + Sync>;

struct Slot {
    weight: f64,
    fraction_bits: AtomicU64,
}

/// Aggregates per-work-item fractional progress into one weighted total and
/// forwards it to an outer [`ProgressHandler`], clamping to monotonic
/// non-decrease even if an item's own reporting jitters.
pub struct ProgressAggregator {
    slots: Vec<Slot>,
    total_weight: f64,
    handler: Option<ProgressHandler>,
    high_water: AtomicU64,
}

impl ProgressAggregator {
    #[must_use]
    pub fn new(weights: Vec<f64>, handler: Option<ProgressHandler>) -> Arc<Self> {
        let total_weight: f64 = weights.iter().sum::<f64>().max(f64::EPSILON);
        let slots = weights.into_iter().map(|weight| Slot { weight, fraction_bits: AtomicU64::new(0) }).collect();
        Arc::new(ProgressAggregator { slots, total_weight, handler, high_water: AtomicU64::new(0) })
    }

    /// Report that work item `index` has completed `fraction` of its own
    /// work ( `[0, 1]` ).
    pub fn report(&self, index: usize, fraction: f64) {
        let fraction = fraction.clamp(0.0, 1.0);
        self.slots[index].fraction_bits.store(fraction.to_bits(), Ordering::Relaxed);
        self.recompute();
    }

    fn recompute(&self) {
        let Some(handler) = &self.handler else { return };
        let weighted: f64 = self
            .slots
            .iter()
            .map(|s| f64::from_bits(s.fraction_bits.load(Ordering::Relaxed)) * s.weight)
            .sum();
        let overall = (weighted / self.total_weight).clamp(0.0, 1.0);
        let overall_bits = overall.to_bits();
        let prev = self.high_water.fetch_max(overall_bits, Ordering::Relaxed);
        if overall_bits > prev || (prev == 0 && overall_bits == 0) {
            handler(f64::from_bits(self.high_water.load(Ordering::Relaxed)));
        }
    }
}

/// A handle a single work item uses to report its own progress; forwards
/// into the owning [`ProgressAggregator`] at a fixed slot index.
#[derive(Clone)]
pub struct ProgressReporter {
    aggregator: Arc<ProgressAggregator>,
    index: usize,
}

impl ProgressReporter {
    #[must_use]
    pub fn new(aggregator: Arc<ProgressAggregator>, index: usize) -> Self {
        ProgressReporter { aggregator, index }
    }

    pub fn report(&self, fraction: f64) {
        self.aggregator.report(self.index, fraction);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn aggregate_is_weighted_average() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen2 = Arc::clone(&seen);
        let handler: ProgressHandler = Arc::new(move |p| seen2.lock().unwrap().push(p));
        let agg = ProgressAggregator::new(vec![1.0, 3.0], Some(handler));
        agg.report(0, 1.0); // weight 1 of 4 total -> 0.25
        agg.report(1, 1.0); // weight 3 of 4 total -> contributes 0.75 more -> 1.0
        let values = seen.lock().unwrap().clone();
        assert!((values.last().copied().unwrap_or(0.0) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn progress_never_regresses() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen2 = Arc::clone(&seen);
        let handler: ProgressHandler = Arc::new(move |p| seen2.lock().unwrap().push(p));
        let agg = ProgressAggregator::new(vec![1.0], Some(handler));
        agg.report(0, 0.5);
        agg.report(0, 0.8);
        agg.report(0, 0.3); // a jittery backward report
        let values = seen.lock().unwrap().clone();
        for window in values.windows(2) {
            assert!(window[1] >= window[0]);
        }
    }
}

//! `g_part_states`: the one diagnostic global the design calls out by name
//! (spec.md §9, "Global mutable state"). A mutex-protected map from a
//! partition's diagnostic label (e.g. `"expand:depth4:part17"`) to a short
//! human-readable status string, so a stuck pipeline can be inspected by
//! dumping this map rather than attaching a debugger to a worker thread.
//!
//! Nothing downstream reads this map programmatically -- it exists purely
//! for `--verbose` logging and operator diagnostics, matching the spec's
//! framing of it as a diagnostic map rather than a control-flow structure.

use std::collections::BTreeMap;

use parking_lot::Mutex;

static PART_STATES: Mutex<BTreeMap<String, String>> = Mutex::new(BTreeMap::new());

/// Record (overwriting) the current status of a named partition of work.
pub fn set_state(partition: impl Into<String>, state: impl Into<String>) {
    PART_STATES.lock().insert(partition.into(), state.into());
}

/// Remove a partition's entry once its work item has finished; keeps the
/// map from growing unbounded across a long-running pipeline with many
/// short-lived partitions.
pub fn clear_state(partition: &str) {
    PART_STATES.lock().remove(partition);
}

/// A point-in-time snapshot of every tracked partition's status, sorted by
/// label. Intended for a diagnostics dump, not for polling in a hot loop.
#[must_use]
pub fn snapshot() -> Vec<(String, String)> {
    PART_STATES.lock().iter().map(|(k, v)| (k.clone(), v.clone())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_and_snapshot_round_trips() {
        set_state("test:part0", "sorting");
        set_state("test:part1", "dedup");
        let snap = snapshot();
        assert!(snap.contains(&("test:part0".to_string(), "sorting".to_string())));
        assert!(snap.contains(&("test:part1".to_string(), "dedup".to_string())));
        clear_state("test:part0");
        clear_state("test:part1");
    }

    #[test]
    fn clear_state_removes_entry() {
        set_state("test:transient", "running");
        clear_state("test:transient");
        assert!(!snapshot().iter().any(|(k, _)| k == "test:transient"));
    }

    #[test]
    fn overwriting_a_label_replaces_its_value() {
        set_state("test:part2", "sorting");
        set_state("test:part2", "done");
        let snap = snapshot();
        assert!(snap.contains(&("test:part2".to_string(), "done".to_string())));
        clear_state("test:part2");
    }
}

//! A tracked-allocator facility: named allocations with a running total and
//! a high-water mark, checked on debug builds against the assumption that
//! any single allocation above `LARGE_ALLOC_THRESHOLD` goes through here.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use once_cell::sync::Lazy;

/// Allocations at or above this size are expected to be registered with the
/// tracker. Anything bigger that slips through untracked trips a debug
/// assertion -- this is the "allocations above ~50 MB ... should be an
/// assertion failure in debug builds" requirement.
pub const LARGE_ALLOC_THRESHOLD: usize = 50 * 1024 * 1024;

static CURRENT_BYTES: AtomicUsize = AtomicUsize::new(0);
static HIGH_WATER_MARK: AtomicUsize = AtomicUsize::new(0);
static NAMED: Lazy<Mutex<Vec<(String, usize)>>> = Lazy::new(|| Mutex::new(Vec::new()));

/// RAII handle for one tracked allocation. Dropping it releases the bytes
/// back to the tracker's running total.
pub struct TrackedAlloc {
    name: String,
    bytes: usize,
}

impl TrackedAlloc {
    #[must_use]
    pub fn new(name: impl Into<String>, bytes: usize) -> Self {
        let name = name.into();
        let prev = CURRENT_BYTES.fetch_add(bytes, Ordering::Relaxed) + bytes;
        HIGH_WATER_MARK.fetch_max(prev, Ordering::Relaxed);
        NAMED.lock().unwrap().push((name.clone(), bytes));
        if bytes >= LARGE_ALLOC_THRESHOLD {
            log::debug!("membuf: tracked large allocation '{name}' of {bytes} bytes");
        }
        TrackedAlloc { name, bytes }
    }

    #[must_use]
    pub fn bytes(&self) -> usize {
        self.bytes
    }
}

impl Drop for TrackedAlloc {
    fn drop(&mut self) {
        CURRENT_BYTES.fetch_sub(self.bytes, Ordering::Relaxed);
        let mut named = NAMED.lock().unwrap();
        if let Some(pos) = named.iter().position(|(n, b)| n == &self.name && *b == self.bytes) {
            named.remove(pos);
        }
    }
}

#[must_use]
pub fn current_bytes() -> usize {
    CURRENT_BYTES.load(Ordering::Relaxed)
}

#[must_use]
pub fn high_water_mark() -> usize {
    HIGH_WATER_MARK.load(Ordering::Relaxed)
}

/// Assert (debug builds only) that an allocation of this size was reported
/// to the tracker. Callers that allocate raw buffers without going through
/// [`crate::MemBuf::new_owned`] should call this to catch large untracked
/// allocations early.
pub fn debug_assert_tracked(bytes: usize, tracked: bool) {
    debug_assert!(
        bytes < LARGE_ALLOC_THRESHOLD || tracked,
        "allocation of {bytes} bytes at or above the {LARGE_ALLOC_THRESHOLD}-byte threshold was not tracked"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracked_alloc_updates_and_releases_totals() {
        let before = current_bytes();
        {
            let _a = TrackedAlloc::new("test-alloc", 1024);
            assert_eq!(current_bytes(), before + 1024);
        }
        assert_eq!(current_bytes(), before);
    }

    #[test]
    fn high_water_mark_is_monotonic() {
        let start_hwm = high_water_mark();
        let _a = TrackedAlloc::new("hwm-probe", 4096);
        assert!(high_water_mark() >= start_hwm + 4096 || high_water_mark() >= 4096);
    }
}

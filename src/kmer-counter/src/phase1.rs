use std::sync::atomic::{AtomicU8, Ordering};

/// One partition's 2-bit saturating-counter array: `slots` counters packed
/// 4 per byte, each counting occurrences of one hashed k-mer slot up to a
/// ceiling of 3. Concurrent increments to different slots in the same byte
/// are resolved with a CAS loop rather than a lock, mirroring the
/// `kmer_counter.h` CAS-increment pattern this crate's phase 2 table also
/// uses, scaled down to 2 bits.
pub struct Phase1Partition {
    slots: usize,
    counters: Vec<AtomicU8>,
}

impl Phase1Partition {
    #[must_use]
    pub fn new(slots: usize) -> Self {
        let bytes = slots.div_ceil(4);
        Phase1Partition { slots, counters: (0..bytes).map(|_| AtomicU8::new(0)).collect() }
    }

    #[must_use]
    pub fn slots(&self) -> usize {
        self.slots
    }

    /// Saturating-increment the counter for `slot`, capping at 3.
    pub fn increment(&self, slot: usize) {
        let byte_idx = slot / 4;
        let shift = 2 * (slot % 4);
        let mask = 0b11u8 << shift;
        let byte = &self.counters[byte_idx];
        let mut current = byte.load(Ordering::Relaxed);
        loop {
            let count = (current & mask) >> shift;
            if count >= 3 {
                return;
            }
            let new_byte = (current & !mask) | ((count + 1) << shift);
            match byte.compare_exchange_weak(current, new_byte, Ordering::Relaxed, Ordering::Relaxed) {
                Ok(_) => return,
                Err(actual) => current = actual,
            }
        }
    }

    #[must_use]
    pub fn count(&self, slot: usize) -> u8 {
        let byte_idx = slot / 4;
        let shift = 2 * (slot % 4);
        (self.counters[byte_idx].load(Ordering::Relaxed) >> shift) & 0b11
    }

    /// Collapse every slot's 2-bit count to a single "count >= `min_count`"
    /// bit, as a packed bitmap (one bit per slot, LSB-first within each
    /// `u64` word).
    #[must_use]
    pub fn to_bitmap(&self, min_count: u8) -> Vec<u64> {
        let mut bitmap = vec![0u64; self.slots.div_ceil(64)];
        for slot in 0..self.slots {
            if self.count(slot) >= min_count {
                bitmap[slot / 64] |= 1u64 << (slot % 64);
            }
        }
        bitmap
    }
}

#[must_use]
pub fn bitmap_get(bitmap: &[u64], slot: usize) -> bool {
    (bitmap[slot / 64] >> (slot % 64)) & 1 == 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn increment_saturates_at_three() {
        let part = Phase1Partition::new(8);
        for _ in 0..10 {
            part.increment(3);
        }
        assert_eq!(part.count(3), 3);
    }

    #[test]
    fn increment_is_independent_per_slot() {
        let part = Phase1Partition::new(8);
        part.increment(0);
        part.increment(0);
        part.increment(1);
        assert_eq!(part.count(0), 2);
        assert_eq!(part.count(1), 1);
        assert_eq!(part.count(2), 0);
    }

    #[test]
    fn bitmap_reflects_min_count_threshold() {
        let part = Phase1Partition::new(4);
        part.increment(0);
        part.increment(1);
        part.increment(1);
        let bitmap = part.to_bitmap(2);
        assert!(!bitmap_get(&bitmap, 0));
        assert!(bitmap_get(&bitmap, 1));
        assert!(!bitmap_get(&bitmap, 2));
    }
}

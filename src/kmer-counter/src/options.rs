use crate::error::KmerCounterError;

/// Largest k-mer size a single 2-bit-packed `u64` can hold.
pub const MAX_K: usize = 31;

/// Knobs for [`crate::count_kmers`], named to match spec.md 4.E.
#[derive(Debug, Clone, Copy)]
pub struct KmerCounterOptions {
    /// k-mer length walked over every read.
    pub k: usize,
    /// Number of phase-1/phase-2 partitions k-mers are hashed into.
    /// Default 256, matching spec.md 4.E.
    pub num_partitions: usize,
    /// Number of 2-bit saturating-counter slots per phase-1 partition.
    pub phase1_slots_per_partition: usize,
    /// Minimum phase-1 count (post-saturation, so effectively 1..=3) for a
    /// k-mer to survive into phase 2's exact counting.
    pub min_count: u8,
}

impl KmerCounterOptions {
    pub fn new(k: usize) -> Result<Self, KmerCounterError> {
        if k == 0 {
            return Err(KmerCounterError::KSizeZero);
        }
        if k > MAX_K {
            return Err(KmerCounterError::KSizeTooLarge { k, max: MAX_K });
        }
        Ok(KmerCounterOptions { k, num_partitions: 256, phase1_slots_per_partition: 1 << 16, min_count: 2 })
    }

    #[must_use]
    pub fn with_num_partitions(mut self, num_partitions: usize) -> Self {
        self.num_partitions = num_partitions.max(1);
        self
    }

    #[must_use]
    pub fn with_phase1_slots_per_partition(mut self, slots: usize) -> Self {
        self.phase1_slots_per_partition = slots.max(1);
        self
    }

    #[must_use]
    pub fn with_min_count(mut self, min_count: u8) -> Self {
        self.min_count = min_count.clamp(1, 3);
        self
    }
}

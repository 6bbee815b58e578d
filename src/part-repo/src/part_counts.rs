use std::sync::atomic::{AtomicU64, Ordering};

use dna_core::DnaSlice;

/// A histogram over `4^bases` sub-partition buckets, used to prefetch-bucket
/// an incoming entries file without a full sort: spec.md 4.D step 1 reads
/// the new-entries file sequentially and bins each entry directly into its
/// bucket using this histogram's prefix sums. Ported from
/// `build_seqset::part_counts`.
pub struct PartCounts {
    bases: u32,
    counts: Vec<AtomicU64>,
}

impl PartCounts {
    #[must_use]
    pub fn new(bases: u32) -> Self {
        let slots = 1usize << (2 * bases);
        let counts = (0..slots).map(|_| AtomicU64::new(0)).collect();
        PartCounts { bases, counts }
    }

    #[must_use]
    pub fn bases(&self) -> u32 {
        self.bases
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// The bucket index for `seq`'s leading `bases` bases, short sequences
    /// padded with `A` -- same convention as `PartConfig::partition_of`.
    #[must_use]
    pub fn index_for(&self, seq: DnaSlice<'_>) -> usize {
        let mut idx: usize = 0;
        let mut it = seq.iter();
        for _ in 0..self.bases {
            let b = it.next().map(|b| b.value()).unwrap_or(0);
            idx = (idx << 2) | usize::from(b);
        }
        idx
    }

    pub fn add(&self, seq: DnaSlice<'_>) {
        let idx = self.index_for(seq);
        self.counts[idx].fetch_add(1, Ordering::Relaxed);
    }

    #[must_use]
    pub fn get(&self, idx: usize) -> u64 {
        self.counts[idx].load(Ordering::Relaxed)
    }

    /// Prefix sums: bucket `i`'s entries should be written starting at
    /// `offsets()[i]` in a bucketed-but-unsorted staging buffer.
    #[must_use]
    pub fn offsets(&self) -> Vec<u64> {
        let mut out = Vec::with_capacity(self.counts.len() + 1);
        let mut running = 0u64;
        out.push(0);
        for c in &self.counts {
            running += c.load(Ordering::Relaxed);
            out.push(running);
        }
        out
    }

    #[must_use]
    pub fn total(&self) -> u64 {
        self.counts.iter().map(|c| c.load(Ordering::Relaxed)).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dna_core::DnaSequence;

    #[test]
    fn add_and_get_roundtrip() {
        let pc = PartCounts::new(2);
        let s = DnaSequence::parse("ACGT").unwrap();
        pc.add(s.as_slice());
        pc.add(s.as_slice());
        let idx = pc.index_for(s.as_slice());
        assert_eq!(pc.get(idx), 2);
        assert_eq!(pc.total(), 2);
    }

    #[test]
    fn offsets_are_prefix_sums() {
        let pc = PartCounts::new(1);
        let a = DnaSequence::parse("A").unwrap();
        let c = DnaSequence::parse("C").unwrap();
        pc.add(a.as_slice());
        pc.add(a.as_slice());
        pc.add(c.as_slice());
        let offsets = pc.offsets();
        assert_eq!(offsets[0], 0);
        assert_eq!(*offsets.last().unwrap(), 3);
    }
}

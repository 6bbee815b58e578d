use dna_core::{dna_bases, Base, DnaSequence, DnaSlice};

use crate::error::PartRepoError;

/// Smallest and largest supported partition depth. At depth 7, `4^7` ==
/// 16384 partitions, the practical ceiling spec.md 4.C names.
pub const MIN_DEPTH: u32 = 1;
pub const MAX_DEPTH: u32 = 7;

/// Partitioning scheme: entries are grouped into `4^depth` buckets by their
/// leading `depth` bases, treated as a big-endian `2*depth`-bit integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartConfig {
    depth: u32,
}

impl PartConfig {
    pub fn new(depth: u32) -> Result<Self, PartRepoError> {
        if !(MIN_DEPTH..=MAX_DEPTH).contains(&depth) {
            return Err(PartRepoError::InvalidDepth { depth });
        }
        Ok(PartConfig { depth })
    }

    #[must_use]
    pub fn depth(self) -> u32 {
        self.depth
    }

    #[must_use]
    pub fn partition_count(self) -> usize {
        1usize << (2 * self.depth)
    }

    /// The partition index for `seq`'s leading `depth` bases. Shorter
    /// sequences are padded with `A` (value 0) for the purpose of indexing
    /// only -- the same convention the original `part_counts::get_index`
    /// uses for "inline bases" shorter than the counted window, since a
    /// seqset entry always has a well-defined partition even when its
    /// length is less than the partitioning depth.
    #[must_use]
    pub fn partition_of(self, seq: DnaSlice<'_>) -> u32 {
        let mut idx: u32 = 0;
        let mut it = seq.iter();
        for _ in 0..self.depth {
            let b = it.next().map(|b| b.value()).unwrap_or(0);
            idx = (idx << 2) | u32::from(b);
        }
        idx
    }

    /// Reconstruct the `depth`-base prefix a partition id denotes.
    #[must_use]
    pub fn prefix_for(self, part_id: u32) -> DnaSequence {
        let mut bases = Vec::with_capacity(self.depth as usize);
        for i in (0..self.depth).rev() {
            let value = ((part_id >> (2 * i)) & 0b11) as u8;
            bases.push(Base::new(value).expect("2-bit value"));
        }
        DnaSequence::from_bases(bases)
    }

    /// The partition id reached by prepending `b` to partition `part_id`'s
    /// prefix and dropping the last base -- i.e. the partition that holds
    /// "AP" when called with `b = A` and `part_id` denoting prefix `P`.
    #[must_use]
    pub fn prepend(self, part_id: u32, b: Base) -> u32 {
        let mask = self.partition_count() as u32 - 1;
        ((u32::from(b.value()) << (2 * (self.depth - 1))) | (part_id >> 2)) & mask
    }

    pub fn all_partitions(self) -> impl Iterator<Item = u32> {
        0..self.partition_count() as u32
    }
}

#[must_use]
pub fn all_bases() -> [Base; 4] {
    let mut out = [Base::A; 4];
    for (i, b) in dna_bases().enumerate() {
        out[i] = b;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_depth_rejected() {
        assert!(PartConfig::new(0).is_err());
        assert!(PartConfig::new(8).is_err());
    }

    #[test]
    fn partition_count_is_4_pow_depth() {
        assert_eq!(PartConfig::new(4).unwrap().partition_count(), 256);
    }

    #[test]
    fn partition_of_matches_prefix_for_roundtrip() {
        let cfg = PartConfig::new(3).unwrap();
        for part_id in 0..cfg.partition_count() as u32 {
            let prefix = cfg.prefix_for(part_id);
            assert_eq!(cfg.partition_of(prefix.as_slice()), part_id);
        }
    }

    #[test]
    fn prepend_matches_manual_prefix_construction() {
        let cfg = PartConfig::new(2).unwrap();
        let part_id = cfg.partition_of(DnaSequence::parse("CT").unwrap().as_slice());
        let prepended = cfg.prepend(part_id, Base::A);
        let expected = cfg.partition_of(DnaSequence::parse("AC").unwrap().as_slice());
        assert_eq!(prepended, expected);
    }
}

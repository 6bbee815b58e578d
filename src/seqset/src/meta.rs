use serde::{Deserialize, Serialize};

/// The current on-disk format version (spec.md 6.1's `seqset.json`).
/// Bumped whenever a section's byte layout changes incompatibly.
pub const FORMAT_VERSION: u32 = 1;

/// `seqset.json`'s contents: everything a reader needs before it can make
/// sense of the `shared`/`sizes`/`prev_*`/`bases` sections.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SeqsetMeta {
    pub version: u32,
    pub uuid: [u8; 16],
    pub entry_count: u64,
    pub max_read_len: u32,
    pub partition_depth: u32,
    /// Length in bases of the `bases` section (not itself named in spec.md
    /// 6.1 -- see `layout.rs`).
    pub bases_len: u64,
    /// `base_start[b]`: how many seqset entries sort strictly before every
    /// entry whose leading base is `b`, in colex order. The rank-based
    /// foundation [`crate::reader::SeqsetReader::push_front`] narrows a
    /// range against, indexed by [`dna_core::Base::value`].
    pub base_start: [u64; 4],
}

impl SeqsetMeta {
    #[must_use]
    pub fn new(
        uuid: [u8; 16],
        entry_count: u64,
        max_read_len: u32,
        partition_depth: u32,
        bases_len: u64,
        base_start: [u64; 4],
    ) -> Self {
        SeqsetMeta { version: FORMAT_VERSION, uuid, entry_count, max_read_len, partition_depth, bases_len, base_start }
    }

    /// Width in bits of the `shared`/`sizes` varbit vectors: the smallest
    /// number of bits that can hold `max_read_len` (spec.md 6.1).
    #[must_use]
    pub fn varbit_width(&self) -> u32 {
        varbit_width_for(self.max_read_len)
    }
}

#[must_use]
pub fn varbit_width_for(max_read_len: u32) -> u32 {
    let n = u64::from(max_read_len) + 1;
    if n <= 1 {
        0
    } else {
        64 - (n - 1).leading_zeros()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn varbit_width_fits_max_read_len() {
        assert_eq!(varbit_width_for(0), 0);
        assert_eq!(varbit_width_for(1), 1);
        assert_eq!(varbit_width_for(3), 2);
        assert_eq!(varbit_width_for(4), 3);
        assert_eq!(varbit_width_for(255), 8);
        assert_eq!(varbit_width_for(256), 9);
    }

    #[test]
    fn meta_roundtrips_through_json() {
        let meta = SeqsetMeta::new([7u8; 16], 42, 150, 4, 900, [0, 10, 20, 35]);
        let json = serde_json::to_string(&meta).unwrap();
        let back: SeqsetMeta = serde_json::from_str(&json).unwrap();
        assert_eq!(meta, back);
    }
}

use dna_core::DnaSlice;

/// One k-mer window's orientation-aware encoding: the 2-bit-packed forward
/// value, its reverse complement, and which of the two is canonical (the
/// smaller, lexicographically-by-bit-pattern one -- same "pick the smaller
/// of {fwd, rc}" rule `dna-core`'s `canonicalize` uses for whole sequences).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KmerWindow {
    pub canonical: u64,
    /// `true` if this occurrence's forward orientation *is* the canonical
    /// form (i.e. this read contributed a "fwd" observation); `false` means
    /// the read's reverse complement is canonical, so this occurrence
    /// contributes a "rev" observation.
    pub is_fwd: bool,
}

/// Encode `slice[0..k]` and its reverse complement as MSB-aligned 2-bit
/// words (same convention as `DnaSequence::as_kmer`), and pick the
/// canonical (numerically smaller) orientation. `slice` must have at least
/// `k` bases.
#[must_use]
pub fn canonical_kmer(slice: DnaSlice<'_>, k: usize) -> KmerWindow {
    let mut fwd = 0u64;
    let mut rc = 0u64;
    for i in 0..k {
        let b = slice.get(i);
        fwd = (fwd << 2) | u64::from(b.value());
        rc = (u64::from(b.complement().value()) << (2 * (k - 1))) | (rc >> 2);
    }
    if fwd <= rc {
        KmerWindow { canonical: fwd, is_fwd: true }
    } else {
        KmerWindow { canonical: rc, is_fwd: false }
    }
}

/// Slide a window of size `k` across `slice`, yielding one [`KmerWindow`]
/// per valid position (`slice.len() - k + 1` total, zero if `slice` is
/// shorter than `k`).
pub fn kmer_windows(slice: DnaSlice<'_>, k: usize) -> impl Iterator<Item = (usize, KmerWindow)> + '_ {
    let len = slice.len();
    let num_windows = if len >= k { len - k + 1 } else { 0 };
    (0..num_windows).map(move |pos| (pos, canonical_kmer(slice.subseq(pos, k).expect("pos + k <= len"), k)))
}

#[must_use]
pub fn partition_and_slot(canonical: u64, num_partitions: usize, slots_per_partition: usize) -> (usize, usize) {
    let h1 = ahash::RandomState::with_seeds(0x5bd1_e995, 0x27d4_eb2f, 0x1656_67b1, 0x1234_5678).hash_one(canonical);
    let partition = (h1 as usize) % num_partitions;
    let h2 = ahash::RandomState::with_seeds(0x9e37_79b9, 0x85eb_ca6b, 0xc2b2_ae35, 0x1656_67b1).hash_one(canonical);
    let slot = (h2 as usize) % slots_per_partition;
    (partition, slot)
}

#[must_use]
pub fn starts_read(pos: usize, is_fwd: bool, read_len: usize, k: usize) -> bool {
    if is_fwd {
        pos == 0
    } else {
        pos + k == read_len
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dna_core::DnaSequence;

    #[test]
    fn canonical_kmer_picks_smaller_of_fwd_and_rc() {
        let seq = DnaSequence::parse("AAAA").unwrap();
        let window = canonical_kmer(seq.as_slice(), 4);
        // "AAAA" rev-comp is "TTTT"; forward (all zero bits) is smaller.
        assert!(window.is_fwd);
        assert_eq!(window.canonical, 0);
    }

    #[test]
    fn canonical_kmer_is_orientation_independent() {
        let fwd_seq = DnaSequence::parse("ACGTACG").unwrap();
        let rc_seq = fwd_seq.rev_comp();
        let a = canonical_kmer(fwd_seq.as_slice(), 7);
        let b = canonical_kmer(rc_seq.as_slice(), 7);
        assert_eq!(a.canonical, b.canonical);
        assert_ne!(a.is_fwd, b.is_fwd);
    }

    #[test]
    fn kmer_windows_counts_correctly() {
        let seq = DnaSequence::parse("ACGTACGT").unwrap();
        let windows: Vec<_> = kmer_windows(seq.as_slice(), 3).collect();
        assert_eq!(windows.len(), 6);
    }

    #[test]
    fn kmer_windows_empty_when_shorter_than_k() {
        let seq = DnaSequence::parse("AC").unwrap();
        let windows: Vec<_> = kmer_windows(seq.as_slice(), 3).collect();
        assert!(windows.is_empty());
    }

    #[test]
    fn starts_read_checks_correct_end_by_orientation() {
        assert!(starts_read(0, true, 10, 3));
        assert!(!starts_read(1, true, 10, 3));
        assert!(starts_read(7, false, 10, 3));
        assert!(!starts_read(6, false, 10, 3));
    }
}

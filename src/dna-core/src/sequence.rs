use std::fmt::{self, Display, Formatter};

use crate::base::Base;
use crate::compare::CompareResult;
use crate::cursor::DnaCursor;
use crate::error::DnaError;
use crate::slice::DnaSlice;

/// Minimum capacity (in bases) reserved the first time a sequence grows
/// past an empty buffer, matching the geometric-growth lower bound named
/// in spec.md 4.A.
const MIN_GROWTH_BASES: usize = 127;

/// A 2-bit-per-base packed DNA sequence, owning its storage.
///
/// The first base slot of the packed buffer is reserved: its 2 bits hold
/// `size % 4` as a lightweight sanity check, and actual base data starts at
/// logical offset 1. An empty sequence owns no buffer at all. This mirrors
/// `dna_sequence`'s layout in the original source, where `operator[]`
/// dereferences at `i + 1` for exactly this reason.
#[derive(Debug, Clone, Default)]
pub struct DnaSequence {
    data: Vec<u8>,
    size: usize,
}

fn bytes_for_slots(slots: usize) -> usize {
    slots.div_ceil(4)
}

impl DnaSequence {
    #[must_use]
    pub fn new() -> Self {
        DnaSequence::default()
    }

    #[must_use]
    pub fn size(&self) -> usize {
        self.size
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    #[must_use]
    pub fn capacity_bases(&self) -> usize {
        if self.data.is_empty() {
            0
        } else {
            self.data.len() * 4 - 1
        }
    }

    /// Reserve an exact-fit buffer for `bases` bases, bypassing the
    /// geometric growth policy. Used when the final length is already
    /// known, so callers don't pay for `push_back`'s 127-base growth floor
    /// one base at a time.
    fn with_capacity(bases: usize) -> Self {
        if bases == 0 {
            return DnaSequence::default();
        }
        DnaSequence { data: vec![0u8; bytes_for_slots(bases + 1)], size: 0 }
    }

    /// Parse an ASCII DNA string ("ACGT...") into a packed sequence.
    pub fn parse(s: &str) -> Result<Self, DnaError> {
        let mut seq = DnaSequence::with_capacity(s.chars().count());
        for (pos, c) in s.chars().enumerate() {
            let base = Base::try_from(c).map_err(|_| DnaError::InvalidSequenceChar { c, pos })?;
            seq.push_exact(base);
        }
        seq.write_header();
        Ok(seq)
    }

    /// Build directly from an iterator of bases (e.g. a `DnaSlice`'s `iter`).
    pub fn from_bases(bases: impl IntoIterator<Item = Base>) -> Self {
        let bases: Vec<Base> = bases.into_iter().collect();
        let mut seq = DnaSequence::with_capacity(bases.len());
        for b in bases {
            seq.push_exact(b);
        }
        seq.write_header();
        seq
    }

    /// Write one base into a buffer already sized by [`with_capacity`],
    /// without touching the header or re-checking growth.
    fn push_exact(&mut self, base: Base) {
        self.size += 1;
        self.put_base(self.size, base);
    }

    fn put_base(&mut self, slot: usize, base: Base) {
        let byte_idx = slot / 4;
        let shift = 6 - 2 * (slot % 4);
        let byte = &mut self.data[byte_idx];
        *byte &= !(0b11 << shift);
        *byte |= base.value() << shift;
    }

    fn write_header(&mut self) {
        if self.data.is_empty() {
            return;
        }
        let header_val = (self.size % 4) as u8;
        self.data[0] &= 0b0011_1111;
        self.data[0] |= header_val << 6;
    }

    /// Append one base, growing capacity geometrically (2x, floor 127
    /// bases) as needed.
    pub fn push_back(&mut self, base: Base) {
        let needed_slots = self.size + 2; // +1 for header slot, +1 for the new base
        let needed_bytes = bytes_for_slots(needed_slots);
        if needed_bytes > self.data.len() {
            let cur_capacity = self.capacity_bases();
            let new_capacity = (cur_capacity * 2).max(MIN_GROWTH_BASES).max(self.size + 1);
            self.data.resize(bytes_for_slots(new_capacity + 1), 0);
        }
        self.size += 1;
        self.put_base(self.size, base); // slot `size` == logical offset `size - 1` shifted by +1 header
        self.write_header();
    }

    #[must_use]
    pub fn as_slice(&self) -> DnaSlice<'_> {
        if self.data.is_empty() {
            return DnaSlice::from_cursor(DnaCursor::new(&[], 0, false), 0);
        }
        DnaSlice::from_cursor(DnaCursor::new(&self.data, 1, false), self.size)
    }

    #[must_use]
    pub fn as_packed(&self) -> &[u8] {
        &self.data
    }

    #[must_use]
    pub fn as_string(&self) -> String {
        self.as_slice().as_string()
    }

    pub fn subseq(&self, offset: usize, len: usize) -> Result<Self, DnaError> {
        let slice = self.as_slice().subseq(offset, len)?;
        Ok(DnaSequence::from_bases(slice.iter()))
    }

    #[must_use]
    pub fn rev_comp(&self) -> Self {
        DnaSequence::from_bases(self.as_slice().rev_comp().iter())
    }

    #[must_use]
    pub fn canonicalize(&self) -> (Self, bool) {
        let (slice, flipped) = self.as_slice().canonicalize();
        (DnaSequence::from_bases(slice.iter()), flipped)
    }

    #[must_use]
    pub fn compare_to(&self, rhs: &DnaSlice<'_>) -> CompareResult {
        self.as_slice().compare_to(*rhs)
    }

    #[must_use]
    pub fn shared_prefix_length(&self, rhs: &DnaSlice<'_>) -> usize {
        self.as_slice().shared_prefix_length(*rhs)
    }

    /// Append every base of `slice` to the end of this sequence, reserving
    /// the destination buffer once up front rather than letting `push_back`
    /// regrow geometrically one base at a time. Mirrors `dna_sequence::copy_bases`
    /// from the original source, minus its byte-aligned-memcpy fast path
    /// (that path operates on raw cursor bytes this crate keeps private;
    /// reserving capacity up front captures most of the benefit).
    pub fn copy_bases(&mut self, slice: DnaSlice<'_>) {
        if slice.is_empty() {
            return;
        }
        let needed = self.size + slice.len();
        if bytes_for_slots(needed + 1) > self.data.len() {
            self.data.resize(bytes_for_slots(needed + 1), 0);
        }
        for b in slice.iter() {
            self.size += 1;
            self.put_base(self.size, b);
        }
        self.write_header();
    }

    /// Encode this sequence (<= 31 bases) as a single 2-bit-per-base 64-bit
    /// kmer word, MSB-aligned at the top of the used bits (i.e. the first
    /// base occupies the two highest bits among the `2*size` used bits).
    #[must_use]
    pub fn as_kmer(&self) -> u64 {
        let mut word = 0u64;
        for b in self.as_slice().iter() {
            word = (word << 2) | u64::from(b.value());
        }
        word
    }
}

impl PartialEq for DnaSequence {
    fn eq(&self, other: &Self) -> bool {
        self.as_slice() == other.as_slice()
    }
}
impl Eq for DnaSequence {}

impl PartialOrd for DnaSequence {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DnaSequence {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.as_slice().cmp(&other.as_slice())
    }
}

impl Display for DnaSequence {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_string())
    }
}

impl<'a> From<DnaSlice<'a>> for DnaSequence {
    fn from(slice: DnaSlice<'a>) -> Self {
        DnaSequence::from_bases(slice.iter())
    }
}

impl std::str::FromStr for DnaSequence {
    type Err = DnaError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DnaSequence::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pack_and_roundtrip_acgt() {
        let seq = DnaSequence::parse("ACGT").unwrap();
        // S1: 2-byte packed buffer, high 2 bits of byte 0 hold size % 4 (4 % 4 == 0).
        assert_eq!(seq.as_packed().len(), 2);
        assert_eq!(seq.as_packed()[0] >> 6, 0);
        assert_eq!(seq.as_string(), "ACGT");
    }

    #[test]
    fn header_tracks_size_mod_4() {
        for n in 0..12 {
            let s: String = "ACGT".chars().cycle().take(n).collect();
            let seq = DnaSequence::parse(&s).unwrap();
            if n > 0 {
                assert_eq!(u32::from(seq.as_packed()[0] >> 6), (n % 4) as u32);
            }
            assert_eq!(seq.size(), n);
            assert_eq!(seq.as_string(), s);
        }
    }

    #[test]
    fn empty_sequence_owns_no_buffer() {
        let seq = DnaSequence::new();
        assert!(seq.as_packed().is_empty());
        assert_eq!(seq.size(), 0);
    }

    #[test]
    fn push_back_grows_and_preserves_content() {
        let mut seq = DnaSequence::new();
        let expected = "ACGTACGTACGTTTGGCCAA";
        for c in expected.chars() {
            seq.push_back(Base::try_from(c).unwrap());
        }
        assert_eq!(seq.as_string(), expected);
        assert_eq!(seq.size(), expected.len());
    }

    #[test]
    fn rc_involution_roundtrip() {
        let seq = DnaSequence::parse("ACGTTGCAACGT").unwrap();
        assert_eq!(seq.rev_comp().rev_comp(), seq);
    }

    #[test]
    fn subseq_matches_substring() {
        let seq = DnaSequence::parse("ACGTACGTAC").unwrap();
        let sub = seq.subseq(2, 4).unwrap();
        assert_eq!(sub.as_string(), "GTAC");
    }

    #[test]
    fn subseq_out_of_bounds() {
        let seq = DnaSequence::parse("ACGT").unwrap();
        assert!(matches!(seq.subseq(3, 5), Err(DnaError::OutOfBounds { .. })));
    }

    #[test]
    fn invalid_char_reports_position() {
        let err = DnaSequence::parse("ACGXT").unwrap_err();
        match err {
            DnaError::InvalidSequenceChar { c, pos } => {
                assert_eq!(c, 'X');
                assert_eq!(pos, 3);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn ordering_is_lexicographic_with_prefixes_less() {
        let a = DnaSequence::parse("ACG").unwrap();
        let b = DnaSequence::parse("ACGT").unwrap();
        assert!(a < b);
    }

    #[test]
    fn copy_bases_appends_a_slice() {
        let mut dest = DnaSequence::parse("AC").unwrap();
        let src = DnaSequence::parse("GTAC").unwrap();
        dest.copy_bases(src.as_slice());
        assert_eq!(dest.as_string(), "ACGTAC");
    }

    #[test]
    fn copy_bases_onto_empty_sequence() {
        let mut dest = DnaSequence::new();
        let src = DnaSequence::parse("TTGG").unwrap();
        dest.copy_bases(src.as_slice());
        assert_eq!(dest.as_string(), "TTGG");
    }

    #[test]
    fn as_kmer_roundtrips_through_from_bases() {
        let seq = DnaSequence::parse("ACGTAC").unwrap();
        let kmer = seq.as_kmer();
        // Top 12 bits (6 bases * 2 bits) hold the value; decode manually.
        let mut decoded = Vec::new();
        for i in (0..6).rev() {
            decoded.push(((kmer >> (2 * i)) & 0b11) as u8);
        }
        let decoded_bases: String = decoded
            .into_iter()
            .map(|v| Base::new(v).unwrap().to_char())
            .collect();
        assert_eq!(decoded_bases, "ACGTAC");
    }
}

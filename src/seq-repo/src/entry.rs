use dna_core::{compare::CompareResult, Base, DnaCursor, DnaSequence, DnaSlice};

use crate::blob::BlobReader;
use crate::record::{EntryRecord, INLINE_PREFIX_BASES};

/// Build the [`EntryRecord`] for `seq`, writing its overflow tail (bases
/// past the first [`INLINE_PREFIX_BASES`]) into `blob` if it has one.
///
/// `seq` must already be oriented the way it should be stored (the caller
/// -- typically `part-repo`'s suffix enumeration -- decides forward vs.
/// reverse-complement before calling this).
pub fn build_record(seq: DnaSlice<'_>, blob: &mut crate::blob::BlobWriter) -> EntryRecord {
    let size = seq.len();
    let inline_len = size.min(INLINE_PREFIX_BASES);
    let inline_slice = seq.subseq(0, inline_len).expect("inline_len <= size");
    let mut inline_bases = [0u8; 7];
    pack_inline(inline_slice, &mut inline_bases);

    if size <= INLINE_PREFIX_BASES {
        return EntryRecord::new(size as u16, inline_bases, 0, false);
    }

    let tail = seq.subseq(INLINE_PREFIX_BASES, size - INLINE_PREFIX_BASES).expect("tail in bounds");
    let offset = blob.write_seq(tail);
    EntryRecord::new(size as u16, inline_bases, offset, false)
}

fn pack_inline(slice: DnaSlice<'_>, out: &mut [u8; 7]) {
    for (i, base) in slice.iter().enumerate() {
        let byte_idx = i / 4;
        let shift = 6 - 2 * (i % 4);
        out[byte_idx] |= base.value() << shift;
    }
}

/// A read-only, resolved view of one repository entry: its fixed record
/// plus (if needed) the blob it was built against. This is the "reference"
/// type mentioned in spec.md 4.B: materialized on each step of a repo
/// walk, not stored.
#[derive(Clone, Copy)]
pub struct EntryView<'a> {
    record: EntryRecord,
    blob: Option<&'a BlobReader>,
}

impl<'a> EntryView<'a> {
    #[must_use]
    pub fn new(record: EntryRecord, blob: Option<&'a BlobReader>) -> Self {
        EntryView { record, blob }
    }

    #[must_use]
    pub fn record(&self) -> EntryRecord {
        self.record
    }

    #[must_use]
    pub fn size(&self) -> usize {
        self.record.size_in_bases as usize
    }

    /// The inline prefix, truncated to this entry's actual size when
    /// shorter than [`INLINE_PREFIX_BASES`].
    #[must_use]
    pub fn inline_slice(&self) -> DnaSlice<'_> {
        let inline_len = self.size().min(INLINE_PREFIX_BASES);
        let cursor = DnaCursor::new(&self.record.inline_bases, 0, false);
        DnaSlice::from_cursor(cursor, inline_len)
    }

    /// Materialize the full sequence, fetching the blob tail if needed.
    #[must_use]
    pub fn full_sequence(&self) -> DnaSequence {
        if !self.record.needs_blob() {
            return DnaSequence::from_bases(self.inline_slice().iter());
        }
        let blob = self.blob.expect("entry needs a blob but none was provided");
        let tail_len = (self.size() - INLINE_PREFIX_BASES) as u64;
        let tail = blob.read(self.record.blob_offset(), tail_len, self.record.blob_rc());
        DnaSequence::from_bases(self.inline_slice().iter().chain(tail.iter()))
    }

    /// Compare against another entry, per the §3.3 contract: entries whose
    /// inline prefix and blob pointer both agree are equal without ever
    /// touching the blob; otherwise resolve both tails and compare in
    /// full. This is the inline-comparison fast path the expander's
    /// sort/dedup pass leans on.
    #[must_use]
    pub fn compare_to(&self, other: &EntryView<'_>) -> CompareResult {
        let same_inline = self.inline_slice() == other.inline_slice();
        let same_tail_pointer = self.record.needs_blob() == other.record.needs_blob()
            && (!self.record.needs_blob()
                || (self.record.blob_offset() == other.record.blob_offset()
                    && self.record.blob_rc() == other.record.blob_rc()));

        if same_inline && same_tail_pointer {
            return match self.size().cmp(&other.size()) {
                std::cmp::Ordering::Equal => CompareResult::Equal,
                std::cmp::Ordering::Less => CompareResult::FirstIsPrefix,
                std::cmp::Ordering::Greater => CompareResult::SecondIsPrefix,
            };
        }

        let lhs = self.full_sequence();
        let rhs = other.full_sequence();
        lhs.as_slice().compare_to(rhs.as_slice())
    }

    #[must_use]
    pub fn shared_prefix_length(&self, other: &EntryView<'_>) -> usize {
        self.full_sequence().as_slice().shared_prefix_length(other.full_sequence().as_slice())
    }

    /// The entry's sequence with the leading base removed, i.e. the
    /// `pop_front` spec.md 3.2 calls out as the seqset closure operation.
    #[must_use]
    pub fn popped(&self) -> DnaSequence {
        let full = self.full_sequence();
        full.subseq(1, full.size() - 1).expect("non-empty entry")
    }

    #[must_use]
    pub fn leading_base(&self) -> Option<Base> {
        if self.size() == 0 {
            None
        } else {
            Some(self.inline_slice().get(0))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blob::{BlobReader, BlobWriter};

    fn roundtrip(s: &str) -> (EntryRecord, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blob.bin");
        let mut writer = BlobWriter::create(&path).unwrap();
        let seq = DnaSequence::parse(s).unwrap();
        let record = build_record(seq.as_slice(), &mut writer);
        writer.finish().unwrap();
        (record, dir)
    }

    #[test]
    fn short_entry_roundtrips_without_blob() {
        let (record, _dir) = roundtrip("ACGTACGT");
        assert!(!record.needs_blob());
        let view = EntryView::new(record, None);
        assert_eq!(view.full_sequence().as_string(), "ACGTACGT");
    }

    #[test]
    fn long_entry_roundtrips_through_blob() {
        let s = "ACGT".repeat(10); // 40 bases, exceeds the 28-base inline prefix
        let (record, dir) = roundtrip(&s);
        assert!(record.needs_blob());
        let blob = BlobReader::open(dir.path().join("blob.bin")).unwrap();
        let view = EntryView::new(record, Some(&blob));
        assert_eq!(view.full_sequence().as_string(), s);
    }

    #[test]
    fn equal_entries_compare_equal_via_inline_fast_path() {
        let (r1, _d1) = roundtrip("ACGTACGT");
        let (r2, _d2) = roundtrip("ACGTACGT");
        let v1 = EntryView::new(r1, None);
        let v2 = EntryView::new(r2, None);
        assert_eq!(v1.compare_to(&v2), CompareResult::Equal);
    }

    #[test]
    fn popped_drops_leading_base() {
        let (record, _dir) = roundtrip("ACGT");
        let view = EntryView::new(record, None);
        assert_eq!(view.popped().as_string(), "CGT");
        assert_eq!(view.leading_base().unwrap().to_char(), 'A');
    }
}

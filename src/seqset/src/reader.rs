use std::path::Path;

use dna_core::{Base, DnaCursor, DnaSequence, DnaSlice};
use membuf::MemBuf;
use varbit::VarBitView;

use crate::bitset::BitsetView;
use crate::error::SeqsetError;
use crate::layout;
use crate::meta::SeqsetMeta;

/// An `[begin, end)` range of entry ids -- the unit [`SeqsetReader::push_front`]
/// and the tracer (spec.md 4.H) operate over. `end - begin == 1` denotes a
/// single concrete seqset entry (spec.md 3.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryRange {
    pub begin: u64,
    pub end: u64,
}

impl EntryRange {
    #[must_use]
    pub fn len(self) -> u64 {
        self.end - self.begin
    }

    #[must_use]
    pub fn is_empty(self) -> bool {
        self.begin >= self.end
    }

    #[must_use]
    pub fn is_unique(self) -> bool {
        self.len() == 1
    }
}

/// Read-only, mmap-backed access to a finished seqset (spec.md 3.2/6.1).
pub struct SeqsetReader {
    meta: SeqsetMeta,
    shared: MemBuf<'static>,
    sizes: MemBuf<'static>,
    bases: MemBuf<'static>,
    prev: [MemBuf<'static>; 4],
}

impl SeqsetReader {
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, SeqsetError> {
        let dir = dir.as_ref();
        let meta_path = layout::meta_path(dir);
        let meta_bytes = std::fs::read(&meta_path).map_err(|source| SeqsetError::Io { path: meta_path.display().to_string(), source })?;
        let meta: SeqsetMeta =
            serde_json::from_slice(&meta_bytes).map_err(|source| SeqsetError::Meta { path: meta_path.display().to_string(), source })?;

        let shared = MemBuf::map_file(layout::shared_path(dir))?;
        let sizes = MemBuf::map_file(layout::sizes_path(dir))?;
        let bases = MemBuf::map_file(layout::bases_path(dir))?;
        let prev = [
            MemBuf::map_file(layout::prev_path(dir, Base::A))?,
            MemBuf::map_file(layout::prev_path(dir, Base::C))?,
            MemBuf::map_file(layout::prev_path(dir, Base::G))?,
            MemBuf::map_file(layout::prev_path(dir, Base::T))?,
        ];
        Ok(SeqsetReader { meta, shared, sizes, bases, prev })
    }

    #[must_use]
    pub fn meta(&self) -> &SeqsetMeta {
        &self.meta
    }

    #[must_use]
    pub fn len(&self) -> u64 {
        self.meta.entry_count
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.meta.entry_count == 0
    }

    fn sizes_view(&self) -> VarBitView<'_> {
        VarBitView::new(self.sizes.data(), self.meta.entry_count as usize, self.meta.varbit_width())
    }

    fn shared_view(&self) -> VarBitView<'_> {
        VarBitView::new(self.shared.data(), self.meta.entry_count as usize, self.meta.varbit_width())
    }

    fn prev_view(&self, b: Base) -> BitsetView<'_> {
        BitsetView::new(self.prev[b.value() as usize].data(), self.meta.entry_count as usize)
    }

    #[must_use]
    pub fn size(&self, id: u64) -> u64 {
        self.sizes_view().get(id as usize)
    }

    #[must_use]
    pub fn shared(&self, id: u64) -> u64 {
        self.shared_view().get(id as usize)
    }

    #[must_use]
    pub fn has_prev(&self, id: u64, b: Base) -> bool {
        self.prev_view(b).get(id as usize)
    }

    /// Reconstruct entry `id`'s sequence by decoding the front-coded
    /// `shared`/`sizes`/`bases` chain sequentially from entry 0. Bounded by
    /// `id`, not `O(1)`: consumers that need many sequences should use
    /// [`SeqsetReader::iter_sequences`] instead, which decodes once.
    #[must_use]
    pub fn sequence(&self, id: u64) -> DnaSequence {
        self.iter_sequences().nth(id as usize).expect("id < entry_count")
    }

    /// Walk every entry once in colex order, yielding its full sequence.
    /// Each step reuses the previous sequence's shared prefix rather than
    /// re-decoding from scratch, so the whole seqset decodes in one linear
    /// pass (spec.md 4.F's reconstruction invariant).
    pub fn iter_sequences(&self) -> impl Iterator<Item = DnaSequence> + '_ {
        let sizes = self.sizes_view();
        let shared = self.shared_view();
        let full_bases = self.full_bases_slice();
        let mut offset = 0usize;
        let mut prev = DnaSequence::new();
        (0..self.meta.entry_count as usize).map(move |i| {
            let size = sizes.get(i) as usize;
            let sh = shared.get(i) as usize;
            let new_len = size - sh;
            let mut seq = prev.subseq(0, sh).expect("shared <= prev size");
            seq.copy_bases(full_bases.subseq(offset, new_len).expect("bases section long enough"));
            offset += new_len;
            prev = seq.clone();
            seq
        })
    }

    fn full_bases_slice(&self) -> DnaSlice<'_> {
        if self.meta.bases_len == 0 {
            return DnaSlice::from_cursor(DnaCursor::new(&[], 0, false), 0);
        }
        let cursor = DnaCursor::new(self.bases.data(), 1, false);
        DnaSlice::from_cursor(cursor, self.meta.bases_len as usize)
    }

    /// Narrow `range` by pushing base `b` onto the front of every entry it
    /// denotes (spec.md 3.2): a classic FM-index-style backward step using
    /// `has_prev[b]`'s rank and the precomputed `base_start[b]` offset.
    #[must_use]
    pub fn push_front(&self, range: EntryRange, b: Base) -> EntryRange {
        let view = self.prev_view(b);
        let rank_begin = rank(view, range.begin as usize);
        let rank_end = rank(view, range.end as usize);
        let start = self.meta.base_start[b.value() as usize];
        EntryRange { begin: start + rank_begin, end: start + rank_end }
    }

    #[must_use]
    pub fn full_range(&self) -> EntryRange {
        EntryRange { begin: 0, end: self.meta.entry_count }
    }
}

/// Popcount of `view[0..upto]`. Linear scan: no succinct rank structure is
/// built, since nothing in this workspace exercises ranges large enough
/// for that to matter and correctness is the priority here (see
/// DESIGN.md).
fn rank(view: BitsetView<'_>, upto: usize) -> u64 {
    (0..upto).filter(|&i| view.get(i)).count() as u64
}

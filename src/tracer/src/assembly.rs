use dna_core::DnaSequence;

/// A variant call anchored against reference (spec.md 3.6): `[left, right)`
/// in reference-global coordinates, replaced by `seq` in the assembly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlignedVariant {
    pub left: u64,
    pub right: u64,
    pub seq: DnaSequence,
}

/// A candidate non-reference path through the seqset, anchored at up to two
/// reference coordinates (spec.md 3.6). `left_offset`/`right_offset` are
/// `None` when that side's anchor was dropped rather than rejoined to
/// reference (a dead-end path with at least two supporting reads).
///
/// Invariant: concatenating the reference span left of `left_offset`, each
/// `aligned_variants` entry's replacement alternating with the reference
/// spans between them, and the reference span right of `right_offset`,
/// reproduces `seq` exactly. The aligner (`aligner` crate) is what
/// populates `aligned_variants`; a freshly traced assembly has it empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assembly {
    pub id: u64,
    pub seq: DnaSequence,
    pub left_offset: Option<u64>,
    pub right_offset: Option<u64>,
    pub matches_reference: bool,
    pub left_anchor_len: u32,
    pub right_anchor_len: u32,
    pub read_ids: Vec<u64>,
    pub aligned_variants: Vec<AlignedVariant>,
}

impl Assembly {
    #[must_use]
    pub fn is_anchor_dropped(&self) -> bool {
        self.left_offset.is_none() || self.right_offset.is_none()
    }
}

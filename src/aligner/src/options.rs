/// Cost/size knobs for [`crate::align_assembly`] (spec.md 4.I).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlignerOptions {
    /// Divisor applied to `max(|variant|, |ref span|)` to derive the
    /// smallest match size worth searching for, and the search radius used
    /// by end-anchored matching.
    pub ref_align_factor: u32,
    /// Hard ceiling on the minimum match size derived from `ref_align_factor`.
    pub max_ref_align_bases: u32,
    /// Floor applied to the minimum match size for end-anchored (not
    /// middle) matches, so a dropped anchor still needs a credible overlap
    /// before it's trusted.
    pub min_anchor_drop_overlap: u32,
    /// When every position of an assembly's middle region turns out to
    /// match reference exactly (no aligned_variants survive), keep the
    /// assembly as a reference-match record instead of discarding it.
    pub trace_reference_assemblies: bool,
}

impl Default for AlignerOptions {
    fn default() -> Self {
        AlignerOptions { ref_align_factor: 16, max_ref_align_bases: 32, min_anchor_drop_overlap: 8, trace_reference_assemblies: false }
    }
}

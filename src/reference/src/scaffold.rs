/// A named, gap-free segment of the reference genome, positioned at
/// `global_start` in the flat concatenated sequence the genome stores
/// internally. FASTA records with runs of `N` are split into multiple
/// scaffolds sharing one display name plus a numeric suffix, since the
/// seqset/tracer machinery never walks across an ambiguous-base gap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scaffold {
    pub name: String,
    pub global_start: u64,
    pub len: u64,
}

impl Scaffold {
    #[must_use]
    pub fn global_end(&self) -> u64 {
        self.global_start + self.len
    }

    #[must_use]
    pub fn contains_global(&self, global_offset: u64) -> bool {
        global_offset >= self.global_start && global_offset < self.global_end()
    }
}

use std::path::Path;

use dna_core::{DnaSequence, DnaSlice};

use crate::error::ReferenceError;
use crate::fasta::load_fasta;
use crate::scaffold::Scaffold;

/// The full reference genome: scaffolds plus the flat packed sequence they
/// index into. Walked once by `ref_map` construction and consulted
/// throughout the tracer and aligner for coordinate lookups.
pub struct ReferenceGenome {
    scaffolds: Vec<Scaffold>,
    sequence: DnaSequence,
}

impl ReferenceGenome {
    pub fn load_fasta(path: impl AsRef<Path>) -> Result<Self, ReferenceError> {
        let parsed = load_fasta(path)?;
        Ok(ReferenceGenome { scaffolds: parsed.scaffolds, sequence: parsed.sequence })
    }

    #[must_use]
    pub fn scaffolds(&self) -> &[Scaffold] {
        &self.scaffolds
    }

    #[must_use]
    pub fn scaffold(&self, name: &str) -> Option<&Scaffold> {
        self.scaffolds.iter().find(|s| s.name == name)
    }

    #[must_use]
    pub fn total_len(&self) -> u64 {
        self.sequence.size() as u64
    }

    #[must_use]
    pub fn full_sequence(&self) -> DnaSlice<'_> {
        self.sequence.as_slice()
    }

    /// A view of `[start, start+len)` bases within `scaffold_name`, in
    /// scaffold-local coordinates.
    pub fn slice(&self, scaffold_name: &str, start: u64, len: u64) -> Result<DnaSlice<'_>, ReferenceError> {
        let scaffold = self.scaffold(scaffold_name).ok_or_else(|| ReferenceError::UnknownScaffold(scaffold_name.to_string()))?;
        if start + len > scaffold.len {
            return Err(ReferenceError::OutOfRange { scaffold: scaffold_name.to_string(), offset: start + len, len: scaffold.len });
        }
        self.sequence
            .as_slice()
            .subseq((scaffold.global_start + start) as usize, len as usize)
            .map_err(|_| ReferenceError::OutOfRange { scaffold: scaffold_name.to_string(), offset: start + len, len: scaffold.len })
    }

    /// Scaffold-local coordinate -> flat global coordinate.
    pub fn global_offset(&self, scaffold_name: &str, local_offset: u64) -> Result<u64, ReferenceError> {
        let scaffold = self.scaffold(scaffold_name).ok_or_else(|| ReferenceError::UnknownScaffold(scaffold_name.to_string()))?;
        if local_offset > scaffold.len {
            return Err(ReferenceError::OutOfRange { scaffold: scaffold_name.to_string(), offset: local_offset, len: scaffold.len });
        }
        Ok(scaffold.global_start + local_offset)
    }

    /// Flat global coordinate -> (scaffold name, scaffold-local offset).
    pub fn locate(&self, global_offset: u64) -> Result<(&str, u64), ReferenceError> {
        self.scaffolds
            .iter()
            .find(|s| s.contains_global(global_offset))
            .map(|s| (s.name.as_str(), global_offset - s.global_start))
            .ok_or(ReferenceError::GlobalOffsetOutOfRange(global_offset))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn genome(contents: &str) -> ReferenceGenome {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        f.flush().unwrap();
        ReferenceGenome::load_fasta(f.path()).unwrap()
    }

    #[test]
    fn slice_returns_expected_bases() {
        let g = genome(">chr1\nACGTACGTAC\n");
        let s = g.slice("chr1", 2, 4).unwrap();
        assert_eq!(s.as_string(), "GTAC");
    }

    #[test]
    fn global_offset_roundtrips_through_locate() {
        let g = genome(">chr1\nACGT\n>chr2\nTTTTGG\n");
        let global = g.global_offset("chr2", 2).unwrap();
        let (name, local) = g.locate(global).unwrap();
        assert_eq!(name, "chr2");
        assert_eq!(local, 2);
    }

    #[test]
    fn unknown_scaffold_errors() {
        let g = genome(">chr1\nACGT\n");
        assert!(matches!(g.slice("chrX", 0, 1), Err(ReferenceError::UnknownScaffold(_))));
    }

    #[test]
    fn out_of_range_offset_errors() {
        let g = genome(">chr1\nACGT\n");
        assert!(matches!(g.slice("chr1", 2, 10), Err(ReferenceError::OutOfRange { .. })));
    }
}

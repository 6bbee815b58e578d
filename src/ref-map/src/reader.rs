use std::collections::HashMap;
use std::path::Path;

use membuf::MemBuf;

use crate::entry::{RefMapEntry, COUNT_MASK};
use crate::error::RefMapError;
use crate::layout;
use crate::meta::RefMapMeta;

/// Read-only, mmap-backed access to a finished reference map (spec.md
/// 3.5/6.3): one byte per seqset entry, plus a sparse overflow table for
/// counts that saturated the byte's 6-bit field.
pub struct RefMapReader {
    meta: RefMapMeta,
    counts: MemBuf<'static>,
    overflow: HashMap<u64, u64>,
}

impl RefMapReader {
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, RefMapError> {
        let dir = dir.as_ref();
        let meta_path = layout::meta_path(dir);
        let meta_bytes = std::fs::read(&meta_path).map_err(|source| RefMapError::Io { path: meta_path.display().to_string(), source })?;
        let meta: RefMapMeta =
            serde_json::from_slice(&meta_bytes).map_err(|source| RefMapError::Meta { path: meta_path.display().to_string(), source })?;

        let counts = MemBuf::map_file(layout::counts_path(dir))?;
        if counts.data().len() as u64 != meta.entry_count {
            return Err(RefMapError::EntryCountMismatch { ref_map: counts.data().len() as u64, seqset: meta.entry_count });
        }

        let overflow_path = layout::overflow_path(dir);
        let overflow_bytes =
            std::fs::read(&overflow_path).map_err(|source| RefMapError::Io { path: overflow_path.display().to_string(), source })?;
        let overflow: HashMap<u64, u64> = serde_json::from_slice(&overflow_bytes)
            .map_err(|source| RefMapError::Meta { path: overflow_path.display().to_string(), source })?;

        Ok(RefMapReader { meta, counts, overflow })
    }

    #[must_use]
    pub fn meta(&self) -> &RefMapMeta {
        &self.meta
    }

    #[must_use]
    pub fn entry(&self, id: u64) -> RefMapEntry {
        RefMapEntry(self.counts.data()[id as usize])
    }

    /// The true reference-occurrence count for `id`, folding in the
    /// overflow side-table when the packed byte saturated.
    #[must_use]
    pub fn count(&self, id: u64) -> u64 {
        let e = self.entry(id);
        if e.is_saturated() {
            u64::from(COUNT_MASK) + self.overflow.get(&id).copied().unwrap_or(0)
        } else {
            u64::from(e.raw_count())
        }
    }

    /// Whether `id` appears in the reference exactly once, in exactly one
    /// orientation -- a "unique reference anchor" (the condition the
    /// tracer's rejoin logic needs before trusting a position).
    #[must_use]
    pub fn is_unique(&self, id: u64) -> bool {
        self.count(id) == 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::build;
    use dna_core::DnaSequence as Seq;
    use part_repo::{PartConfig, PartRepoReader, PartRepoWriter};
    use reference::ReferenceGenome;
    use seqset::SeqsetReader;
    use std::io::Write;

    fn build_seqset_and_ref_map(dir: &Path, reads: &[&str], fasta: &str) -> (SeqsetReader, RefMapReader) {
        let cfg = PartConfig::new(2).unwrap();
        let writer = PartRepoWriter::create(dir, "new", cfg, false).unwrap();
        for s in reads {
            let seq = Seq::parse(s).unwrap();
            writer.write(seq.as_slice(), 1, 0).unwrap();
        }
        writer.flush_thread_local().unwrap();
        writer.finish().unwrap();
        let (final_pass, _) = expander::run_to_closure(dir, "new", cfg).unwrap();
        let part_reader = PartRepoReader::open(dir, &final_pass, cfg);
        let seqset_dir = dir.join("seqset_out");
        seqset::build(&seqset_dir, &part_reader).unwrap();
        let seqset_reader = SeqsetReader::open(&seqset_dir).unwrap();

        let fasta_path = dir.join("ref.fa");
        std::fs::File::create(&fasta_path).unwrap().write_all(fasta.as_bytes()).unwrap();
        let genome = ReferenceGenome::load_fasta(&fasta_path).unwrap();

        let ref_map_dir = dir.join("ref_map_out");
        build(&ref_map_dir, &seqset_reader, &genome, 4).unwrap();
        let ref_map_reader = RefMapReader::open(&ref_map_dir).unwrap();
        (seqset_reader, ref_map_reader)
    }

    #[test]
    fn unique_forward_hit_is_reported_as_unique() {
        let dir = tempfile::tempdir().unwrap();
        let (seqset, ref_map) = build_seqset_and_ref_map(dir.path(), &["AACG"], ">chr1\nTTAACGAA\n");
        let sequences: Vec<String> = seqset.iter_sequences().map(|s| s.as_string()).collect();
        let id = sequences.iter().position(|s| s == "AACG").unwrap() as u64;
        assert!(ref_map.is_unique(id));
        assert_eq!(ref_map.count(id), 1);
        assert!(ref_map.entry(id).forward());
    }

    #[test]
    fn entry_never_seen_in_reference_has_zero_count() {
        let dir = tempfile::tempdir().unwrap();
        let (seqset, ref_map) = build_seqset_and_ref_map(dir.path(), &["AACG"], ">chr1\nTTTTTTTT\n");
        let sequences: Vec<String> = seqset.iter_sequences().map(|s| s.as_string()).collect();
        let id = sequences.iter().position(|s| s == "AACG").unwrap() as u64;
        assert_eq!(ref_map.count(id), 0);
        assert!(!ref_map.is_unique(id));
    }

    #[test]
    fn saturated_count_folds_in_overflow_table() {
        let dir = tempfile::tempdir().unwrap();
        // Build a reference containing many separate copies of "AACG" so
        // its packed count saturates and overflow recording kicks in.
        let mut fasta = String::from(">chr1\n");
        for _ in 0..80 {
            fasta.push_str("AACGTT");
        }
        fasta.push('\n');
        let (seqset, ref_map) = build_seqset_and_ref_map(dir.path(), &["AACG"], &fasta);
        let sequences: Vec<String> = seqset.iter_sequences().map(|s| s.as_string()).collect();
        let id = sequences.iter().position(|s| s == "AACG").unwrap() as u64;
        assert!(ref_map.entry(id).is_saturated());
        assert!(ref_map.count(id) > u64::from(COUNT_MASK));
    }
}

use std::collections::HashMap;
use std::path::Path;

use dna_core::DnaSlice;
use reference::ReferenceGenome;
use seqset::SeqsetReader;

use crate::entry::{self, COUNT_MASK};
use crate::error::RefMapError;
use crate::layout;
use crate::meta::RefMapMeta;

/// Walk every reference scaffold and mark, for each seqset entry that
/// exactly matches a read-length window of the reference, whether it
/// appeared in the forward orientation, the reverse-complemented
/// orientation, or both, and how many times (spec.md 3.5/4.G).
///
/// `max_window` bounds the window length tried at each position -- in
/// practice the longest read length the seqset was built from
/// (`seqset.meta().max_read_len`), since a window longer than any read
/// could never match a seqset entry exactly.
pub fn build(
    out_dir: impl AsRef<Path>,
    seqset: &SeqsetReader,
    genome: &ReferenceGenome,
    max_window: u32,
) -> Result<RefMapMeta, RefMapError> {
    let out_dir = out_dir.as_ref();
    std::fs::create_dir_all(out_dir).map_err(|source| RefMapError::Io { path: out_dir.display().to_string(), source })?;

    let entry_count = seqset.len();
    let mut counts = vec![0u8; entry_count as usize];
    let mut overflow: HashMap<u64, u64> = HashMap::new();
    let mut total_marked = 0u64;

    for scaffold in genome.scaffolds() {
        let full = genome.slice(&scaffold.name, 0, scaffold.len)?;
        total_marked += scan_scaffold(seqset, full, max_window, &mut counts, &mut overflow);
    }

    log::info!(
        "ref-map builder: {total_marked} reference windows matched a unique seqset entry across {} scaffolds",
        genome.scaffolds().len()
    );

    let meta = RefMapMeta::new(seqset.meta().uuid, entry_count);
    write_section(&layout::counts_path(out_dir), &counts)?;
    let overflow_json = serde_json::to_vec_pretty(&overflow).expect("overflow map always serializes");
    write_section(&layout::overflow_path(out_dir), &overflow_json)?;
    let meta_json = serde_json::to_vec_pretty(&meta).expect("RefMapMeta always serializes");
    write_section(&layout::meta_path(out_dir), &meta_json)?;

    Ok(meta)
}

/// Slide a read-length window across `full` (a whole scaffold's forward
/// sequence), growing from length 1 up to `max_window` near the start and
/// then holding steady at `max_window`, testing both the window itself
/// (forward match) and its reverse complement (reverse match) against the
/// seqset at every position. Returns the number of positions that hit a
/// unique, exactly-sized seqset entry.
fn scan_scaffold(
    seqset: &SeqsetReader,
    full: DnaSlice<'_>,
    max_window: u32,
    counts: &mut [u8],
    overflow: &mut HashMap<u64, u64>,
) -> u64 {
    let max_window = max_window as usize;
    let len = full.len();
    let mut marked = 0u64;

    for end in 1..=len {
        let window_len = max_window.min(end);
        let start = end - window_len;
        let window = full.subseq(start, window_len).expect("start+window_len <= len by construction");

        if let Some(id) = unique_match(seqset, window) {
            record_hit(counts, overflow, id, entry::FORWARD_FLAG);
            marked += 1;
        }
        let rc_window = window.rev_comp();
        if let Some(id) = unique_match(seqset, rc_window) {
            record_hit(counts, overflow, id, entry::REVERSE_FLAG);
            marked += 1;
        }
    }
    marked
}

/// Backward-search `window` through the seqset (spec.md 3.2): push its
/// bases onto the full range from last to first, so the narrowed range
/// denotes exactly `window`'s sequence. Returns the matched entry id only
/// if the range is a single entry whose size equals the window -- a
/// shorter seqset entry that happens to be a prefix of a longer candidate
/// doesn't count as a match.
fn unique_match(seqset: &SeqsetReader, window: DnaSlice<'_>) -> Option<u64> {
    let mut range = seqset.full_range();
    for i in (0..window.len()).rev() {
        if range.is_empty() {
            return None;
        }
        range = seqset.push_front(range, window.get(i));
    }
    if range.is_unique() && seqset.size(range.begin) as usize == window.len() {
        Some(range.begin)
    } else {
        None
    }
}

fn record_hit(counts: &mut [u8], overflow: &mut HashMap<u64, u64>, id: u64, flag: u8) {
    let current = counts[id as usize];
    if current & COUNT_MASK == COUNT_MASK {
        counts[id as usize] = current | flag;
        *overflow.entry(id).or_insert(0) += 1;
    } else {
        counts[id as usize] = entry::bump(current, flag);
    }
}

fn write_section(path: &Path, bytes: &[u8]) -> Result<(), RefMapError> {
    std::fs::write(path, bytes).map_err(|source| RefMapError::Io { path: path.display().to_string(), source })
}

#[cfg(test)]
mod tests {
    use super::*;
    use dna_core::DnaSequence as Seq;
    use part_repo::{PartConfig, PartRepoReader, PartRepoWriter};
    use std::io::Write;

    fn build_seqset_from(dir: &Path, strs: &[&str]) -> SeqsetReader {
        let cfg = PartConfig::new(2).unwrap();
        let writer = PartRepoWriter::create(dir, "new", cfg, false).unwrap();
        for s in strs {
            let seq = Seq::parse(s).unwrap();
            writer.write(seq.as_slice(), 1, 0).unwrap();
        }
        writer.flush_thread_local().unwrap();
        writer.finish().unwrap();
        let (final_pass, _) = expander::run_to_closure(dir, "new", cfg).unwrap();
        let reader = PartRepoReader::open(dir, &final_pass, cfg);
        let out_dir = dir.join("seqset_out");
        seqset::build(&out_dir, &reader).unwrap();
        SeqsetReader::open(&out_dir).unwrap()
    }

    fn fasta_genome(dir: &Path, contents: &str) -> ReferenceGenome {
        let path = dir.join("ref.fa");
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        ReferenceGenome::load_fasta(&path).unwrap()
    }

    #[test]
    fn forward_match_sets_forward_flag_and_count() {
        let dir = tempfile::tempdir().unwrap();
        // "AACG" (not a palindrome: rev_comp("AACG") == "CGTT") is a seqset
        // entry; a reference containing "AACG" literally, but never its
        // reverse complement "CGTT", should mark only the forward flag.
        let seqset = build_seqset_from(dir.path(), &["AACG"]);
        let genome = fasta_genome(dir.path(), ">chr1\nTTAACGAA\n");

        let out_dir = dir.path().join("ref_map_out");
        let meta = build(&out_dir, &seqset, &genome, 4).unwrap();
        assert_eq!(meta.entry_count, seqset.len());

        let counts = std::fs::read(layout::counts_path(&out_dir)).unwrap();
        let sequences: Vec<String> = seqset.iter_sequences().map(|s| s.as_string()).collect();
        let id = sequences.iter().position(|s| s == "AACG").unwrap();
        let e = entry::RefMapEntry(counts[id]);
        assert!(e.forward(), "expected AACG to be marked forward, got {e:?}");
        assert!(!e.reverse(), "did not expect AACG to be marked reverse, got {e:?}");
        assert_eq!(e.raw_count(), 1);
    }

    #[test]
    fn reverse_complement_match_sets_reverse_flag() {
        let dir = tempfile::tempdir().unwrap();
        let seqset = build_seqset_from(dir.path(), &["ACGT"]);
        // rev_comp("ACGT") == "ACGT" would be ambiguous (palindrome); use a
        // non-palindromic entry instead: rev_comp("AACG") == "CGTT".
        let seqset2 = build_seqset_from(&dir.path().join("b"), &["AACG"]);
        let genome = fasta_genome(&dir.path().join("b"), ">chr1\nTTCGTTTT\n");
        let out_dir = dir.path().join("b").join("ref_map_out");
        let meta = build(&out_dir, &seqset2, &genome, 4).unwrap();

        let counts = std::fs::read(layout::counts_path(&out_dir)).unwrap();
        let sequences: Vec<String> = seqset2.iter_sequences().map(|s| s.as_string()).collect();
        let id = sequences.iter().position(|s| s == "AACG").unwrap();
        let e = entry::RefMapEntry(counts[id]);
        assert!(e.reverse(), "expected AACG to be marked reverse, got {:?}", e);
        let _ = meta;
    }

    #[test]
    fn non_matching_window_length_is_not_recorded() {
        let dir = tempfile::tempdir().unwrap();
        let seqset = build_seqset_from(dir.path(), &["ACGT"]);
        // A reference that only ever contains "ACG" as a 3-base run (never
        // the full 4-base "ACGT") should mark nothing for that entry.
        let genome = fasta_genome(dir.path(), ">chr1\nTTTACGATT\n");
        let out_dir = dir.path().join("ref_map_out");
        build(&out_dir, &seqset, &genome, 4).unwrap();
        let counts = std::fs::read(layout::counts_path(&out_dir)).unwrap();
        let sequences: Vec<String> = seqset.iter_sequences().map(|s| s.as_string()).collect();
        let id = sequences.iter().position(|s| s == "ACGT").unwrap();
        assert_eq!(counts[id], 0);
    }
}

use std::collections::HashMap;

use dna_core::{DnaSequence, DnaSlice};
use reference::ReferenceGenome;
use tracer::{AlignedVariant, Assembly};

use crate::error::AlignerError;
use crate::options::AlignerOptions;

/// Where a candidate match is allowed to sit within the region being
/// searched (spec.md 4.I step 2's "middle" vs. end-anchored search modes).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Anchor {
    Both,
    Left,
    Right,
}

/// Outcome of [`align_assembly`]: whether the caller should keep emitting
/// this assembly, or whether it turned out to be a pure reference match
/// that the options say to drop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlignOutcome {
    Kept,
    Discarded,
}

struct Work<'a> {
    left_offset: u64,
    right_offset: u64,
    seq: DnaSlice<'a>,
    reference: DnaSlice<'a>,
}

/// Re-express a non-reference assembly as a sequence of aligned sub-variants
/// against `scaffold` (spec.md 4.I). No-op for assemblies that already
/// match reference or that dropped an anchor on either side (there's no
/// reference span to align against in that case).
pub fn align_assembly(a: &mut Assembly, scaffold: &str, genome: &ReferenceGenome, options: &AlignerOptions) -> Result<AlignOutcome, AlignerError> {
    if a.matches_reference {
        return Ok(AlignOutcome::Kept);
    }

    let (Some(left_offset), Some(right_offset)) = (a.left_offset, a.right_offset) else {
        return Ok(AlignOutcome::Kept);
    };
    if right_offset < left_offset {
        return Err(AlignerError::InvertedSpan { scaffold: scaffold.to_string(), left: left_offset, right: right_offset });
    }

    let ref_span = genome.slice(scaffold, left_offset, right_offset - left_offset)?;
    let seq = a.seq.as_slice();
    let max_len = seq.len().min(ref_span.len());

    let mut shared_left = ref_span.shared_prefix_length(seq);
    let shared_right = ref_span.rev_comp().shared_prefix_length(seq.rev_comp());
    if shared_left + shared_right > max_len {
        shared_left = max_len - shared_right;
    }

    let var_seq = seq.subseq(shared_left, seq.len() - shared_left - shared_right)?;
    let var_ref = ref_span.subseq(shared_left, ref_span.len() - shared_left - shared_right)?;
    let var_left_offset = left_offset + shared_left as u64;
    let var_right_offset = right_offset - shared_right as u64;

    a.aligned_variants.clear();
    let mut stack = vec![Work { left_offset: var_left_offset, right_offset: var_right_offset, seq: var_seq, reference: var_ref }];
    while let Some(work) = stack.pop() {
        process(work, options, &mut a.aligned_variants, &mut stack);
    }
    a.aligned_variants.sort_by(|x, y| x.left.cmp(&y.left).then(x.right.cmp(&y.right)));

    a.left_anchor_len = shared_left as u32;
    a.right_anchor_len = shared_right as u32;

    if a.aligned_variants.is_empty() {
        debug_assert_eq!(seq.len(), (right_offset - left_offset) as usize);
        if !options.trace_reference_assemblies {
            return Ok(AlignOutcome::Discarded);
        }
        a.matches_reference = true;
        a.left_anchor_len = 0;
        a.right_anchor_len = 0;
    }

    Ok(AlignOutcome::Kept)
}

fn process<'a>(work: Work<'a>, options: &AlignerOptions, out: &mut Vec<AlignedVariant>, stack: &mut Vec<Work<'a>>) {
    if work.seq.is_empty() {
        return;
    }

    if let Some((match_len, seq_start, ref_start)) = find_biggest_match_with_ends(work.seq, work.reference, options) {
        let mid_left_offset = work.left_offset + ref_start as u64;
        let mid_right_offset = mid_left_offset + match_len as u64;

        let left = Work {
            left_offset: work.left_offset,
            right_offset: mid_left_offset,
            seq: work.seq.subseq(0, seq_start).expect("seq_start within bounds"),
            reference: work.reference.subseq(0, ref_start).expect("ref_start within bounds"),
        };
        let right = Work {
            left_offset: mid_right_offset,
            right_offset: work.right_offset,
            seq: work.seq.subseq(seq_start + match_len, work.seq.len() - seq_start - match_len).expect("remainder within bounds"),
            reference: work.reference.subseq(ref_start + match_len, work.reference.len() - ref_start - match_len).expect("remainder within bounds"),
        };

        if !left.seq.is_empty() {
            stack.push(left);
        }
        if !right.seq.is_empty() {
            stack.push(right);
        }
    } else {
        out.push(AlignedVariant { left: work.left_offset, right: work.right_offset, seq: DnaSequence::from_bases(work.seq.iter()) });
    }
}

/// Try a middle (both-ends-floating) match first; fall back to an
/// end-anchored match shrinking from the middle search's minimum size.
fn find_biggest_match_with_ends(seq: DnaSlice<'_>, reference: DnaSlice<'_>, options: &AlignerOptions) -> Option<(usize, usize, usize)> {
    let (found, min_match_size) = find_biggest_match(seq, reference, options, Anchor::Both);
    if found.is_some() {
        return found;
    }
    find_end_matches(seq, reference, options, min_match_size.saturating_sub(1))
}

/// Search match sizes from `max_match_size` (the shorter of `seq`/`reference`)
/// down to a `ref_align_factor`-derived minimum, returning the first (hence
/// biggest) size that matches. Also returns that minimum, which the
/// end-matching fallback needs even on failure.
///
/// Unlike the original's binary search over match sizes (valid only because
/// "does a match of size >= k exist" is assumed monotonic in k), this walks
/// sizes one at a time -- a straightforward linear scan that doesn't lean on
/// that assumption, at the cost of the original's logarithmic speedup.
fn find_biggest_match(seq: DnaSlice<'_>, reference: DnaSlice<'_>, options: &AlignerOptions, anchor: Anchor) -> (Option<(usize, usize, usize)>, usize) {
    let mut min_match_size = (seq.len().max(reference.len()) / options.ref_align_factor as usize).max(1);
    if min_match_size > options.max_ref_align_bases as usize {
        min_match_size = options.max_ref_align_bases as usize;
    }
    if anchor != Anchor::Both && min_match_size < options.min_anchor_drop_overlap as usize {
        min_match_size = options.min_anchor_drop_overlap as usize;
    }

    let max_match_size = seq.len().min(reference.len());
    if max_match_size < min_match_size {
        return (None, min_match_size);
    }

    for size in (min_match_size..=max_match_size).rev() {
        if let Some(found) = find_match(seq, reference, size, anchor) {
            return (Some((size, found.0, found.1)), min_match_size);
        }
    }
    (None, min_match_size)
}

/// Shrink the match size from `max_match_size` down to 1, each time trying
/// a match anchored to the left end and one anchored to the right end,
/// restricted to a window growing outward from that end.
fn find_end_matches(seq: DnaSlice<'_>, reference: DnaSlice<'_>, options: &AlignerOptions, max_match_size: usize) -> Option<(usize, usize, usize)> {
    let shortest_len = seq.len().min(reference.len());
    let mut match_len = max_match_size.min(shortest_len);

    while match_len >= 1 {
        let search_len = match match_len {
            1 => 2,
            2 => 3,
            3 => 5,
            4 => 7,
            _ => match_len * options.ref_align_factor as usize,
        }
        .min(shortest_len);

        let left_seq = seq.subseq(0, search_len).expect("search_len <= shortest_len <= seq.len()");
        let left_ref = reference.subseq(0, search_len).expect("search_len <= shortest_len <= reference.len()");
        if let Some((seq_start, ref_start)) = find_match(left_seq, left_ref, match_len, Anchor::Left) {
            return Some((match_len, seq_start, ref_start));
        }

        let right_seq = seq.subseq(seq.len() - search_len, search_len).expect("search_len <= seq.len()");
        let right_ref = reference.subseq(reference.len() - search_len, search_len).expect("search_len <= reference.len()");
        if let Some((seq_start, ref_start)) = find_match(right_seq, right_ref, match_len, Anchor::Right) {
            return Some((match_len, seq_start + seq.len() - search_len, ref_start + reference.len() - search_len));
        }

        match_len -= 1;
    }

    None
}

/// Whether a window of exactly `match_len` bases exists in both `seq` and
/// `reference`, choosing (among all equal windows) the one whose 2D offset
/// from the pair's anchor point is smallest. A raw (non-canonical) k-mer
/// index keyed on up to the first 30 bases of each candidate window narrows
/// the search; windows longer than 30 bases are verified base-by-base once
/// their k-mer prefix matches.
fn find_match(seq: DnaSlice<'_>, reference: DnaSlice<'_>, match_len: usize, anchor: Anchor) -> Option<(usize, usize)> {
    if match_len == 0 || match_len > seq.len() || match_len > reference.len() {
        return None;
    }

    let (seq_anchor, ref_anchor) = match anchor {
        Anchor::Both => ((seq.len() - match_len) / 2, (reference.len() - match_len) / 2),
        Anchor::Left => (0, 0),
        Anchor::Right => (seq.len(), reference.len()),
    };

    let kmer_size = match_len.min(30);
    let seq_windows = seq.len() - match_len + 1;
    let mut seq_kmers: HashMap<u64, Vec<usize>> = HashMap::new();
    for seq_offset in 0..seq_windows {
        let k = raw_kmer(seq, seq_offset, kmer_size);
        seq_kmers.entry(k).or_default().push(seq_offset);
    }

    let mut best_distance = i64::MAX;
    let mut best = None;
    let ref_windows = reference.len() - match_len + 1;
    for ref_offset in 0..ref_windows {
        let k = raw_kmer(reference, ref_offset, kmer_size);
        let Some(positions) = seq_kmers.get(&k) else {
            continue;
        };
        let ref_distance = ref_offset as i64 - ref_anchor as i64;
        for &seq_offset in positions {
            let seq_distance = seq_offset as i64 - seq_anchor as i64;
            let distance = (seq_distance - ref_distance).abs();
            if distance > best_distance {
                continue;
            }
            if match_len > kmer_size {
                let a = seq.subseq(seq_offset, match_len).expect("bounded by seq_windows");
                let b = reference.subseq(ref_offset, match_len).expect("bounded by ref_windows");
                if a != b {
                    continue;
                }
            }
            best_distance = distance;
            best = Some((seq_offset, ref_offset));
        }
    }

    best
}

/// MSB-aligned 2-bit encoding of `slice[offset..offset+k]`, deliberately not
/// rolled incrementally across positions (no succinct rolling-hash
/// structure; see DESIGN.md for the same tradeoff made in `seqset`'s rank
/// scan).
fn raw_kmer(slice: DnaSlice<'_>, offset: usize, k: usize) -> u64 {
    let mut word = 0u64;
    for i in 0..k {
        word = (word << 2) | u64::from(slice.get(offset + i).value());
    }
    word
}

#[cfg(test)]
mod tests {
    use super::*;
    use dna_core::DnaSequence;
    use std::io::Write;
    use tracer::AlignedVariant;

    fn genome(contents: &str) -> ReferenceGenome {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        f.flush().unwrap();
        ReferenceGenome::load_fasta(f.path()).unwrap()
    }

    fn assembly(seq: &str, left_offset: u64, right_offset: u64) -> Assembly {
        Assembly {
            id: 0,
            seq: DnaSequence::parse(seq).unwrap(),
            left_offset: Some(left_offset),
            right_offset: Some(right_offset),
            matches_reference: false,
            left_anchor_len: 0,
            right_anchor_len: 0,
            read_ids: Vec::new(),
            aligned_variants: Vec::new(),
        }
    }

    #[test]
    fn single_snp_emits_one_aligned_variant() {
        // spec.md's S6 scenario: assembly "ACGATACGT" against ref
        // "ACGTTACGT" emits exactly one variant at offset 3 replacing "T"
        // with "A".
        let g = genome(">chr1\nACGTTACGT\n");
        let mut a = assembly("ACGATACGT", 0, 9);
        let options = AlignerOptions::default();
        let outcome = align_assembly(&mut a, "chr1", &g, &options).unwrap();
        assert_eq!(outcome, AlignOutcome::Kept);
        assert_eq!(a.aligned_variants.len(), 1);
        let v = &a.aligned_variants[0];
        assert_eq!(v.left, 3);
        assert_eq!(v.right, 4);
        assert_eq!(v.seq.as_string(), "A");
    }

    #[test]
    fn perfect_reference_match_discards_by_default() {
        let g = genome(">chr1\nACGTACGTAC\n");
        let mut a = assembly("ACGTACGTAC", 0, 10);
        let options = AlignerOptions::default();
        let outcome = align_assembly(&mut a, "chr1", &g, &options).unwrap();
        assert_eq!(outcome, AlignOutcome::Discarded);
        assert!(a.aligned_variants.is_empty());
    }

    #[test]
    fn perfect_reference_match_kept_when_tracing_reference_assemblies() {
        let g = genome(">chr1\nACGTACGTAC\n");
        let mut a = assembly("ACGTACGTAC", 0, 10);
        let options = AlignerOptions { trace_reference_assemblies: true, ..AlignerOptions::default() };
        let outcome = align_assembly(&mut a, "chr1", &g, &options).unwrap();
        assert_eq!(outcome, AlignOutcome::Kept);
        assert!(a.matches_reference);
        assert_eq!(a.left_anchor_len, 0);
        assert_eq!(a.right_anchor_len, 0);
    }

    #[test]
    fn assembly_already_matching_reference_is_left_untouched() {
        let g = genome(">chr1\nACGTACGTAC\n");
        let mut a = assembly("ACGTACGTAC", 0, 10);
        a.matches_reference = true;
        let before: Vec<AlignedVariant> = a.aligned_variants.clone();
        let options = AlignerOptions::default();
        let outcome = align_assembly(&mut a, "chr1", &g, &options).unwrap();
        assert_eq!(outcome, AlignOutcome::Kept);
        assert_eq!(a.aligned_variants, before);
    }

    #[test]
    fn anchor_dropped_assembly_is_skipped() {
        let g = genome(">chr1\nACGTACGTAC\n");
        let mut a = assembly("ACGTACGTAC", 0, 10);
        a.right_offset = None;
        let options = AlignerOptions::default();
        let outcome = align_assembly(&mut a, "chr1", &g, &options).unwrap();
        assert_eq!(outcome, AlignOutcome::Kept);
        assert!(a.aligned_variants.is_empty());
    }
}

use dna_core::{CompareResult, DnaSequence};
use part_repo::PartRepoWriter;

use crate::error::ExpanderError;
use crate::options::ExpandOptions;

fn compare(a: &DnaSequence, b: &DnaSequence) -> CompareResult {
    a.as_slice().compare_to(b.as_slice())
}

/// Collapse adjacent duplicates/prefixes in an already-sorted run, keeping
/// the longer of any prefix-or-equal pair (spec.md 4.D.3: "the longer
/// wins; the shorter is dropped"). Returns the deduped run and how many
/// entries were dropped.
pub fn dedup_adjacent(mut sorted: Vec<DnaSequence>) -> (Vec<DnaSequence>, u64) {
    if sorted.len() < 2 {
        return (sorted, 0);
    }
    let mut out: Vec<DnaSequence> = Vec::with_capacity(sorted.len());
    let mut dropped = 0u64;
    let mut drain = sorted.drain(..);
    let mut current = drain.next().expect("len >= 2");
    for next in drain {
        match compare(&current, &next) {
            CompareResult::Equal | CompareResult::FirstIsPrefix => {
                // `next` is equal to or a strict extension of `current`: it wins.
                dropped += 1;
                current = next;
            }
            CompareResult::SecondIsPrefix => {
                // `next` is a (strict) prefix of `current`: `current` wins.
                dropped += 1;
            }
            CompareResult::FirstLess | CompareResult::SecondLess => {
                out.push(current);
                current = next;
            }
        }
    }
    out.push(current);
    (out, dropped)
}

/// Emit at most `opts.count` descendants of `entry`'s pop-front chain,
/// the first popping one base and each subsequent popping `opts.stride`
/// more, into whichever partition of `writer`'s pass they belong to.
/// Returns how many were actually emitted (fewer than `count` once the
/// chain runs out of bases).
pub fn write_with_expansions(writer: &PartRepoWriter, entry: &DnaSequence, opts: ExpandOptions) -> Result<u64, ExpanderError> {
    let mut popped = 0usize;
    let mut emitted = 0u64;
    while emitted < u64::from(opts.count) {
        let step = if emitted == 0 { 1 } else { opts.stride as usize };
        popped += step;
        if popped >= entry.size() {
            break;
        }
        let suffix = entry.subseq(popped, entry.size() - popped).expect("popped < size");
        writer.write(suffix.as_slice(), 1, 0)?;
        emitted += 1;
    }
    Ok(emitted)
}

/// Two-pointer merge of an already-sorted, already-unique run against a
/// freshly deduped run of new entries. For each new entry actually kept
/// (i.e. not dropped as a duplicate/shorter-prefix of something already
/// present), optionally emits its pop-front expansions via `expand_into`.
///
/// Returns `(merged, new_dedup_count, expanded_count)`.
pub fn merge_sorted_and_new(
    old: Vec<DnaSequence>,
    new_sorted: Vec<DnaSequence>,
    expand_into: Option<(&PartRepoWriter, ExpandOptions)>,
) -> Result<(Vec<DnaSequence>, u64, u64), ExpanderError> {
    let (new, mut dedup_count) = dedup_adjacent(new_sorted);

    let mut merged = Vec::with_capacity(old.len() + new.len());
    let mut expanded_count = 0u64;
    let mut i = 0usize;
    let mut j = 0usize;

    let mut emit_new = |entry: DnaSequence, merged: &mut Vec<DnaSequence>, expanded_count: &mut u64| -> Result<(), ExpanderError> {
        if let Some((writer, opts)) = expand_into {
            *expanded_count += write_with_expansions(writer, &entry, opts)?;
        }
        merged.push(entry);
        Ok(())
    };

    while i < old.len() && j < new.len() {
        match compare(&old[i], &new[j]) {
            CompareResult::FirstLess => {
                merged.push(old[i].clone());
                i += 1;
            }
            CompareResult::SecondLess => {
                emit_new(new[j].clone(), &mut merged, &mut expanded_count)?;
                j += 1;
            }
            CompareResult::Equal => {
                // Already present: keep the existing entry, new one is a duplicate.
                merged.push(old[i].clone());
                dedup_count += 1;
                i += 1;
                j += 1;
            }
            CompareResult::FirstIsPrefix => {
                // `old[i]` is a strict prefix of `new[j]`: the new, longer
                // entry wins and replaces it; the short form is dropped as
                // an already-expanded descendant of the longer one.
                emit_new(new[j].clone(), &mut merged, &mut expanded_count)?;
                dedup_count += 1;
                i += 1;
                j += 1;
            }
            CompareResult::SecondIsPrefix => {
                // `new[j]` is a strict prefix of something we already have.
                merged.push(old[i].clone());
                dedup_count += 1;
                i += 1;
                j += 1;
            }
        }
    }
    while i < old.len() {
        merged.push(old[i].clone());
        i += 1;
    }
    while j < new.len() {
        emit_new(new[j].clone(), &mut merged, &mut expanded_count)?;
        j += 1;
    }

    Ok((merged, dedup_count, expanded_count))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seqs(strs: &[&str]) -> Vec<DnaSequence> {
        strs.iter().map(|s| DnaSequence::parse(s).unwrap()).collect()
    }

    fn as_strings(seqs: &[DnaSequence]) -> Vec<String> {
        seqs.iter().map(DnaSequence::as_string).collect()
    }

    #[test]
    fn dedup_adjacent_keeps_longer_of_prefix_pairs() {
        let mut input = seqs(&["ACGTACGT", "CG", "CTCG", "G", "TCG", "TCG"]);
        input.sort();
        let (deduped, dropped) = dedup_adjacent(input);
        assert_eq!(as_strings(&deduped), vec!["ACGTACGT", "CG", "CTCG", "G", "TCG"]);
        assert_eq!(dropped, 1);
    }

    #[test]
    fn merge_without_expansion_matches_scenario_s3_first_pass() {
        // spec.md 8.2 S3: {"TCG","CG","ACTCG"} sorted colex -> "ACTCG","CG","TCG"
        // (CTCG/G only appear after pop-front expansion, covered separately).
        let mut new_sorted = seqs(&["TCG", "CG", "ACTCG"]);
        new_sorted.sort();
        let (merged, _dedup, _expanded) = merge_sorted_and_new(Vec::new(), new_sorted, None).unwrap();
        assert_eq!(as_strings(&merged), vec!["ACTCG", "CG", "TCG"]);
    }

    #[test]
    fn merge_prefers_longer_entry_on_prefix_collision() {
        let old = seqs(&["CG"]);
        let new_sorted = seqs(&["CGAA"]);
        let (merged, dedup, _expanded) = merge_sorted_and_new(old, new_sorted, None).unwrap();
        assert_eq!(as_strings(&merged), vec!["CGAA"]);
        assert_eq!(dedup, 1);
    }

    #[test]
    fn merge_is_stable_when_nothing_new() {
        let old = seqs(&["AA", "CC", "GG"]);
        let (merged, dedup, _expanded) = merge_sorted_and_new(old.clone(), Vec::new(), None).unwrap();
        assert_eq!(as_strings(&merged), as_strings(&old));
        assert_eq!(dedup, 0);
    }

    #[test]
    fn expansion_stride_and_count_match_spec_example() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = part_repo::PartConfig::new(2).unwrap();
        let writer = PartRepoWriter::create(dir.path(), "expanded", cfg, false).unwrap();
        let entry = DnaSequence::parse("ACGTACG").unwrap(); // 7 bases, stand-in for spec's "ABCDEFG"
        let emitted = write_with_expansions(&writer, &entry, ExpandOptions::new(2, 255)).unwrap();
        writer.flush_thread_local().unwrap();
        writer.finish().unwrap();
        // popped sequence: 1,3,5 -> 3 emissions before exhausting 7 bases.
        assert_eq!(emitted, 3);
    }
}

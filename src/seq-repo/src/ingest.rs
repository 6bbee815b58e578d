//! Raw-read sanitization (spec.md §7: "a single read with an invalid
//! character skips that read's remaining kmers"). Raw reads coming off a
//! FASTQ/BAM adapter may carry `N` calls (or any other non-ACGT byte); those
//! never reach a [`DnaSequence`], which has no representation for them.
//! Instead, a raw read is split at ambiguity-base runs into its maximal
//! clean sub-reads before anything downstream (the k-mer counter, the
//! sequence repository) ever sees it.

use dna_core::{DnaError, DnaSequence};

/// Split `raw` (an ASCII FASTQ-style base string, upper or lower case) at
/// runs of non-ACGT characters, returning one [`DnaSequence`] per maximal
/// clean run. Runs shorter than `min_len` bases are dropped -- a lone clean
/// base between two `N`s contributes no k-mers of interest and isn't worth
/// carrying through the pipeline.
#[must_use]
pub fn split_on_ambiguity(raw: &str, min_len: usize) -> Vec<DnaSequence> {
    let mut out = Vec::new();
    let mut run_start = 0usize;
    let chars: Vec<char> = raw.chars().collect();

    let mut flush = |start: usize, end: usize, out: &mut Vec<DnaSequence>| {
        if end <= start || end - start < min_len {
            return;
        }
        let run: String = chars[start..end].iter().collect();
        match DnaSequence::parse(&run) {
            Ok(seq) => out.push(seq),
            Err(DnaError::InvalidSequenceChar { .. }) => {
                // Shouldn't happen: the run was pre-filtered to ACGT only.
                // Defensive only, never expected to trip.
            }
            Err(_) => {}
        }
    };

    for (i, &c) in chars.iter().enumerate() {
        if is_acgt(c) {
            continue;
        }
        flush(run_start, i, &mut out);
        run_start = i + 1;
    }
    flush(run_start, chars.len(), &mut out);
    out
}

fn is_acgt(c: char) -> bool {
    matches!(c.to_ascii_uppercase(), 'A' | 'C' | 'G' | 'T')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_read_passes_through_whole() {
        let parts = split_on_ambiguity("ACGTACGT", 1);
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].to_string(), "ACGTACGT");
    }

    #[test]
    fn n_run_splits_into_two_clean_reads() {
        let parts = split_on_ambiguity("ACGTNNNNACGT", 1);
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].to_string(), "ACGT");
        assert_eq!(parts[1].to_string(), "ACGT");
    }

    #[test]
    fn leading_and_trailing_ambiguity_is_dropped() {
        let parts = split_on_ambiguity("NNACGTNN", 1);
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].to_string(), "ACGT");
    }

    #[test]
    fn short_runs_below_min_len_are_dropped() {
        let parts = split_on_ambiguity("ACGTNANGGGG", 4);
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].to_string(), "GGGG");
    }

    #[test]
    fn all_ambiguous_read_yields_nothing() {
        let parts = split_on_ambiguity("NNNNNNNN", 1);
        assert!(parts.is_empty());
    }

    #[test]
    fn lowercase_bases_are_accepted() {
        let parts = split_on_ambiguity("acgtNacgt", 1);
        assert_eq!(parts.len(), 2);
    }
}

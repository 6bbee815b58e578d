//! Sort/dedup/expand engine (spec.md 4.D): merges freshly discovered
//! entries into a growing, sorted, prefix-closed partitioned entry set,
//! fanning each newly-kept entry's pop-front descendants back out as
//! further "new entries" until a pass produces nothing new.

mod error;
mod merge;
mod options;
mod pass;

pub use error::ExpanderError;
pub use merge::{dedup_adjacent, merge_sorted_and_new, write_with_expansions};
pub use options::ExpandOptions;
pub use pass::sort_and_dedup;

use part_repo::PartConfig;

/// Drive sort+dedup+expand passes to closure: repeatedly merges the
/// current sorted pass against the latest batch of new entries, then
/// the just-emitted expansions against the running sorted pass, until
/// an expand step yields zero fresh entries.
///
/// Named passes used internally: `sorted` (the running, closed set),
/// and two alternating scratch passes for newly-written entries. The
/// caller is expected to have already written the initial batch of
/// "new" entries into `initial_new_pass` before calling this.
///
/// Returns the final pass name holding the closed, sorted entry set,
/// plus the total number of duplicate/redundant entries collapsed
/// across every round.
pub fn run_to_closure(
    dir: impl AsRef<std::path::Path>,
    initial_new_pass: &str,
    config: PartConfig,
) -> Result<(String, u64), ExpanderError> {
    let dir = dir.as_ref();

    let mut sorted_pass = String::from("sorted.0");
    let mut total_dedup = 0u64;

    // Round 0: merge the initial new entries into an (empty) sorted set,
    // fanning their pop-front descendants into scratch pass "expand.0".
    let (dedup, mut expanded) = sort_and_dedup(
        dir,
        None,
        initial_new_pass,
        &sorted_pass,
        Some("expand.0"),
        ExpandOptions::first_pass(),
        config,
    )?;
    total_dedup += dedup;
    log::info!("expander: round 0 closed {dedup} duplicates, emitted {expanded} expansions");

    let mut round = 0u64;
    let mut current_new_pass = String::from("expand.0");
    while expanded > 0 {
        round += 1;
        let next_sorted = format!("sorted.{round}");
        let next_expand = format!("expand.{round}");
        let opts = if round == 1 { ExpandOptions::first_pass() } else { ExpandOptions::second_pass() };

        let (dedup, newly_expanded) = sort_and_dedup(
            dir,
            Some(&sorted_pass),
            &current_new_pass,
            &next_sorted,
            Some(&next_expand),
            opts,
            config,
        )?;
        total_dedup += dedup;
        log::info!("expander: round {round} closed {dedup} duplicates, emitted {newly_expanded} expansions");

        sorted_pass = next_sorted;
        current_new_pass = next_expand;
        expanded = newly_expanded;
    }

    Ok((sorted_pass, total_dedup))
}

#[cfg(test)]
mod tests {
    use super::*;
    use dna_core::DnaSequence;
    use part_repo::{PartRepoReader, PartRepoWriter};

    fn write_initial(dir: &std::path::Path, pass: &str, config: PartConfig, seqs: &[&str]) {
        let writer = PartRepoWriter::create(dir, pass, config, false).unwrap();
        for s in seqs {
            let seq = DnaSequence::parse(s).unwrap();
            writer.write(seq.as_slice(), 1, 0).unwrap();
        }
        writer.flush_thread_local().unwrap();
        writer.finish().unwrap();
    }

    fn read_all_sorted(dir: &std::path::Path, pass: &str, config: PartConfig) -> Vec<String> {
        let reader = PartRepoReader::open(dir, pass, config);
        let mut out = Vec::new();
        for part_id in config.all_partitions() {
            if let Some(entries) = reader.partition(part_id).unwrap() {
                for e in entries.iter() {
                    out.push(e.full_sequence().as_string());
                }
            }
        }
        out.sort();
        out
    }

    #[test]
    fn run_to_closure_reaches_scenario_s3_closed_set() {
        // spec.md 8.2 S3: {"TCG","CG","ACTCG"} expands under pop-front
        // fan-out to the closed set {"ACTCG","CG","CTCG","G","TCG"}.
        let dir = tempfile::tempdir().unwrap();
        let config = PartConfig::new(1).unwrap();
        write_initial(dir.path(), "new.0", config, &["TCG", "CG", "ACTCG"]);

        let (final_pass, _dedup) = run_to_closure(dir.path(), "new.0", config).unwrap();
        let closed = read_all_sorted(dir.path(), &final_pass, config);
        assert_eq!(closed, vec!["ACTCG", "CG", "CTCG", "G", "TCG"]);
    }

    #[test]
    fn run_to_closure_unwinds_every_suffix_of_a_lone_entry() {
        // With nothing else in the set to collide with, pop-front closure
        // keeps emitting one-base-shorter suffixes down to a single base.
        let dir = tempfile::tempdir().unwrap();
        let config = PartConfig::new(1).unwrap();
        write_initial(dir.path(), "new.0", config, &["ACGT"]);

        let (final_pass, _dedup) = run_to_closure(dir.path(), "new.0", config).unwrap();
        let closed = read_all_sorted(dir.path(), &final_pass, config);
        assert_eq!(closed, vec!["ACGT", "CGT", "GT", "T"]);
    }
}

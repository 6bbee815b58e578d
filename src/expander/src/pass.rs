use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dna_core::DnaSequence;
use part_repo::{PartConfig, PartRepoReader, PartRepoWriter};
use seq_repo::EntryReader;

use crate::error::ExpanderError;
use crate::merge::merge_sorted_and_new;
use crate::options::ExpandOptions;

fn read_sorted(reader: Option<EntryReader>) -> Vec<DnaSequence> {
    match reader {
        None => Vec::new(),
        Some(r) => r.iter().map(|entry| entry.full_sequence()).collect(),
    }
}

/// Merge one partition of an already-sorted pass against one partition of
/// a freshly-written, not-yet-sorted pass, writing the merged result into
/// `result_sorted` and (if given) fanning each newly-kept entry's
/// pop-front descendants out into `result_expanded`.
///
/// Returns `(dedup_count, expanded_count)` for this partition alone.
fn process_partition(
    part_id: u32,
    already_sorted: Option<&PartRepoReader>,
    new_entries: &PartRepoReader,
    result_sorted: &PartRepoWriter,
    result_expanded: Option<(&PartRepoWriter, ExpandOptions)>,
) -> Result<(u64, u64), ExpanderError> {
    let old = match already_sorted {
        Some(reader) => read_sorted(reader.partition(part_id)?),
        None => Vec::new(),
    };
    let mut new_sorted = read_sorted(new_entries.partition(part_id)?);
    new_sorted.sort();

    if old.is_empty() && new_sorted.is_empty() {
        return Ok((0, 0));
    }

    let (merged, dedup_count, expanded_count) = merge_sorted_and_new(old, new_sorted, result_expanded)?;

    for entry in &merged {
        result_sorted.write(entry.as_slice(), 1, 0)?;
    }
    result_sorted.flush_thread_local()?;

    Ok((dedup_count, expanded_count))
}

/// Run one sort+dedup(+expand) pass over every partition of a depth,
/// parallelized across partitions via the global thread pool.
///
/// - `already_sorted_pass`: name of a previously-closed sorted pass, or
///   `None` on the very first call.
/// - `new_entries_pass`: name of the pass holding freshly discovered,
///   not-yet-sorted entries to merge in.
/// - `result_sorted_pass`: name of the pass to write the merged, sorted,
///   deduped result into.
/// - `expand`: when `Some`, each newly-kept entry also has its pop-front
///   descendants written into a pass named `result_expanded_pass`.
///
/// Returns `(total_dedup_count, total_expanded_count)`.
#[allow(clippy::too_many_arguments)]
pub fn sort_and_dedup(
    dir: impl AsRef<std::path::Path>,
    already_sorted_pass: Option<&str>,
    new_entries_pass: &str,
    result_sorted_pass: &str,
    result_expanded_pass: Option<&str>,
    expand_opts: ExpandOptions,
    config: PartConfig,
) -> Result<(u64, u64), ExpanderError> {
    let dir = dir.as_ref();
    let already_sorted = already_sorted_pass.map(|p| PartRepoReader::open(dir, p, config));
    let new_entries = PartRepoReader::open(dir, new_entries_pass, config);
    let result_sorted = PartRepoWriter::create(dir, result_sorted_pass, config, false)?;
    let result_expanded = result_expanded_pass
        .map(|p| PartRepoWriter::create(dir, p, config, false))
        .transpose()?;

    let total_dedup = Arc::new(AtomicU64::new(0));
    let total_expanded = Arc::new(AtomicU64::new(0));

    // `parallel_for` spawns onto the global, 'static worker pool, so every
    // partition task needs owned handles rather than borrows of these
    // locals -- wrap them in `Arc` and clone the handle into each closure.
    let already_sorted = Arc::new(already_sorted);
    let new_entries = Arc::new(new_entries);
    let result_sorted = Arc::new(result_sorted);
    let result_expanded = Arc::new(result_expanded);

    let partitions: Vec<u32> = config.all_partitions().collect();
    {
        let already_sorted = Arc::clone(&already_sorted);
        let new_entries = Arc::clone(&new_entries);
        let result_sorted = Arc::clone(&result_sorted);
        let result_expanded = Arc::clone(&result_expanded);
        let total_dedup = Arc::clone(&total_dedup);
        let total_expanded = Arc::clone(&total_expanded);
        let result_sorted_pass = result_sorted_pass.to_string();
        thread_pool::parallel_for(partitions, move |part_id| {
            let label = format!("expand:{result_sorted_pass}:part{part_id}");
            thread_pool::set_state(label.clone(), "sort+dedup");
            let expanded_target = result_expanded.as_ref().as_ref().map(|w| (w, expand_opts));
            let result = process_partition(
                part_id,
                already_sorted.as_ref().as_ref(),
                &new_entries,
                &result_sorted,
                expanded_target,
            )
            .map_err(anyhow::Error::from);
            thread_pool::clear_state(&label);
            let (dedup, expanded) = result?;
            total_dedup.fetch_add(dedup, Ordering::Relaxed);
            total_expanded.fetch_add(expanded, Ordering::Relaxed);
            Ok(())
        })?;
    }

    let result_sorted = Arc::into_inner(result_sorted).expect("all partition tasks joined before this point");
    result_sorted.finish()?;
    if let Some(w) = Arc::into_inner(result_expanded).expect("all partition tasks joined before this point") {
        w.finish()?;
    }

    let total_dedup = total_dedup.load(Ordering::Relaxed);
    let total_expanded = total_expanded.load(Ordering::Relaxed);
    log::debug!(
        "expander: pass '{new_entries_pass}' merged into '{result_sorted_pass}' ({total_dedup} duplicates collapsed, {total_expanded} expansions emitted)"
    );

    Ok((total_dedup, total_expanded))
}

use dna_core::DnaSlice;

use crate::kmer::{canonical_kmer, kmer_windows, partition_and_slot, starts_read};
use crate::options::KmerCounterOptions;
use crate::phase1::{bitmap_get, Phase1Partition};
use crate::phase2::ExactTable;

/// One surviving k-mer's combined phase-2 result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KmerRecord {
    pub kmer: u64,
    pub fwd_count: u32,
    pub rev_count: u32,
    pub fwd_starts_read: bool,
    pub rev_starts_read: bool,
}

/// Run the full two-phase counter over `reads`: phase 1 estimates which
/// k-mers occur often enough to matter with cheap saturating counters,
/// phase 2 re-walks the reads and exactly counts only those survivors.
///
/// Reads are assumed already free of ambiguity bases (see
/// `seq_repo::split_on_ambiguity`, which splits raw reads at `N` runs
/// before they ever reach a `DnaSequence`).
///
/// Simplified relative to spec.md 4.E: phase 2 runs as a single sub-pass
/// across every partition at once rather than RAM-budgeted bands of
/// partitions -- the band size only bounds peak memory at very large input
/// sizes, not the algorithm's correctness.
pub fn count_kmer_slices<'a>(reads: impl IntoIterator<Item = DnaSlice<'a>>, opts: KmerCounterOptions) -> Vec<KmerRecord> {
    let reads: Vec<DnaSlice<'a>> = reads.into_iter().collect();

    let phase1: Vec<Phase1Partition> =
        (0..opts.num_partitions).map(|_| Phase1Partition::new(opts.phase1_slots_per_partition)).collect();

    for read in &reads {
        for (_, window) in kmer_windows(*read, opts.k) {
            let (partition, slot) = partition_and_slot(window.canonical, opts.num_partitions, opts.phase1_slots_per_partition);
            phase1[partition].increment(slot);
        }
    }

    let bitmaps: Vec<Vec<u64>> = phase1.iter().map(|p| p.to_bitmap(opts.min_count)).collect();

    // Single sub-pass: one exact table per partition, sized generously
    // relative to the phase-1 slot count since only survivors land here.
    let exact: Vec<ExactTable> =
        (0..opts.num_partitions).map(|_| ExactTable::new((opts.phase1_slots_per_partition / 4).max(16))).collect();

    for read in &reads {
        let read_len = read.len();
        for (pos, window) in kmer_windows(*read, opts.k) {
            let (partition, slot) = partition_and_slot(window.canonical, opts.num_partitions, opts.phase1_slots_per_partition);
            if !bitmap_get(&bitmaps[partition], slot) {
                continue;
            }
            let starts = starts_read(pos, window.is_fwd, read_len, opts.k);
            let _ = exact[partition].record(window.canonical, window.is_fwd, starts);
        }
    }

    let mut out = Vec::new();
    for table in &exact {
        for (kmer, fwd_count, rev_count, fwd_starts_read, rev_starts_read) in table.iter() {
            out.push(KmerRecord { kmer, fwd_count, rev_count, fwd_starts_read, rev_starts_read });
        }
    }
    log::debug!("kmer-counter: {} reads, {} kmers survived phase 1 filtering into phase 2", reads.len(), out.len());
    out
}

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::rc::Rc;

use dna_core::{dna_bases, Base, DnaSlice};
use ref_map::RefMapReader;
use reference::ReferenceGenome;
use seqset::{EntryRange, SeqsetReader};

use crate::assembly::Assembly;
use crate::error::TracerError;
use crate::options::TracerOptions;
use crate::pairing::{NoPairing, PairIndex};
use crate::path::PathNode;

/// A completed path that found its way back to a reference position,
/// ready to be scored against its competitors (spec.md 4.H).
struct Rejoin {
    node: Rc<PathNode>,
    right_offset: u64,
    total_cost: u64,
}

/// A completed path that ran out of extensions while carrying at least
/// two reads -- an anchor-dropped candidate (spec.md 4.H termination).
struct DeadEnd {
    node: Rc<PathNode>,
    total_cost: u64,
}

struct HeapEntry {
    node: Rc<PathNode>,
    seq_no: u64,
}

impl PartialEq for HeapEntry {
    fn eq(&self, other: &Self) -> bool {
        self.node.cost == other.node.cost && self.seq_no == other.seq_no
    }
}
impl Eq for HeapEntry {}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap; reverse cost (and insertion order as a
        // deterministic tiebreak) so the cheapest, earliest path pops first.
        other.node.cost.cmp(&self.node.cost).then_with(|| other.seq_no.cmp(&self.seq_no))
    }
}
impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A priority-queue graph walk over a seqset, seeded at a single reference
/// anchor, emitting candidate non-reference assemblies (spec.md 4.H).
///
/// Each call to [`Tracer::trace_at`] walks in one direction (leftward: the
/// search extends by prepending bases, narrowing the seqset range via
/// `push_front`, consistent with how `ref-map`'s builder already queries
/// the seqset). Callers that need both directions around a read (as the
/// original tool does in a single pass) call `trace_at` once on the
/// scaffold's forward strand and once on the reverse complement, the same
/// pattern `ref-map::build` uses to cover both orientations.
pub struct Tracer<'a, P: PairIndex = NoPairing> {
    seqset: &'a SeqsetReader,
    ref_map: &'a RefMapReader,
    genome: &'a ReferenceGenome,
    options: TracerOptions,
    pairs: P,
    next_id: u64,
}

impl<'a> Tracer<'a, NoPairing> {
    #[must_use]
    pub fn new(seqset: &'a SeqsetReader, ref_map: &'a RefMapReader, genome: &'a ReferenceGenome, options: TracerOptions) -> Self {
        Tracer { seqset, ref_map, genome, options, pairs: NoPairing, next_id: 0 }
    }
}

impl<'a, P: PairIndex> Tracer<'a, P> {
    #[must_use]
    pub fn with_pair_index(
        seqset: &'a SeqsetReader,
        ref_map: &'a RefMapReader,
        genome: &'a ReferenceGenome,
        options: TracerOptions,
        pairs: P,
    ) -> Self {
        Tracer { seqset, ref_map, genome, options, pairs, next_id: 0 }
    }

    /// Run a best-first search rooted at a read known to start at
    /// `scaffold`:`anchor_offset`, `anchor_len` bases long. Returns every
    /// rejoined or anchor-dropped assembly found, cheapest first.
    pub fn trace_at(&mut self, scaffold: &str, anchor_offset: u64, anchor_len: u32) -> Result<Vec<Assembly>, TracerError> {
        let anchor_window = self.genome.slice(scaffold, anchor_offset, u64::from(anchor_len))?;
        let Some(root_range) = exact_match(self.seqset, anchor_window) else {
            return Ok(Vec::new());
        };

        let root_hit_read = root_range.is_unique();
        let root = Rc::new(PathNode {
            range: root_range,
            prev: None,
            extended_base: None,
            cost: 0,
            bases_walked: 0,
            hit_read: root_hit_read,
            ambiguous_bases: 0,
            pushed_since_pair: 0,
            branch_count_since_pair: 0,
            pairs_used: 0,
            read_ids: if root_hit_read { vec![root_range.begin] } else { Vec::new() },
            ref_run: 0,
            all_ref_so_far: true,
        });

        let mut heap: BinaryHeap<HeapEntry> = BinaryHeap::new();
        let mut seq_no = 0u64;
        heap.push(HeapEntry { node: root, seq_no });

        let mut rejoins: Vec<Rejoin> = Vec::new();
        let mut dead_ends: Vec<DeadEnd> = Vec::new();
        let mut steps = 0u64;

        while let Some(HeapEntry { node, .. }) = heap.pop() {
            steps += 1;
            if steps > self.options.max_steps || node.cost > self.options.max_cost {
                break;
            }
            if let Some(best) = rejoins.iter().map(|r| r.total_cost).min() {
                if node.cost > best {
                    break;
                }
            }
            if rejoins.len() >= self.options.max_rejoins {
                break;
            }

            let valid: Vec<(Base, EntryRange)> =
                dna_bases().filter_map(|b| {
                    let r = self.seqset.push_front(node.range, b);
                    if r.is_empty() {
                        None
                    } else {
                        Some((b, r))
                    }
                }).collect();

            if valid.is_empty() {
                if node.read_ids.len() >= 2 {
                    let total_cost = node.cost.saturating_add(self.options.dead_end_cost).saturating_sub(self.options.anchor_drop_bonus);
                    dead_ends.push(DeadEnd { node, total_cost });
                }
                continue;
            }

            if valid.len() == 1 && node.hit_read {
                let (b, r) = valid[0];
                seq_no += 1;
                let child = self.extend(&node, b, r, scaffold, anchor_offset, false, &mut rejoins);
                heap.push(HeapEntry { node: child, seq_no });
                continue;
            }

            let branched = valid.len() > 1;
            for (b, r) in valid {
                seq_no += 1;
                let child = self.extend(&node, b, r, scaffold, anchor_offset, branched, &mut rejoins);
                heap.push(HeapEntry { node: child, seq_no });
            }
        }

        rejoins.sort_by_key(|r| r.total_cost);
        dead_ends.sort_by_key(|d| d.total_cost);

        let mut out = Vec::new();
        for r in rejoins.into_iter().take(self.options.max_rejoins) {
            out.push(self.finish_rejoin(r, anchor_offset, anchor_len));
        }
        let remaining_slots = self.options.max_rejoins.saturating_sub(out.len());
        for d in dead_ends.into_iter().take(remaining_slots) {
            out.push(self.finish_dead_end(d, anchor_offset, anchor_len));
        }
        Ok(out)
    }

    #[allow(clippy::too_many_arguments)]
    fn extend(
        &self,
        parent: &Rc<PathNode>,
        b: Base,
        range: EntryRange,
        scaffold: &str,
        anchor_offset: u64,
        branched: bool,
        rejoins: &mut Vec<Rejoin>,
    ) -> Rc<PathNode> {
        let bases_walked = parent.bases_walked + 1;
        let ideal_offset = anchor_offset.checked_sub(u64::from(bases_walked));

        let ref_base = ideal_offset.and_then(|off| self.genome.slice(scaffold, off, 1).ok()).map(|s| s.get(0));
        let matches_ref_here = ref_base == Some(b);

        let mut cost = parent.cost + self.options.base_cost;
        if branched {
            cost += self.options.ambiguous_branch_cost / self.options.ambiguous_cost_divisor.max(1);
        }
        if range.len() > 1 {
            cost += self.options.decrease_overlap_cost;
        }
        if matches_ref_here {
            cost += self.options.traverse_ref_cost;
        }

        let mut hit_read = parent.hit_read;
        let mut read_ids = parent.read_ids.clone();
        let is_unique_read = range.is_unique() && self.seqset.size(range.begin) as u32 == self.seqset.meta().max_read_len;
        if is_unique_read {
            hit_read = true;
            read_ids.push(range.begin);
        }

        let ref_run = if matches_ref_here { parent.ref_run + 1 } else { 0 };
        let all_ref_so_far = parent.all_ref_so_far && matches_ref_here;

        let mut ambiguous_bases = if branched { parent.ambiguous_bases + 1 } else { parent.ambiguous_bases };
        let mut pushed_since_pair = parent.pushed_since_pair + 1;
        let mut branch_count_since_pair = parent.branch_count_since_pair + u32::from(branched);
        let mut pairs_used = parent.pairs_used;

        let paired = ideal_offset.is_some_and(|off| {
            read_ids.last().is_some_and(|&id| self.pairs.mate_seen_near(id, off as i64, self.options.max_pair_distance))
        });
        if paired {
            pairs_used += 1;
            if self.options.reset_pair_counters_every_pair || parent.pairs_used == 0 {
                pushed_since_pair = 0;
                ambiguous_bases = 0;
                branch_count_since_pair = 0;
            }
        }

        let child = Rc::new(PathNode {
            range,
            prev: Some(Rc::clone(parent)),
            extended_base: Some(b),
            cost,
            bases_walked,
            hit_read,
            ambiguous_bases,
            pushed_since_pair,
            branch_count_since_pair,
            pairs_used,
            read_ids,
            ref_run,
            all_ref_so_far,
        });

        if is_unique_read {
            let ref_confirmed = self.ref_map.is_unique(range.begin) && self.ref_map.entry(range.begin).forward();
            if let Some(right_offset) = ideal_offset {
                if matches_ref_here && (ref_confirmed || child.ref_run >= self.options.min_rejoin_overlap) {
                    let rejoin_cost = self.options.rejoin_local_cost.saturating_sub(if ref_confirmed { self.options.traverse_ref_cost } else { 0 });
                    rejoins.push(Rejoin { node: Rc::clone(&child), right_offset, total_cost: child.cost.saturating_add(rejoin_cost) });
                }
            }
        }

        child
    }

    fn finish_rejoin(&mut self, r: Rejoin, anchor_offset: u64, anchor_len: u32) -> Assembly {
        let id = self.next_id;
        self.next_id += 1;
        let seq = r.node.to_sequence();
        let matches_reference = r.node.bases_walked > 0 && r.node.all_ref_so_far;
        Assembly {
            id,
            seq,
            left_offset: anchor_offset.checked_sub(u64::from(r.node.bases_walked)),
            right_offset: Some(r.right_offset + 1),
            matches_reference,
            left_anchor_len: anchor_len,
            right_anchor_len: self.options.min_rejoin_overlap,
            read_ids: r.node.read_ids.clone(),
            aligned_variants: Vec::new(),
        }
    }

    fn finish_dead_end(&mut self, d: DeadEnd, anchor_offset: u64, anchor_len: u32) -> Assembly {
        let id = self.next_id;
        self.next_id += 1;
        let seq = d.node.to_sequence();
        Assembly {
            id,
            seq,
            left_offset: anchor_offset.checked_sub(u64::from(d.node.bases_walked)),
            right_offset: None,
            matches_reference: false,
            left_anchor_len: anchor_len,
            right_anchor_len: 0,
            read_ids: d.node.read_ids.clone(),
            aligned_variants: Vec::new(),
        }
    }
}

/// Backward-search `window` through the seqset to the single entry it
/// denotes exactly, if any (the same technique `ref-map::build` uses).
fn exact_match(seqset: &SeqsetReader, window: DnaSlice<'_>) -> Option<EntryRange> {
    let mut range = seqset.full_range();
    for i in (0..window.len()).rev() {
        if range.is_empty() {
            return None;
        }
        range = seqset.push_front(range, window.get(i));
    }
    if range.is_empty() {
        None
    } else {
        Some(range)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dna_core::DnaSequence as Seq;
    use part_repo::{PartConfig, PartRepoReader, PartRepoWriter};
    use std::io::Write;

    fn build_everything(dir: &std::path::Path, reads: &[&str], fasta: &str, max_window: u32) -> (SeqsetReader, RefMapReader, ReferenceGenome) {
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
        ref_map::build(&ref_map_dir, &seqset_reader, &genome, max_window).unwrap();
        let ref_map_reader = RefMapReader::open(&ref_map_dir).unwrap();

        (seqset_reader, ref_map_reader, genome)
    }

    #[test]
    fn trivial_reference_only_read_emits_no_non_reference_assemblies() {
        let dir = tempfile::tempdir().unwrap();
        let (seqset, ref_map, genome) = build_everything(dir.path(), &["AAATT"], ">chr1\nAAATTTGGGCCC\n", 5);

        let mut tracer = Tracer::new(&seqset, &ref_map, &genome, TracerOptions::default());
        let assemblies = tracer.trace_at("chr1", 0, 5).unwrap();
        assert!(
            assemblies.iter().all(|a| a.matches_reference),
            "expected only reference-matching (or no) assemblies from a single perfectly-matching read, got {assemblies:?}"
        );
    }

    #[test]
    fn anchor_not_present_in_seqset_returns_no_assemblies() {
        let dir = tempfile::tempdir().unwrap();
        let (seqset, ref_map, genome) = build_everything(dir.path(), &["AAATT"], ">chr1\nAAATTTGGGCCC\n", 5);

        let mut tracer = Tracer::new(&seqset, &ref_map, &genome, TracerOptions::default());
        // "TTGGG" starting at offset 3 was never written as its own read.
        let assemblies = tracer.trace_at("chr1", 3, 5).unwrap();
        assert!(assemblies.is_empty());
    }
}

use std::rc::Rc;

use dna_core::{Base, DnaSequence};
use seqset::EntryRange;

/// One node in the best-first search tree (spec.md 4.H): a seqset range
/// plus everything needed to extend it further, or to close it out as a
/// rejoin or dead end. Nodes form a tree via `prev` so that paths sharing
/// a prefix share storage instead of being copied at every branch.
#[derive(Debug)]
pub struct PathNode {
    pub range: EntryRange,
    pub prev: Option<Rc<PathNode>>,
    /// The base this node extended its parent by; `None` only for the
    /// search root (the read's own range, before any extension).
    pub extended_base: Option<Base>,
    pub cost: u64,
    pub bases_walked: u32,
    /// Whether this path has passed through at least one unique,
    /// read-length seqset entry (spec.md 4.H step 2's "already hit a
    /// read" condition).
    pub hit_read: bool,
    pub ambiguous_bases: u32,
    pub pushed_since_pair: u32,
    pub branch_count_since_pair: u32,
    pub pairs_used: u32,
    /// Seqset entry ids of every read this path has passed through, in
    /// walk order. `read_ids.len() >= 2` is the dead-end-worth-emitting
    /// threshold (spec.md 4.H termination).
    pub read_ids: Vec<u64>,
    /// How many of the most recent extensions landed on the base the
    /// reference had at that position, counting back from this node.
    /// Reset to 0 by any extension that disagreed with reference.
    pub ref_run: u32,
    /// Whether every extension since the root has matched reference --
    /// `true` for a path that hasn't diverged at all yet.
    pub all_ref_so_far: bool,
}

impl PathNode {
    #[must_use]
    pub fn root(range: EntryRange) -> Rc<PathNode> {
        Rc::new(PathNode {
            range,
            prev: None,
            extended_base: None,
            cost: 0,
            bases_walked: 0,
            hit_read: false,
            ambiguous_bases: 0,
            pushed_since_pair: 0,
            branch_count_since_pair: 0,
            pairs_used: 0,
            read_ids: Vec::new(),
            ref_run: 0,
            all_ref_so_far: true,
        })
    }

    /// Reconstruct the bases walked so far, in assembly order. Every
    /// extension prepends its base to the front of the running sequence
    /// (mirroring `seqset::push_front`'s own convention), so walking the
    /// `prev` chain from this node back to the root yields the bases
    /// already in left-to-right order -- no reversal needed.
    #[must_use]
    pub fn to_sequence(&self) -> DnaSequence {
        let mut bases = Vec::with_capacity(self.bases_walked as usize);
        let mut cur = self;
        while let Some(b) = cur.extended_base {
            bases.push(b);
            match &cur.prev {
                Some(p) => cur = p,
                None => break,
            }
        }
        let mut seq = DnaSequence::new();
        for b in bases {
            seq.push_back(b);
        }
        seq
    }
}

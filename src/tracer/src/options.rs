/// Cost weights and search bounds for [`crate::Tracer`] (spec.md 4.H).
///
/// Every field is a tunable; there is no compiled-in default behavior that
/// can't be reached by constructing this directly. [`TracerOptions::default`]
/// reproduces the original tool's out-of-the-box weights.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TracerOptions {
    /// Cost charged for every base a path extends by, regardless of branching.
    pub base_cost: u64,
    /// Cost charged when more than one base extends a path's range (a branch
    /// point), divided by `ambiguous_cost_divisor` before being added.
    pub ambiguous_branch_cost: u64,
    /// Divisor applied to `ambiguous_branch_cost` -- kept as an explicit
    /// knob (spec.md 9's first open question) rather than folded into
    /// `ambiguous_branch_cost` itself, so rejoin- and dead-end-side
    /// accounting can calibrate it independently.
    pub ambiguous_cost_divisor: u64,
    /// Cost added when a branch narrows the seqset range to more than one
    /// remaining entry (an "overlap decrease").
    pub decrease_overlap_cost: u64,
    /// Cost added when a step continues along a position already known to
    /// match the reference -- deliberately cheap but non-zero, so pure
    /// reference traversal never wins for free against a real rejoin.
    pub traverse_ref_cost: u64,
    /// Base cost of closing a path out as a rejoin candidate.
    pub rejoin_local_cost: u64,
    /// Cost charged once per pair match consumed along a path.
    pub pair_used_cost: u64,
    /// Cost charged when a path is recorded as a dead end (no further
    /// extension, but carrying at least two reads).
    pub dead_end_cost: u64,
    /// Subtracted from a dead-end path's effective cost to make
    /// anchor-dropped assemblies competitive with rejoined ones.
    pub anchor_drop_bonus: u64,
    /// Cost per base of deviation between a rejoin's actual position and
    /// the ideal position (`start_offset + bases_walked`).
    pub size_change_cost_per_base: u64,
    /// Hard ceiling on any single path's accumulated cost.
    pub max_cost: u64,
    /// Stop emitting further rejoins past this many per search.
    pub max_rejoins: usize,
    /// Stop the whole search after this many pops from the priority queue.
    pub max_steps: u64,
    /// Minimum number of matching bases a rejoin must hold before it's
    /// trusted as having returned to reference.
    pub min_rejoin_overlap: u32,
    /// Maximum distance (in reference bases) a mate may be observed at to
    /// count as "paired" for reset purposes.
    pub max_pair_distance: u32,
    /// Abort a path once its unpaired base count exceeds this.
    pub max_unpaired_bases: u32,
    /// Abort a path once its since-pair branch count exceeds this.
    pub max_branch_without_pair: u32,
    /// When `true`, every pair observed resets the since-pair counters.
    /// When `false` (the default), only the first pair observed on a path
    /// resets them -- spec.md 9's second open question.
    pub reset_pair_counters_every_pair: bool,
}

impl Default for TracerOptions {
    fn default() -> Self {
        TracerOptions {
            base_cost: 1,
            ambiguous_branch_cost: 9,
            ambiguous_cost_divisor: 1,
            decrease_overlap_cost: 3,
            traverse_ref_cost: 1,
            rejoin_local_cost: 20,
            pair_used_cost: 5,
            dead_end_cost: 15,
            anchor_drop_bonus: 10,
            size_change_cost_per_base: 4,
            max_cost: 10_000,
            max_rejoins: 8,
            max_steps: 50_000,
            min_rejoin_overlap: 8,
            max_pair_distance: 1000,
            max_unpaired_bases: 2000,
            max_branch_without_pair: 32,
            reset_pair_counters_every_pair: false,
        }
    }
}

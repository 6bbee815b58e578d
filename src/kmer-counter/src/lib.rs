//! Two-phase probabilistic-then-exact k-mer counter (spec.md 4.E): phase 1
//! uses cheap 2-bit saturating counters to estimate which canonical k-mers
//! occur often enough to matter, phase 2 re-walks the input and exactly
//! counts only those survivors into an open-addressing hash table with an
//! overflow side-table for counts past 255.

mod counter;
mod error;
mod kmer;
mod options;
mod phase1;
mod phase2;

pub use counter::{count_kmer_slices, KmerRecord};
pub use error::KmerCounterError;
pub use kmer::{canonical_kmer, kmer_windows, KmerWindow};
pub use options::{KmerCounterOptions, MAX_K};
pub use phase1::Phase1Partition;
pub use phase2::ExactTable;

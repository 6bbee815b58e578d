//! 2-bit-packed DNA primitives: bases, packed comparison, cursors, slices
//! and owned sequences. Every other crate in the workspace that touches raw
//! DNA builds on top of this one instead of re-deriving the packing scheme.

pub mod base;
pub mod compare;
pub mod cursor;
pub mod entropy;
pub mod error;
pub mod sequence;
pub mod slice;

pub use base::{dna_bases, Base, DnaBaseArray};
pub use compare::{byte_rev_comp_bases, long_rev_comp_bases, reverse_2bit_pairs_u8, CompareResult};
pub use cursor::DnaCursor;
pub use entropy::{length_needed, shannon_entropy};
pub use error::DnaError;
pub use sequence::DnaSequence;
pub use slice::{DnaSlice, SliceIter};

//! Owned, borrowed and memory-mapped byte buffers, plus a lightweight
//! tracked-allocation facility for the large buffers the rest of the
//! workspace deals in (seqset/ref-map/seq-repo files, kmer-counter
//! partitions).

mod buf;
mod error;
pub mod tracker;

pub use buf::{cachelist, MemBuf};
pub use error::MemBufError;
pub use tracker::TrackedAlloc;

//! Variant tracer (spec.md 3.6/4.H): a best-first priority-queue walk over
//! a seqset, seeded at reference positions that are themselves read
//! starts, emitting candidate non-reference assemblies for the aligner to
//! re-express against reference.

mod assembly;
mod error;
mod options;
mod pairing;
mod path;
mod search;

pub use assembly::{AlignedVariant, Assembly};
pub use error::TracerError;
pub use options::TracerOptions;
pub use pairing::{NoPairing, PairIndex};
pub use path::PathNode;
pub use search::Tracer;

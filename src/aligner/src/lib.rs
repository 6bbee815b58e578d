//! Aligner and align-splitter (spec.md 3.6/4.I): re-express a tracer-emitted
//! assembly as a sequence of aligned sub-variants against reference, then
//! split the assembly on those boundaries into the final per-region output
//! of the variant-discovery pipeline.

mod align;
mod error;
mod options;
mod splitter;

pub use align::{align_assembly, AlignOutcome};
pub use error::AlignerError;
pub use options::AlignerOptions;
pub use splitter::{split_assembly, split_into_regions};

//! Reference genome loading, scaffold/coordinate bookkeeping, and
//! `--scaffold` CLI spec parsing shared by `ref-map`, `tracer` and
//! `aligner`.

mod error;
mod fasta;
mod genome;
mod scaffold;
mod spec;

pub use error::ReferenceError;
pub use genome::ReferenceGenome;
pub use scaffold::Scaffold;
pub use spec::{parse_scaffold_spec, ScaffoldSpec};

//! The sequence repository (spec.md §3.3/§4.B): an append-only packed-base
//! blob plus fixed-size entry records that reference it. Everything above
//! this crate (`part-repo`, `expander`, `seqset`) works in terms of
//! [`EntryRecord`]/[`EntryView`] rather than raw bytes.

mod blob;
mod entry;
mod error;
mod ingest;
mod reader;
mod record;
mod writer;

pub use blob::{BlobReader, BlobWriter};
pub use entry::{build_record, EntryView};
pub use error::SeqRepoError;
pub use ingest::split_on_ambiguity;
pub use reader::EntryReader;
pub use record::{EntryRecord, INLINE_PREFIX_BASES};
pub use writer::EntryWriter;

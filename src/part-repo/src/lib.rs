//! Partitioned entry store (spec.md §4.C): groups seqset-construction
//! entries into `4^depth` buckets by their leading bases, with batched
//! per-thread writers and pushed-neighbor iteration for prefix-push
//! navigation.

mod config;
mod error;
mod layout;
mod part_counts;
mod reader;
mod store;

pub use config::{all_bases, PartConfig, MAX_DEPTH, MIN_DEPTH};
pub use error::PartRepoError;
pub use layout::{blob_path, partition_path};
pub use part_counts::PartCounts;
pub use reader::{PartRepoReader, PartitionRef};
pub use store::PartRepoWriter;

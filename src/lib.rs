//! Shared glue for the three driver binaries (spec.md §6.4): CLI option
//! plumbing that's common across `build-seqset`, `kmerize` and
//! `discover-variants`, plus the FASTA-based read-ingestion helper they all
//! use. Everything domain-specific lives in the workspace's per-concern
//! crates; this crate only wires them together behind a CLI.

pub mod common;
pub mod ingest;

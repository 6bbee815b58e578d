use thiserror::Error;

use dna_core::DnaError;
use membuf::MemBufError;

#[derive(Debug, Error)]
pub enum SeqRepoError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to map {path}: {source}")]
    Membuf {
        path: String,
        #[source]
        source: MemBufError,
    },

    #[error(transparent)]
    Dna(#[from] DnaError),

    #[error("entry-data corruption: inline bytes agree but blob-resident tails disagree for offset {offset}")]
    Corruption { offset: u64 },
}

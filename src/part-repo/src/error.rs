use thiserror::Error;

#[derive(Debug, Error)]
pub enum PartRepoError {
    #[error("partition depth {depth} out of range (expected 1..=7)")]
    InvalidDepth { depth: u32 },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    SeqRepo(#[from] seq_repo::SeqRepoError),
}

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReferenceError {
    #[error("failed to read reference FASTA {path}: {source}")]
    Io { path: String, #[source] source: std::io::Error },

    #[error("FASTA record contains an invalid base '{c}' at scaffold {scaffold} position {pos}")]
    InvalidBase { scaffold: String, pos: usize, c: char },

    #[error("unknown scaffold '{0}'")]
    UnknownScaffold(String),

    #[error("invalid scaffold spec '{0}' (expected NAME or NAME:START-END)")]
    InvalidScaffoldSpec(String),

    #[error("coordinate {offset} out of range for scaffold '{scaffold}' (length {len})")]
    OutOfRange { scaffold: String, offset: u64, len: u64 },

    #[error("global offset {0} does not fall within any scaffold")]
    GlobalOffsetOutOfRange(u64),
}

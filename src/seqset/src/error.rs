use thiserror::Error;

#[derive(Debug, Error)]
pub enum SeqsetError {
    #[error(transparent)]
    PartRepo(#[from] part_repo::PartRepoError),

    #[error(transparent)]
    SeqRepo(#[from] seq_repo::SeqRepoError),

    #[error(transparent)]
    VarBit(#[from] varbit::VarBitError),

    #[error(transparent)]
    Membuf(#[from] membuf::MemBufError),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed seqset metadata at {path}: {source}")]
    Meta {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("seqset entry count {count} exceeds the addressable range")]
    EntryCountOverflow { count: u64 },

    #[error("seqset directory {path} is missing the {section} section")]
    MissingSection { path: String, section: &'static str },
}

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RefMapError {
    #[error(transparent)]
    Seqset(#[from] seqset::SeqsetError),

    #[error(transparent)]
    Reference(#[from] reference::ReferenceError),

    #[error(transparent)]
    Membuf(#[from] membuf::MemBufError),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed ref-map metadata at {path}: {source}")]
    Meta {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("ref-map entry count {ref_map} does not match seqset entry count {seqset}")]
    EntryCountMismatch { ref_map: u64, seqset: u64 },
}

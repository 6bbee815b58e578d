use thiserror::Error;

#[derive(Debug, Error)]
pub enum AlignerError {
    #[error(transparent)]
    Reference(#[from] reference::ReferenceError),

    #[error(transparent)]
    Dna(#[from] dna_core::DnaError),

    #[error("assembly on scaffold {scaffold} has right_offset {right} before left_offset {left}")]
    InvertedSpan { scaffold: String, left: u64, right: u64 },
}

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DnaError {
    #[error("invalid DNA base character '{c}' (expected one of A,C,G,T)")]
    InvalidBaseChar { c: char },

    #[error("invalid DNA base value {value} (expected 0..=3)")]
    InvalidBaseValue { value: u8 },

    #[error("subsequence out of bounds: offset {offset} + len {len} > size {size}")]
    OutOfBounds {
        offset: usize,
        len: usize,
        size: usize,
    },

    #[error("invalid DNA sequence encountered invalid character '{c}' at position {pos}")]
    InvalidSequenceChar { c: char, pos: usize },
}

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MemBufError {
    #[error("subbuf out of bounds: offset {offset} + len {len} > size {size}")]
    OutOfBounds { offset: usize, len: usize, size: usize },

    #[error("failed to map file {path}: {source}")]
    Mmap { path: String, #[source] source: std::io::Error },
}

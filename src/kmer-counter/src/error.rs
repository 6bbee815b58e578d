use thiserror::Error;

#[derive(Debug, Error)]
pub enum KmerCounterError {
    #[error("k-mer size {k} is too large to fit in a 64-bit word (max {max})")]
    KSizeTooLarge { k: usize, max: usize },
    #[error("k-mer size must be at least 1, got 0")]
    KSizeZero,
}

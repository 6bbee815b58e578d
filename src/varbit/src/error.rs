use thiserror::Error;

#[derive(Debug, Error)]
pub enum VarBitError {
    #[error("value {value} does not fit in a {bits}-bit field (max {max})")]
    ValueTooWide { value: u64, bits: u32, max: u64 },
}

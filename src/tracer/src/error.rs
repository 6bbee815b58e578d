use thiserror::Error;

#[derive(Debug, Error)]
pub enum TracerError {
    #[error(transparent)]
    Reference(#[from] reference::ReferenceError),

    #[error("anchor offset {offset} + anchor length {anchor_len} runs past the end of scaffold {scaffold} (len {scaffold_len})")]
    AnchorOutOfRange { scaffold: String, offset: u64, anchor_len: u32, scaffold_len: u64 },
}

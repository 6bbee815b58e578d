use std::path::{Path, PathBuf};

pub fn meta_path(dir: impl AsRef<Path>) -> PathBuf {
    dir.as_ref().join("ref_map.json")
}

pub fn counts_path(dir: impl AsRef<Path>) -> PathBuf {
    dir.as_ref().join("ref_map.bin")
}

pub fn overflow_path(dir: impl AsRef<Path>) -> PathBuf {
    dir.as_ref().join("ref_map_overflow.json")
}

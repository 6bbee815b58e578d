use std::path::{Path, PathBuf};

use dna_core::Base;

/// `seqset.json`, `shared`, `sizes`, `prev_A/C/G/T` and `uuid` (spec.md
/// 6.1) are named files inside one directory -- the "spiral file
/// container" the rest of the workspace's readers/writers already treat
/// as a plain directory of sections (see `part-repo::layout`).
///
/// One section beyond spec.md 6.1's literal list is carried here too:
/// `bases`, the packed 2-bit stream of each entry's own new trailing
/// bases in colex order. 6.1 doesn't name it, but 4.F's reconstruction
/// invariant ("reconstructing each entry's sequence from (shared, sizes,
/// base stream)") requires it to exist somewhere; see DESIGN.md.
pub fn meta_path(dir: impl AsRef<Path>) -> PathBuf {
    dir.as_ref().join("seqset.json")
}

pub fn shared_path(dir: impl AsRef<Path>) -> PathBuf {
    dir.as_ref().join("shared")
}

pub fn sizes_path(dir: impl AsRef<Path>) -> PathBuf {
    dir.as_ref().join("sizes")
}

pub fn bases_path(dir: impl AsRef<Path>) -> PathBuf {
    dir.as_ref().join("bases")
}

pub fn uuid_path(dir: impl AsRef<Path>) -> PathBuf {
    dir.as_ref().join("uuid")
}

pub fn prev_path(dir: impl AsRef<Path>, base: Base) -> PathBuf {
    dir.as_ref().join(format!("prev_{}", base.to_char()))
}

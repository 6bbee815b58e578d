use std::path::{Path, PathBuf};

use crate::config::PartConfig;

/// Width (in hex digits) used for partition-id filenames, so directory
/// listings sort the same way partition ids do.
fn id_width(cfg: PartConfig) -> usize {
    let max_id = cfg.partition_count().saturating_sub(1);
    format!("{max_id:x}").len()
}

#[must_use]
pub fn blob_path(dir: &Path, pass_name: &str) -> PathBuf {
    dir.join(format!("{pass_name}.blob"))
}

#[must_use]
pub fn partition_path(dir: &Path, pass_name: &str, cfg: PartConfig, part_id: u32) -> PathBuf {
    let width = id_width(cfg);
    dir.join(format!("{pass_name}.part{part_id:0width$x}.entries", width = width))
}

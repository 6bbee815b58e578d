use std::path::{Path, PathBuf};

use dna_core::{dna_bases, Base, DnaBaseArray};
use seq_repo::EntryReader;

use crate::config::PartConfig;
use crate::error::PartRepoError;
use crate::layout::{blob_path, partition_path};

/// Everything [`crate::expander`] (and the seqset builder) needs for one
/// partition of one pass: its own sorted entries, plus -- when requested --
/// the four neighbor partitions whose entries, once popped-front, fall
/// into this partition. Mirrors `part_repo::partition_ref`.
pub struct PartitionRef {
    pub part_id: u32,
    pub main: EntryReader,
    pub pushed: Option<DnaBaseArray<Option<EntryReader>>>,
}

/// Read-only access to every partition of one completed pass.
pub struct PartRepoReader {
    dir: PathBuf,
    pass_name: String,
    config: PartConfig,
}

impl PartRepoReader {
    #[must_use]
    pub fn open(dir: impl AsRef<Path>, pass_name: impl Into<String>, config: PartConfig) -> Self {
        PartRepoReader { dir: dir.as_ref().to_path_buf(), pass_name: pass_name.into(), config }
    }

    #[must_use]
    pub fn config(&self) -> PartConfig {
        self.config
    }

    /// Open just one partition's entries, without touching its siblings.
    /// `None` when that partition file was never written (empty partition).
    pub fn partition(&self, part_id: u32) -> Result<Option<EntryReader>, PartRepoError> {
        self.open_partition_entries(part_id)
    }

    fn open_partition_entries(&self, part_id: u32) -> Result<Option<EntryReader>, PartRepoError> {
        let path = partition_path(&self.dir, &self.pass_name, self.config, part_id);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(EntryReader::open(&path, Some(blob_path(&self.dir, &self.pass_name)))?))
    }

    /// Open every partition's reader, and (if `include_pushed`) the four
    /// neighbor partitions `{A,C,G,T} + prefix` whose entries pop-front
    /// into it.
    pub fn partitions(&self, include_pushed: bool) -> Result<Vec<PartitionRef>, PartRepoError> {
        let mut out = Vec::with_capacity(self.config.partition_count());
        for part_id in self.config.all_partitions() {
            let Some(main) = self.open_partition_entries(part_id)? else { continue };
            let pushed = if include_pushed {
                let mut arr: [Option<EntryReader>; 4] = [None, None, None, None];
                for b in dna_bases() {
                    let neighbor_id = self.config.prepend(part_id, b);
                    arr[b.value() as usize] = self.open_partition_entries(neighbor_id)?;
                }
                let [a, c, g, t] = arr;
                Some(DnaBaseArray::new([a, c, g, t]))
            } else {
                None
            };
            out.push(PartitionRef { part_id, main, pushed });
        }
        Ok(out)
    }
}

// Allow indexing a `DnaBaseArray<Option<EntryReader>>` in helper loops
// elsewhere without re-deriving the mapping from `Base` to array slot.
impl std::ops::Index<Base> for PartitionRef {
    type Output = Option<EntryReader>;
    fn index(&self, b: Base) -> &Option<EntryReader> {
        self.pushed.as_ref().expect("pushed neighbors were not requested").index(b)
    }
}

use std::path::{Path, PathBuf};

use dna_core::DnaSlice;
use parking_lot::Mutex;
use seq_repo::{build_record, BlobWriter, EntryWriter};

use crate::config::PartConfig;
use crate::error::PartRepoError;
use crate::layout::{blob_path, partition_path};
use crate::part_counts::PartCounts;

/// Sub-partitioning depth used by [`PartCounts`] histograms, three bases
/// deeper than the partition depth itself (spec.md 4.D step 1).
const PART_COUNTS_EXTRA_DEPTH: u32 = 3;

/// A single write pass: one shared sequence blob plus one batched
/// [`EntryWriter`] per partition. Mirrors `part_repo::open_write_pass` +
/// `part_repo::write`.
pub struct PartRepoWriter {
    dir: PathBuf,
    pass_name: String,
    config: PartConfig,
    blob: Mutex<BlobWriter>,
    writers: Vec<EntryWriter>,
    part_counts: Option<PartCounts>,
}

impl PartRepoWriter {
    pub fn create(dir: impl AsRef<Path>, pass_name: impl Into<String>, config: PartConfig, track_counts: bool) -> Result<Self, PartRepoError> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir).map_err(|source| PartRepoError::Io { path: dir.display().to_string(), source })?;
        let pass_name = pass_name.into();

        let blob = BlobWriter::create(blob_path(&dir, &pass_name))?;
        let writers = config
            .all_partitions()
            .map(|part_id| EntryWriter::create(partition_path(&dir, &pass_name, config, part_id)))
            .collect::<Result<Vec<_>, _>>()?;
        let part_counts = track_counts.then(|| PartCounts::new(config.depth() + PART_COUNTS_EXTRA_DEPTH));

        Ok(PartRepoWriter { dir, pass_name, config, blob: Mutex::new(blob), writers, part_counts })
    }

    #[must_use]
    pub fn config(&self) -> PartConfig {
        self.config
    }

    /// Write `seq` (a read, already oriented forward), enumerating
    /// `fwd_suffixes` forward suffixes and `rc_suffixes` reverse-complement
    /// suffixes, each becoming one entry in its own partition. Suffixes
    /// share the blob range of the sequence they were enumerated from,
    /// decrementing/incrementing the shared offset per spec.md 4.C.
    pub fn write(&self, seq: DnaSlice<'_>, fwd_suffixes: usize, rc_suffixes: usize) -> Result<(), PartRepoError> {
        if fwd_suffixes > 0 {
            self.write_orientation(seq, fwd_suffixes)?;
        }
        if rc_suffixes > 0 {
            self.write_orientation(seq.rev_comp(), rc_suffixes)?;
        }
        Ok(())
    }

    fn write_orientation(&self, seq: DnaSlice<'_>, suffix_count: usize) -> Result<(), PartRepoError> {
        let suffix_count = suffix_count.min(seq.len());
        for start in 0..suffix_count {
            let suffix = seq.subseq(start, seq.len() - start).expect("start < len");
            self.write_single(suffix)?;
        }
        Ok(())
    }

    fn write_single(&self, suffix: DnaSlice<'_>) -> Result<(), PartRepoError> {
        let part_id = self.config.partition_of(suffix);
        let record = {
            let mut blob = self.blob.lock();
            build_record(suffix, &mut blob)
        };
        if let Some(counts) = &self.part_counts {
            counts.add(suffix);
        }
        self.writers[part_id as usize].write_entry(record)?;
        Ok(())
    }

    /// Flush the calling thread's pending batches across every partition.
    /// Call this on every writer thread before [`PartRepoWriter::finish`].
    pub fn flush_thread_local(&self) -> Result<(), PartRepoError> {
        for w in &self.writers {
            w.flush_thread_local()?;
        }
        Ok(())
    }

    pub fn take_part_counts(&mut self) -> Option<PartCounts> {
        self.part_counts.take()
    }

    pub fn finish(self) -> Result<(), PartRepoError> {
        for w in self.writers {
            w.finish()?;
        }
        self.blob.into_inner().finish()?;
        log::debug!("part-repo: pass '{}' finished ({} partitions) in {}", self.pass_name, self.config.partition_count(), self.dir.display());
        Ok(())
    }
}

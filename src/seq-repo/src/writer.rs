use std::cell::RefCell;
use std::collections::HashMap;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

use crate::error::SeqRepoError;
use crate::record::EntryRecord;

/// Records buffered per-thread before a writer's lock is acquired to flush
/// them in bulk, matching spec.md 4.B's "per-thread local buffer of 4096
/// records; flush in bulk under a single lock acquisition".
const BATCH_SIZE: usize = 4096;

static NEXT_WRITER_ID: AtomicU64 = AtomicU64::new(1);

thread_local! {
    static LOCAL_BUFFERS: RefCell<HashMap<u64, Vec<EntryRecord>>> = RefCell::new(HashMap::new());
}

/// Append-only writer for the fixed 14-byte entry records (§6.2). Each
/// writer instance gets its own id so that per-thread buffers for distinct
/// writers (e.g. one per `part-repo` partition) never collide within the
/// same `thread_local!` map.
pub struct EntryWriter {
    id: u64,
    file: Mutex<BufWriter<std::fs::File>>,
    path: String,
}

impl EntryWriter {
    pub fn create(path: impl AsRef<Path>) -> Result<Self, SeqRepoError> {
        let path_ref = path.as_ref();
        let file = std::fs::File::create(path_ref)
            .map_err(|source| SeqRepoError::Io { path: path_ref.display().to_string(), source })?;
        Ok(EntryWriter {
            id: NEXT_WRITER_ID.fetch_add(1, Ordering::Relaxed),
            file: Mutex::new(BufWriter::new(file)),
            path: path_ref.display().to_string(),
        })
    }

    /// Buffer one record for the calling thread; flushes the whole
    /// thread-local batch under one lock acquisition once it reaches
    /// [`BATCH_SIZE`].
    pub fn write_entry(&self, record: EntryRecord) -> Result<(), SeqRepoError> {
        let full = LOCAL_BUFFERS.with(|m| {
            let mut m = m.borrow_mut();
            let buf = m.entry(self.id).or_default();
            buf.push(record);
            buf.len() >= BATCH_SIZE
        });
        if full {
            self.flush_thread_local()?;
        }
        Ok(())
    }

    /// Flush the calling thread's pending batch, if any. Callers that write
    /// from multiple threads must call this (or [`EntryWriter::finish`],
    /// which only flushes its own thread) on every writer thread before the
    /// file is considered complete.
    pub fn flush_thread_local(&self) -> Result<(), SeqRepoError> {
        let batch = LOCAL_BUFFERS.with(|m| m.borrow_mut().get_mut(&self.id).map(std::mem::take));
        let Some(batch) = batch else { return Ok(()) };
        if batch.is_empty() {
            return Ok(());
        }
        let mut file = self.file.lock();
        for record in &batch {
            file.write_all(&record.to_bytes())
                .map_err(|source| SeqRepoError::Io { path: self.path.clone(), source })?;
        }
        Ok(())
    }

    pub fn finish(self) -> Result<(), SeqRepoError> {
        self.flush_thread_local()?;
        LOCAL_BUFFERS.with(|m| {
            m.borrow_mut().remove(&self.id);
        });
        let mut file = self.file.into_inner();
        file.flush().map_err(|source| SeqRepoError::Io { path: self.path.clone(), source })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::EntryReader;

    #[test]
    fn write_entry_batches_and_flushes_on_finish() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("entries.bin");
        let writer = EntryWriter::create(&path).unwrap();
        for i in 0..10u16 {
            writer.write_entry(EntryRecord::new(i, [0; 7], 0, false)).unwrap();
        }
        writer.finish().unwrap();

        let reader = EntryReader::open(&path, None).unwrap();
        assert_eq!(reader.len(), 10);
        for (i, view) in reader.iter().enumerate() {
            assert_eq!(view.record().size_in_bases, i as u16);
        }
    }

    #[test]
    fn explicit_flush_makes_partial_batch_visible() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("entries.bin");
        let writer = EntryWriter::create(&path).unwrap();
        writer.write_entry(EntryRecord::new(7, [0; 7], 0, false)).unwrap();
        writer.flush_thread_local().unwrap();
        writer.finish().unwrap();

        let reader = EntryReader::open(&path, None).unwrap();
        assert_eq!(reader.len(), 1);
    }
}

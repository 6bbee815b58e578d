use std::io::{BufWriter, Write};
use std::path::Path;

use dna_core::{Base, DnaCursor, DnaSlice};
use membuf::MemBuf;

use crate::error::SeqRepoError;

/// Bytes buffered in RAM before being flushed to the blob file.
const FLUSH_THRESHOLD_BYTES: usize = 64 * 1024;

/// An append-only, base-addressed (not byte-addressed) packed sequence
/// blob. `write_seq` returns the base offset new data was written at, so
/// later entry records can point back into it.
pub struct BlobWriter {
    file: BufWriter<std::fs::File>,
    buffer: Vec<u8>,
    total_bases: u64,
    pending_byte: u8,
    pending_bases: u8,
}

impl BlobWriter {
    pub fn create(path: impl AsRef<Path>) -> Result<Self, SeqRepoError> {
        let path_ref = path.as_ref();
        let file = std::fs::File::create(path_ref)
            .map_err(|source| SeqRepoError::Io { path: path_ref.display().to_string(), source })?;
        Ok(BlobWriter {
            file: BufWriter::new(file),
            buffer: Vec::with_capacity(FLUSH_THRESHOLD_BYTES),
            total_bases: 0,
            pending_byte: 0,
            pending_bases: 0,
        })
    }

    #[must_use]
    pub fn total_bases(&self) -> u64 {
        self.total_bases
    }

    fn push_base(&mut self, base: Base) {
        let shift = 6 - 2 * self.pending_bases;
        self.pending_byte |= base.value() << shift;
        self.pending_bases += 1;
        self.total_bases += 1;
        if self.pending_bases == 4 {
            self.buffer.push(self.pending_byte);
            self.pending_byte = 0;
            self.pending_bases = 0;
            if self.buffer.len() >= FLUSH_THRESHOLD_BYTES {
                // Errors surface on the next fallible call via `flush`.
                let _ = self.flush_buffer();
            }
        }
    }

    fn flush_buffer(&mut self) -> Result<(), SeqRepoError> {
        if !self.buffer.is_empty() {
            self.file.write_all(&self.buffer).map_err(|source| SeqRepoError::Io {
                path: "<blob>".to_string(),
                source,
            })?;
            self.buffer.clear();
        }
        Ok(())
    }

    /// Append `slice`'s bases to the blob and return the base offset they
    /// start at.
    pub fn write_seq(&mut self, slice: DnaSlice<'_>) -> u64 {
        let start = self.total_bases;
        for base in slice.iter() {
            self.push_base(base);
        }
        start
    }

    /// Flush any buffered whole bytes and the final partial byte (if any),
    /// and sync to disk.
    pub fn finish(mut self) -> Result<(), SeqRepoError> {
        self.flush_buffer()?;
        if self.pending_bases > 0 {
            self.file.write_all(&[self.pending_byte]).map_err(|source| SeqRepoError::Io {
                path: "<blob>".to_string(),
                source,
            })?;
        }
        self.file.flush().map_err(|source| SeqRepoError::Io { path: "<blob>".to_string(), source })?;
        Ok(())
    }
}

/// Read-only, mmap-backed view of a blob written by [`BlobWriter`].
pub struct BlobReader {
    data: MemBuf<'static>,
}

impl BlobReader {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SeqRepoError> {
        let path_ref = path.as_ref();
        let data = MemBuf::map_file(path_ref).map_err(|source| SeqRepoError::Membuf {
            path: path_ref.display().to_string(),
            source,
        })?;
        Ok(BlobReader { data })
    }

    /// Read `len` bases starting at base offset `offset`, optionally
    /// reverse-complemented.
    #[must_use]
    pub fn read(&self, offset: u64, len: u64, rc: bool) -> DnaSlice<'_> {
        let cursor = DnaCursor::new(self.data.data(), offset as usize, false);
        let forward = DnaSlice::from_cursor(cursor, len as usize);
        if rc {
            forward.rev_comp()
        } else {
            forward
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dna_core::DnaSequence;

    #[test]
    fn write_then_read_back_matches() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blob.bin");
        let mut writer = BlobWriter::create(&path).unwrap();
        let s1 = DnaSequence::parse("ACGTACGTACGTACGTACGTACGTACGTTTTT").unwrap();
        let s2 = DnaSequence::parse("GGCC").unwrap();
        let off1 = writer.write_seq(s1.as_slice());
        let off2 = writer.write_seq(s2.as_slice());
        writer.finish().unwrap();

        let reader = BlobReader::open(&path).unwrap();
        assert_eq!(reader.read(off1, s1.size() as u64, false).as_string(), s1.as_string());
        assert_eq!(reader.read(off2, s2.size() as u64, false).as_string(), s2.as_string());
    }

    #[test]
    fn rc_read_matches_rev_comp() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blob.bin");
        let mut writer = BlobWriter::create(&path).unwrap();
        let s = DnaSequence::parse("ACGTTGCA").unwrap();
        let off = writer.write_seq(s.as_slice());
        writer.finish().unwrap();

        let reader = BlobReader::open(&path).unwrap();
        let rc_read = reader.read(off, s.size() as u64, true);
        assert_eq!(rc_read.as_string(), s.rev_comp().as_string());
    }
}

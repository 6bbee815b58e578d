use std::path::Path;

use membuf::MemBuf;

use crate::blob::BlobReader;
use crate::entry::EntryView;
use crate::error::SeqRepoError;
use crate::record::EntryRecord;

/// Read-only, mmap-backed view of a file of fixed 14-byte entry records,
/// optionally paired with the blob their long tails live in.
pub struct EntryReader {
    data: MemBuf<'static>,
    blob: Option<BlobReader>,
}

impl EntryReader {
    pub fn open(records_path: impl AsRef<Path>, blob_path: Option<impl AsRef<Path>>) -> Result<Self, SeqRepoError> {
        let records_ref = records_path.as_ref();
        let data = MemBuf::map_file(records_ref)
            .map_err(|source| SeqRepoError::Membuf { path: records_ref.display().to_string(), source })?;
        let blob = blob_path.map(BlobReader::open).transpose()?;
        Ok(EntryReader { data, blob })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.data.size() / EntryRecord::BYTE_LEN
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn get(&self, index: usize) -> EntryView<'_> {
        let start = index * EntryRecord::BYTE_LEN;
        let mut bytes = [0u8; EntryRecord::BYTE_LEN];
        bytes.copy_from_slice(&self.data.data()[start..start + EntryRecord::BYTE_LEN]);
        EntryView::new(EntryRecord::from_bytes(bytes), self.blob.as_ref())
    }

    pub fn iter(&self) -> impl Iterator<Item = EntryView<'_>> {
        (0..self.len()).map(move |i| self.get(i))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::build_record;
    use crate::writer::EntryWriter;
    use dna_core::DnaSequence;

    #[test]
    fn iterates_records_in_write_order() {
        let dir = tempfile::tempdir().unwrap();
        let records_path = dir.path().join("records.bin");
        let blob_path = dir.path().join("blob.bin");

        let mut blob_writer = crate::blob::BlobWriter::create(&blob_path).unwrap();
        let writer = EntryWriter::create(&records_path).unwrap();
        let seqs = ["ACGT", "TTTTGGGGCCCCAAAA", &"ACGT".repeat(10)];
        for s in seqs {
            let seq = DnaSequence::parse(s).unwrap();
            let record = build_record(seq.as_slice(), &mut blob_writer);
            writer.write_entry(record).unwrap();
        }
        writer.finish().unwrap();
        blob_writer.finish().unwrap();

        let reader = EntryReader::open(&records_path, Some(&blob_path)).unwrap();
        assert_eq!(reader.len(), seqs.len());
        for (view, expected) in reader.iter().zip(seqs.iter()) {
            assert_eq!(view.full_sequence().as_string(), *expected);
        }
    }
}

use std::path::Path;

use dna_core::{dna_bases, CompareResult, DnaSequence};
use part_repo::PartRepoReader;

use crate::bitset::BitsetBuilder;
use crate::error::SeqsetError;
use crate::layout;
use crate::meta::{varbit_width_for, SeqsetMeta};

/// Build a finished seqset (spec.md 4.F/6.1) from the expander's closed
/// output pass, writing `seqset.json`, `shared`, `sizes`, `bases`,
/// `prev_A/C/G/T` and `uuid` into `out_dir`.
pub fn build(out_dir: impl AsRef<Path>, part_reader: &PartRepoReader) -> Result<SeqsetMeta, SeqsetError> {
    let out_dir = out_dir.as_ref();
    std::fs::create_dir_all(out_dir).map_err(|source| SeqsetError::Io { path: out_dir.display().to_string(), source })?;

    let depth = part_reader.config().depth();
    let partition_count = part_reader.config().partition_count();
    let quarter = partition_count / 4;

    let partitions = part_reader.partitions(true)?;
    let per_partition_entries: Vec<(u32, Vec<DnaSequence>)> =
        partitions.iter().map(|part| (part.part_id, part.main.iter().map(|v| v.full_sequence()).collect())).collect();

    let total_entries: u64 = per_partition_entries.iter().map(|(_, seqs)| seqs.len() as u64).sum();
    if total_entries > u64::from(u32::MAX) {
        return Err(SeqsetError::EntryCountOverflow { count: total_entries });
    }

    let mut counts_by_partition = vec![0u64; partition_count];
    for (part_id, seqs) in &per_partition_entries {
        counts_by_partition[*part_id as usize] = seqs.len() as u64;
    }
    let mut base_start = [0u64; 4];
    for (g, slot) in base_start.iter_mut().enumerate() {
        *slot = counts_by_partition[..g * quarter].iter().sum();
    }

    let mut sizes: Vec<u64> = Vec::with_capacity(total_entries as usize);
    let mut shared: Vec<u64> = Vec::with_capacity(total_entries as usize);
    let mut new_bases = DnaSequence::new();
    let mut has_prev: [BitsetBuilder; 4] = [
        BitsetBuilder::new(total_entries as usize),
        BitsetBuilder::new(total_entries as usize),
        BitsetBuilder::new(total_entries as usize),
        BitsetBuilder::new(total_entries as usize),
    ];

    let max_read_len: u32 = per_partition_entries.iter().flat_map(|(_, seqs)| seqs.iter().map(|s| s.size() as u32)).max().unwrap_or(0);

    let mut prev_entry: Option<DnaSequence> = None;
    let mut global_index: usize = 0;

    for part in &partitions {
        let (_, seqs) =
            per_partition_entries.iter().find(|(id, _)| *id == part.part_id).expect("partition present in per_partition_entries");

        for (local_idx, seq) in seqs.iter().enumerate() {
            let size = seq.size();
            let shared_len = if local_idx == 0 {
                prev_entry.as_ref().map_or(0, |p| p.shared_prefix_length(&seq.as_slice()))
            } else {
                seqs[local_idx - 1].shared_prefix_length(&seq.as_slice())
            };
            sizes.push(size as u64);
            shared.push(shared_len as u64);
            let tail = seq.subseq(shared_len, size - shared_len).expect("shared_len <= size");
            new_bases.copy_bases(tail.as_slice());
        }
        if let Some(last) = seqs.last() {
            prev_entry = Some(last.clone());
        }

        for b in dna_bases() {
            let pushed_reader = part[b].as_ref();
            for (i, bit) in has_prev_for_base(seqs, pushed_reader, max_read_len).into_iter().enumerate() {
                if bit {
                    has_prev[b.value() as usize].set(global_index + i);
                }
            }
        }
        global_index += seqs.len();
    }

    let width = varbit_width_for(max_read_len);
    let sizes_vec = varbit::VarBitVec::new(sizes.len(), width);
    let shared_vec = varbit::VarBitVec::new(sizes.len(), width);
    for (i, (&s, &sh)) in sizes.iter().zip(shared.iter()).enumerate() {
        sizes_vec.set(i, s);
        shared_vec.set(i, sh);
    }

    let uuid = random_uuid();
    let meta = SeqsetMeta::new(uuid, total_entries, max_read_len, depth, new_bases.size() as u64, base_start);

    write_section(&layout::shared_path(out_dir), &shared_vec.to_bytes())?;
    write_section(&layout::sizes_path(out_dir), &sizes_vec.to_bytes())?;
    write_section(&layout::bases_path(out_dir), new_bases.as_packed())?;
    write_section(&layout::uuid_path(out_dir), &uuid)?;
    for b in dna_bases() {
        let bytes = std::mem::replace(&mut has_prev[b.value() as usize], BitsetBuilder::new(0)).into_bytes();
        write_section(&layout::prev_path(out_dir, b), &bytes)?;
    }
    let meta_json = serde_json::to_vec_pretty(&meta).expect("SeqsetMeta always serializes");
    write_section(&layout::meta_path(out_dir), &meta_json)?;

    log::info!("seqset builder: {total_entries} entries, max_read_len={max_read_len}, varbit width={width}");
    Ok(meta)
}

fn write_section(path: &Path, bytes: &[u8]) -> Result<(), SeqsetError> {
    std::fs::write(path, bytes).map_err(|source| SeqsetError::Io { path: path.display().to_string(), source })
}

/// For one partition's main entries (sorted ascending) and the pushed
/// neighbor partition for base `b` (also sorted ascending, or `None` if
/// that neighbor is empty), compute the `has_prev[b]` bit for each main
/// entry: set iff some pushed entry's pop-front sequence equals the main
/// entry exactly, or -- only at the `max_read_len` boundary, where
/// prepending `b` to a full-length entry would have been truncated -- is
/// a one-base-shorter prefix of it.
fn has_prev_for_base(main: &[DnaSequence], pushed: Option<&seq_repo::EntryReader>, max_read_len: u32) -> Vec<bool> {
    let mut bits = vec![false; main.len()];
    let Some(pushed) = pushed else { return bits };

    let mut i = 0usize;
    for view in pushed.iter() {
        let popped = view.popped();
        while i < main.len() && main[i].compare_to(&popped.as_slice()).is_less() {
            i += 1;
        }
        if i >= main.len() {
            break;
        }
        match main[i].compare_to(&popped.as_slice()) {
            CompareResult::Equal => bits[i] = true,
            CompareResult::SecondIsPrefix
                if main[i].size() as u32 == max_read_len && main[i].size() == popped.size() + 1 =>
            {
                bits[i] = true;
            }
            _ => {}
        }
    }
    bits
}

fn random_uuid() -> [u8; 16] {
    use rand::RngCore;
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;
    use dna_core::DnaSequence as Seq;
    use part_repo::{PartConfig, PartRepoWriter};

    fn write_suffix(writer: &PartRepoWriter, s: &str) {
        let seq = Seq::parse(s).unwrap();
        writer.write(seq.as_slice(), 1, 0).unwrap();
    }

    #[test]
    fn builder_produces_consistent_entry_count_and_sections() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = PartConfig::new(2).unwrap();
        let writer = PartRepoWriter::create(dir.path(), "new", cfg, false).unwrap();
        for s in ["ACGT", "CGT", "GT", "T"] {
            write_suffix(&writer, s);
        }
        writer.flush_thread_local().unwrap();
        writer.finish().unwrap();

        let (final_pass, _dedup) = expander::run_to_closure(dir.path(), "new", cfg).unwrap();

        let reader = PartRepoReader::open(dir.path(), &final_pass, cfg);
        let out_dir = dir.path().join("seqset_out");
        let meta = build(&out_dir, &reader).unwrap();
        assert_eq!(meta.entry_count, 4);
        assert!(out_dir.join("seqset.json").exists());
        assert!(out_dir.join("shared").exists());
        assert!(out_dir.join("sizes").exists());
        assert!(out_dir.join("bases").exists());
        assert!(out_dir.join("uuid").exists());
        for base in ['A', 'C', 'G', 'T'] {
            assert!(out_dir.join(format!("prev_{base}")).exists());
        }
    }

    #[test]
    fn base_start_is_nondecreasing_and_bounded() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = PartConfig::new(2).unwrap();
        let writer = PartRepoWriter::create(dir.path(), "new", cfg, false).unwrap();
        for s in ["ACGT", "CGT", "GT", "T"] {
            write_suffix(&writer, s);
        }
        writer.flush_thread_local().unwrap();
        writer.finish().unwrap();
        let (final_pass, _) = expander::run_to_closure(dir.path(), "new", cfg).unwrap();
        let reader = PartRepoReader::open(dir.path(), &final_pass, cfg);
        let out_dir = dir.path().join("seqset_out");
        let meta = build(&out_dir, &reader).unwrap();
        assert_eq!(meta.base_start[0], 0);
        for i in 1..4 {
            assert!(meta.base_start[i] >= meta.base_start[i - 1]);
        }
        assert!(meta.base_start[3] <= meta.entry_count);
    }

    #[test]
    fn has_prev_reflects_actual_prefix_extensions() {
        // "TCG" has_prev[C] should be true: "CTCG" is also in this closed set.
        let dir = tempfile::tempdir().unwrap();
        let cfg = PartConfig::new(1).unwrap();
        let writer = PartRepoWriter::create(dir.path(), "new", cfg, false).unwrap();
        for s in ["ACTCG", "TCG", "CG"] {
            write_suffix(&writer, s);
        }
        writer.flush_thread_local().unwrap();
        writer.finish().unwrap();
        let (final_pass, _) = expander::run_to_closure(dir.path(), "new", cfg).unwrap();
        let reader = PartRepoReader::open(dir.path(), &final_pass, cfg);
        let out_dir = dir.path().join("seqset_out");
        let meta = build(&out_dir, &reader).unwrap();

        let prev_c = std::fs::read(layout::prev_path(&out_dir, dna_core::Base::C)).unwrap();
        let view = crate::bitset::BitsetView::new(&prev_c, meta.entry_count as usize);
        // Reconstruct sequences in colex order to find "TCG"'s index.
        let shared_bytes = std::fs::read(layout::shared_path(&out_dir)).unwrap();
        let sizes_bytes = std::fs::read(layout::sizes_path(&out_dir)).unwrap();
        let bases_bytes = std::fs::read(layout::bases_path(&out_dir)).unwrap();
        let width = meta.varbit_width();
        let shared_view = varbit::VarBitView::new(&shared_bytes, meta.entry_count as usize, width);
        let sizes_view = varbit::VarBitView::new(&sizes_bytes, meta.entry_count as usize, width);
        let bases_cursor = dna_core::DnaCursor::new(&bases_bytes, 1, false);
        let full_bases = dna_core::DnaSlice::from_cursor(bases_cursor, meta.bases_len as usize);

        let mut offset = 0usize;
        let mut prev = DnaSequence::new();
        let mut found = None;
        for i in 0..meta.entry_count as usize {
            let size = sizes_view.get(i) as usize;
            let sh = shared_view.get(i) as usize;
            let new_len = size - sh;
            let mut seq = prev.subseq(0, sh).unwrap();
            seq.copy_bases(full_bases.subseq(offset, new_len).unwrap());
            offset += new_len;
            if seq.as_string() == "TCG" {
                found = Some(i);
            }
            prev = seq;
        }
        let idx = found.expect("TCG present in seqset");
        assert!(view.get(idx), "has_prev[C] should be set for TCG");
    }
}

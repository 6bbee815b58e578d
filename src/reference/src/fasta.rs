use std::io::{BufRead, BufReader};
use std::path::Path;

use dna_core::{Base, DnaSequence};

use crate::error::ReferenceError;
use crate::scaffold::Scaffold;

/// Extents are broken apart wherever a run of `N` (or any non-ACGT
/// character) of at least this many bases appears, since such a run can
/// never be walked by the seqset -- matching "gap-free segment" in the
/// scaffold/extent glossary entries.
const MIN_GAP_RUN: usize = 1;

pub struct ParsedGenome {
    pub scaffolds: Vec<Scaffold>,
    pub sequence: DnaSequence,
}

/// Parse a (possibly multi-record) FASTA file into a flat packed sequence
/// plus the list of gap-free scaffolds it decomposes into. Record headers
/// become scaffold name prefixes; a run of ambiguous bases within a record
/// splits it into `name#0`, `name#1`, ...
pub fn load_fasta(path: impl AsRef<Path>) -> Result<ParsedGenome, ReferenceError> {
    let path_ref = path.as_ref();
    let file = std::fs::File::open(path_ref)
        .map_err(|source| ReferenceError::Io { path: path_ref.display().to_string(), source })?;
    let reader = BufReader::new(file);

    let mut scaffolds = Vec::new();
    let mut sequence = DnaSequence::new();
    let mut current_header: Option<String> = None;
    let mut current_run_start: u64 = 0;
    let mut current_run_idx = 0usize;
    let mut pos_in_record = 0usize;

    let flush_run = |sequence: &DnaSequence,
                     scaffolds: &mut Vec<Scaffold>,
                     header: &str,
                     run_idx: usize,
                     run_start: u64| {
        let len = sequence.size() as u64 - run_start;
        if len > 0 {
            let name = if run_idx == 0 { header.to_string() } else { format!("{header}#{run_idx}") };
            scaffolds.push(Scaffold { name, global_start: run_start, len });
        }
    };

    for line in reader.lines() {
        let line = line.map_err(|source| ReferenceError::Io { path: path_ref.display().to_string(), source })?;
        if let Some(header) = line.strip_prefix('>') {
            if let Some(prev_header) = &current_header {
                flush_run(&sequence, &mut scaffolds, prev_header, current_run_idx, current_run_start);
            }
            current_header = Some(header.trim().split_whitespace().next().unwrap_or("").to_string());
            current_run_start = sequence.size() as u64;
            current_run_idx = 0;
            pos_in_record = 0;
            continue;
        }
        let Some(header) = current_header.clone() else {
            continue; // ignore stray lines before the first header
        };
        for c in line.trim_end().chars() {
            match Base::try_from(c) {
                Ok(base) => {
                    sequence.push_back(base);
                }
                Err(_) => {
                    if c.eq_ignore_ascii_case(&'n') || c == '-' {
                        if sequence.size() as u64 > current_run_start {
                            flush_run(&sequence, &mut scaffolds, &header, current_run_idx, current_run_start);
                            current_run_idx += 1;
                        }
                        current_run_start = sequence.size() as u64;
                    } else {
                        return Err(ReferenceError::InvalidBase { scaffold: header, pos: pos_in_record, c });
                    }
                }
            }
            pos_in_record += 1;
        }
    }
    if let Some(header) = current_header {
        flush_run(&sequence, &mut scaffolds, &header, current_run_idx, current_run_start);
    }
    let _ = MIN_GAP_RUN; // gap-run coalescing granularity reserved for future tuning

    Ok(ParsedGenome { scaffolds, sequence })
}

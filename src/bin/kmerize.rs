//! `kmerize` (spec.md §6.4): run the two-phase probabilistic-then-exact
//! k-mer counter over a read collection and emit surviving k-mers with
//! their forward/reverse counts and read-start flags.

use std::io::Write;
use std::path::PathBuf;

use clap::Parser;

use biograph_core::common::CommonArgs;
use biograph_core::ingest::read_fasta_reads;
use dna_core::Base;
use kmer_counter::{count_kmer_slices, KmerCounterOptions};

/// Count canonical k-mers across a read collection.
#[derive(Parser, Debug)]
#[command(name = "kmerize", author, version, about, long_about = None)]
struct Cli {
    /// FASTA-formatted read source (one record per read).
    #[arg(long)]
    input: PathBuf,

    /// Output directory; a `kmers.tsv` file is written here.
    #[arg(long)]
    output: PathBuf,

    /// K-mer length, 1..=31 (spec.md §3.4).
    #[arg(long)]
    k: usize,

    /// Minimum phase-1 saturating count (1..=3) for a k-mer to be promoted
    /// into phase-2 exact counting (spec.md §4.E).
    #[arg(long = "min-count", default_value_t = 2)]
    min_count: u8,

    /// Number of phase-1/phase-2 hash partitions.
    #[arg(long, default_value_t = 256)]
    partitions: usize,

    #[command(flatten)]
    common: CommonArgs,
}

fn main() {
    let cli = Cli::parse();
    cli.common.apply();

    match run(&cli) {
        Ok(()) => std::process::exit(0),
        Err(err) => {
            log::error!("kmerize failed: {err:#}");
            std::process::exit(biograph_core::common::exit_code_for(&err));
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let reads = read_fasta_reads(&cli.input)?;
    log::info!("kmerize: loaded {} reads from {}", reads.len(), cli.input.display());

    let opts = KmerCounterOptions::new(cli.k)?.with_min_count(cli.min_count).with_num_partitions(cli.partitions);
    let records = count_kmer_slices(reads.iter().map(|s| s.as_slice()), opts);
    log::info!("kmerize: {} of k={} k-mers survived phase-1 filtering into phase-2", records.len(), cli.k);

    std::fs::create_dir_all(&cli.output)?;
    let out_path = cli.output.join("kmers.tsv");
    let mut out = std::fs::File::create(&out_path)?;
    writeln!(out, "kmer\tfwd_count\trev_count\tfwd_starts_read\trev_starts_read")?;
    for record in &records {
        writeln!(
            out,
            "{}\t{}\t{}\t{}\t{}",
            decode_kmer(record.kmer, cli.k),
            record.fwd_count,
            record.rev_count,
            record.fwd_starts_read,
            record.rev_starts_read
        )?;
    }
    log::info!("kmerize: wrote {} records to {}", records.len(), out_path.display());
    Ok(())
}

/// Decode an MSB-aligned 2-bit-packed canonical k-mer back into its base
/// string, the inverse of `kmer_counter::canonical_kmer`'s encoding (same
/// manual unpacking `DnaSequence::as_kmer`'s round-trip test uses).
fn decode_kmer(kmer: u64, k: usize) -> String {
    (0..k)
        .map(|i| {
            let shift = 2 * (k - 1 - i);
            let value = ((kmer >> shift) & 0b11) as u8;
            Base::new(value).expect("masked to 2 bits").to_char()
        })
        .collect()
}

//! `discover-variants` (spec.md §6.4): seed a best-first tracer search at
//! every position across a reference scaffold, re-express surviving
//! non-reference assemblies against reference via the aligner, and write
//! the resulting variant regions.
//!
//! Deliberately not a full VCF emitter (spec.md's Non-goals explicitly
//! excludes one): output is a simplified TSV of `(scaffold, left, right,
//! replacement, supporting_reads)` rows, one per non-reference
//! `aligned_variant` region the align-splitter produces.

use std::collections::HashSet;
use std::io::Write;
use std::path::PathBuf;

use clap::Parser;

use aligner::{align_assembly, split_into_regions, AlignOutcome, AlignerOptions};
use biograph_core::common::CommonArgs;
use reference::{parse_scaffold_spec, ReferenceGenome};
use seqset::SeqsetReader;
use tracer::{Assembly, Tracer, TracerOptions};

/// Trace and align non-reference variants across a reference scaffold.
#[derive(Parser, Debug)]
#[command(name = "discover-variants", author, version, about, long_about = None)]
struct Cli {
    /// Directory a prior `build-seqset` run wrote.
    #[arg(long)]
    seqset: PathBuf,

    /// Reference genome, FASTA-formatted. A reference map is built from it
    /// into a scratch directory under `--output` before tracing starts,
    /// since this workspace has no standalone ref-map-building binary.
    #[arg(long)]
    reference: PathBuf,

    /// `NAME` or `NAME:START-END` (spec.md §6.4).
    #[arg(long)]
    scaffold: String,

    /// Output path for the variant TSV.
    #[arg(long)]
    output: PathBuf,

    #[command(flatten)]
    common: CommonArgs,
}

fn main() {
    let cli = Cli::parse();
    cli.common.apply();

    match run(&cli) {
        Ok(()) => std::process::exit(0),
        Err(err) => {
            log::error!("discover-variants failed: {err:#}");
            std::process::exit(biograph_core::common::exit_code_for(&err));
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let seqset = SeqsetReader::open(&cli.seqset)?;
    log::info!("discover-variants: opened seqset with {} entries", seqset.len());

    let genome = ReferenceGenome::load_fasta(&cli.reference)?;

    let output_dir = cli.output.parent().map(std::path::Path::to_path_buf).unwrap_or_else(|| PathBuf::from("."));
    std::fs::create_dir_all(&output_dir)?;
    let ref_map_dir = output_dir.join("_ref_map_work");
    ref_map::build(&ref_map_dir, &seqset, &genome, seqset.meta().max_read_len)?;
    let ref_map_reader = ref_map::RefMapReader::open(&ref_map_dir)?;

    let scaffold_spec = parse_scaffold_spec(&cli.scaffold)?;
    let scaffold = genome
        .scaffold(&scaffold_spec.name)
        .ok_or_else(|| anyhow::anyhow!("unknown scaffold '{}'", scaffold_spec.name))?;
    let (range_start, range_end) = scaffold_spec.range.unwrap_or((0, scaffold.len));
    let anchor_len = seqset.meta().max_read_len;

    let mut tracer = Tracer::new(&seqset, &ref_map_reader, &genome, TracerOptions::default());
    let aligner_options = AlignerOptions::default();

    let mut next_region_id = 0u64;
    let mut seen = HashSet::new();
    let mut regions = Vec::new();

    let last_anchor_start = range_end.saturating_sub(u64::from(anchor_len));
    for offset in range_start..=last_anchor_start {
        let assemblies = tracer.trace_at(&scaffold_spec.name, offset, anchor_len)?;
        for mut assembly in assemblies {
            if align_non_reference(&mut assembly, &scaffold_spec.name, &genome, &aligner_options)? == AlignOutcome::Discarded {
                continue;
            }
            for region in split_into_regions(&assembly, || {
                next_region_id += 1;
                next_region_id
            }) {
                if region.matches_reference {
                    continue;
                }
                let key = (region.left_offset, region.right_offset, region.seq.as_string());
                if seen.insert(key) {
                    regions.push(region);
                }
            }
        }
    }

    write_regions(&cli.output, &scaffold_spec.name, &regions)?;
    log::info!("discover-variants: wrote {} variant regions to {}", regions.len(), cli.output.display());

    std::fs::remove_dir_all(&ref_map_dir).ok();
    Ok(())
}

fn align_non_reference(
    assembly: &mut Assembly,
    scaffold: &str,
    genome: &ReferenceGenome,
    options: &AlignerOptions,
) -> anyhow::Result<AlignOutcome> {
    if assembly.is_anchor_dropped() {
        return Ok(AlignOutcome::Kept);
    }
    Ok(align_assembly(assembly, scaffold, genome, options)?)
}

fn write_regions(path: &std::path::Path, scaffold: &str, regions: &[Assembly]) -> anyhow::Result<()> {
    let mut out = std::fs::File::create(path)?;
    writeln!(out, "#scaffold\tleft\tright\treplacement\tsupporting_reads\tassembly_id")?;
    for region in regions {
        let (Some(left), Some(right)) = (region.left_offset, region.right_offset) else {
            continue;
        };
        writeln!(out, "{scaffold}\t{left}\t{right}\t{}\t{}\t{}", region.seq.as_string(), region.read_ids.len(), region.id)?;
    }
    Ok(())
}

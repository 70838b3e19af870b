//! CLI entry point for isocds.
//!
//! `collapse` reduces a long-read transcript GTF to non-redundant models;
//! `call` maps CPAT ORF candidates onto the collapsed models and calls one
//! ORF per transcript.

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use log::{info, warn, Level};
use simple_logger::init_with_level;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use isocds::config::Config;
use isocds::orf::TranscriptIndex;
use isocds::output::{
    route_fasta_records, route_gtf_records, write_collapse_dropouts, write_mapped_table,
    write_orf_dropouts, write_selected_table,
};
use isocds::parser::orf::apply_stop_codon_status;
use isocds::parser::{
    open_input, parse_orf_table, parse_start_codons, parse_transcripts, read_sequences,
    read_stop_codon_status,
};
use isocds::pipeline::{call_orfs, collapse_transcripts, CallInputs};
use isocds::types::Granularity;

/// Long-read isoform collapsing and ORF calling.
#[derive(Parser, Debug)]
#[command(name = "isocds")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Collapse redundant transcript models
    Collapse(CollapseArgs),
    /// Map and call ORFs on transcript models
    Call(CallArgs),
}

#[derive(Args, Debug)]
struct CollapseArgs {
    /// Transcript GTF (required)
    #[arg(short = 'g', long = "gtf")]
    gtf: PathBuf,

    /// Transcript FASTA (required)
    #[arg(short = 'f', long = "fasta")]
    fasta: PathBuf,

    /// Output directory (required)
    #[arg(short = 'o', long = "outdir")]
    outdir: PathBuf,

    /// Output file prefix (required)
    #[arg(short = 'n', long = "name")]
    name: String,

    /// Fuzzy junction tolerance in bp
    #[arg(short = 't', long = "tolerance", default_value = "0")]
    tolerance: i64,

    /// Number of worker threads (0 = auto-detect)
    #[arg(long = "threads", short = 'j', default_value = "8")]
    threads: usize,
}

#[derive(Args, Debug)]
struct CallArgs {
    /// CPAT ORF table (required)
    #[arg(long = "orfs")]
    orfs: PathBuf,

    /// Collapsed transcript GTF (required)
    #[arg(short = 'g', long = "gtf")]
    gtf: PathBuf,

    /// Reference GTF with start_codon features (required)
    #[arg(short = 'r', long = "reference")]
    reference: PathBuf,

    /// Selected-ORF output table (required)
    #[arg(short = 'o', long = "output")]
    output: PathBuf,

    /// CPAT ORF FASTA, used to flag ORFs ending in a stop codon
    #[arg(long = "orf-fasta")]
    orf_fasta: Option<PathBuf>,

    /// Transcript FASTA, used to count upstream start codons
    #[arg(short = 'f', long = "fasta")]
    fasta: Option<PathBuf>,

    /// Table of every mapped candidate
    #[arg(long = "mapped-output")]
    mapped_output: Option<PathBuf>,

    /// Table of accessions without a called ORF
    #[arg(long = "dropout-output")]
    dropout_output: Option<PathBuf>,

    /// Start codon counted upstream of each ORF
    #[arg(long = "start-codon", default_value = "ATG")]
    start_codon: String,

    /// Comma-separated stop codons marking a complete ORF
    #[arg(long = "stop-codons", default_value = "TAG,TAA,TGA")]
    stop_codons: String,

    /// Upstream start-codon count at which the ATG score is 0.5
    #[arg(long = "atg-shift", default_value = "10")]
    atg_shift: f64,

    /// Slope of the ATG score sigmoid
    #[arg(long = "atg-growth", default_value = "0.5")]
    atg_growth: f64,

    /// Coding probability at or below which a call is low quality
    #[arg(long = "low-quality-threshold", default_value = "0.364")]
    low_quality_threshold: f64,

    /// Partition granularity: whole or chromosome
    #[arg(long = "granularity", default_value = "chromosome")]
    granularity: String,

    /// Number of worker threads (0 = auto-detect)
    #[arg(long = "threads", short = 'j', default_value = "8")]
    threads: usize,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_with_level(Level::Info).context("Failed to initialize logger")?;
    let start = Instant::now();

    match cli.command {
        Command::Collapse(args) => run_collapse(args)?,
        Command::Call(args) => run_call(args)?,
    }

    info!("Done in {:.2?}", start.elapsed());
    Ok(())
}

fn build_pool(threads: usize) -> Result<rayon::ThreadPool> {
    let num_threads = if threads == 0 { num_cpus::get() } else { threads };
    info!("Using {} threads", num_threads);
    rayon::ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .build()
        .context("Failed to create thread pool")
}

fn create_output(path: &Path) -> Result<BufWriter<File>> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create output file: {}", path.display()))?;
    Ok(BufWriter::new(file))
}

fn run_collapse(args: CollapseArgs) -> Result<()> {
    // Validate inputs
    if !args.gtf.exists() {
        bail!("GTF file not found: {}", args.gtf.display());
    }
    if !args.fasta.exists() {
        bail!("FASTA file not found: {}", args.fasta.display());
    }
    if args.name.is_empty() {
        bail!("Output name cannot be empty.");
    }

    let mut config = Config::new();
    config.threads = args.threads;
    if !config.set_tolerance(args.tolerance) {
        bail!("The fuzzy tolerance cannot be lower than 0 bps.");
    }

    info!("Parsing GTF file: {}", args.gtf.display());
    let data = parse_transcripts(&args.gtf)?;
    info!(
        "Parsed {} transcripts in {} loci ({} rejected, {} lines skipped)",
        data.transcript_count(),
        data.loci.len(),
        data.rejected.len(),
        data.skipped_lines
    );

    let pool = build_pool(config.threads)?;
    let outcome = pool.install(|| collapse_transcripts(data, config.fuzzy_tolerance));
    for locus in &outcome.anomalous_loci {
        warn!("Locus {} kept no transcript models", locus);
    }

    let dropout_dir = args.outdir.join("dropout");
    fs::create_dir_all(&dropout_dir)
        .with_context(|| format!("Failed to create output directory: {}", dropout_dir.display()))?;
    let survivors = outcome.survivors();

    let mut kept_gtf = create_output(&args.outdir.join(format!("{}_collapsed.gtf", args.name)))?;
    let mut dropped_gtf = create_output(&dropout_dir.join(format!("{}_dropout.gff", args.name)))?;
    let (n_kept, n_dropped) = route_gtf_records(
        open_input(&args.gtf, "transcript GTF")?,
        &survivors,
        &mut kept_gtf,
        &mut dropped_gtf,
    )?;
    kept_gtf.flush()?;
    dropped_gtf.flush()?;
    info!("Wrote {} kept and {} dropout GTF lines", n_kept, n_dropped);

    let (n_kept, n_dropped) = route_fasta_records(
        open_input(&args.fasta, "transcript FASTA")?,
        &survivors,
        create_output(&args.outdir.join(format!("{}_collapsed.fasta", args.name)))?,
        create_output(&dropout_dir.join(format!("{}_dropout.fasta", args.name)))?,
    )?;
    info!("Wrote {} kept and {} dropout FASTA records", n_kept, n_dropped);

    let mut report = create_output(&dropout_dir.join(format!("{}_dropout.tsv", args.name)))?;
    write_collapse_dropouts(&mut report, &outcome.dropped, &outcome.rejected)?;
    report.flush()?;

    Ok(())
}

fn run_call(args: CallArgs) -> Result<()> {
    // Validate inputs
    if !args.orfs.exists() {
        bail!("ORF table not found: {}", args.orfs.display());
    }
    if !args.gtf.exists() {
        bail!("GTF file not found: {}", args.gtf.display());
    }
    if !args.reference.exists() {
        bail!("Reference GTF not found: {}", args.reference.display());
    }
    for optional in [&args.orf_fasta, &args.fasta].into_iter().flatten() {
        if !optional.exists() {
            bail!("FASTA file not found: {}", optional.display());
        }
    }

    // Build configuration
    let mut config = Config::new();
    config.threads = args.threads;
    config.granularity = args
        .granularity
        .parse::<Granularity>()
        .context("Granularity can only be one of the following: whole or chromosome")?;
    if !config.set_start_codon(&args.start_codon) {
        bail!("The start codon must be a single nucleotide triplet.");
    }
    if !config.parse_stop_codons(&args.stop_codons) {
        bail!("Stop codons must be comma-separated nucleotide triplets.");
    }
    if !config.set_atg_sigmoid(args.atg_shift, args.atg_growth) {
        bail!("The ATG growth must be a positive number.");
    }
    if !config.set_low_quality_threshold(args.low_quality_threshold) {
        bail!("The low quality threshold should range between 0 and 1.");
    }

    info!("Parsing transcript GTF: {}", args.gtf.display());
    let data = parse_transcripts(&args.gtf)?;
    if !data.rejected.is_empty() {
        warn!("{} transcripts rejected as malformed", data.rejected.len());
    }
    let transcripts = TranscriptIndex::new(data.into_transcripts());
    if transcripts.is_empty() {
        warn!("No transcript models in {}; every ORF will be dropped", args.gtf.display());
    }
    info!("Indexed {} transcript models", transcripts.len());

    info!("Parsing reference start codons: {}", args.reference.display());
    let start_codons = parse_start_codons(&args.reference)?;
    info!("Indexed {} reference start codons", start_codons.len());

    info!("Parsing ORF table: {}", args.orfs.display());
    let mut candidates = parse_orf_table(&args.orfs)?;
    info!("Parsed {} ORF candidates", candidates.len());
    match &args.orf_fasta {
        Some(path) => {
            let status = read_stop_codon_status(path, &config.stop_codons)?;
            apply_stop_codon_status(&mut candidates, &status);
        }
        None => info!("No ORF FASTA given; has_stop_codon is false for all candidates"),
    }

    let sequences = args.fasta.as_deref().map(read_sequences).transpose()?;
    if sequences.is_none() {
        warn!("No transcript FASTA given; upstream start codons cannot be counted");
    }

    let pool = build_pool(config.threads)?;
    let outcome = pool.install(|| {
        call_orfs(
            CallInputs {
                candidates,
                transcripts: &transcripts,
                start_codons: &start_codons,
                sequences: sequences.as_ref(),
            },
            &config,
        )
    })?;

    info!("Writing output to: {}", args.output.display());
    let mut writer = create_output(&args.output)?;
    write_selected_table(&mut writer, &outcome.selected)?;
    writer.flush()?;

    if let Some(path) = &args.mapped_output {
        let mut writer = create_output(path)?;
        write_mapped_table(&mut writer, &outcome.mapped)?;
        writer.flush()?;
    }
    if let Some(path) = &args.dropout_output {
        let mut writer = create_output(path)?;
        write_orf_dropouts(&mut writer, &outcome.dropouts)?;
        writer.flush()?;
    }

    Ok(())
}

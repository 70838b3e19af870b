//! Parsers for transcript, ORF and sequence inputs.

pub mod fasta;
pub mod gtf;
pub mod orf;

use anyhow::{Context, Result};
use flate2::read::GzDecoder;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

pub use fasta::{read_sequences, read_stop_codon_status, SequenceIndex};
pub use gtf::{parse_start_codons, parse_transcripts, TranscriptData};
pub use orf::parse_orf_table;

/// Creates a buffered reader that automatically handles gzip-compressed files.
///
/// Paths ending in ".gz" are wrapped in a GzDecoder.
pub fn create_buffered_reader(file: File, path: &Path) -> Box<dyn BufRead + Send> {
    if path.to_string_lossy().ends_with(".gz") {
        Box::new(BufReader::new(GzDecoder::new(file)))
    } else {
        Box::new(BufReader::new(file))
    }
}

/// Open an input file, plain or gzip-compressed.
pub fn open_input(path: &Path, what: &str) -> Result<Box<dyn BufRead + Send>> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open {} file: {}", what, path.display()))?;
    Ok(create_buffered_reader(file, path))
}

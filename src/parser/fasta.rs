//! Transcript and ORF FASTA reading.

use ahash::AHashMap;
use anyhow::{Context, Result};
use bio::io::fasta;
use log::{info, warn};
use std::io::BufRead;
use std::path::Path;

use crate::parser::open_input;

/// Record id up to the first `|`.
pub fn accession_from_id(id: &str) -> &str {
    id.split('|').next().unwrap_or(id)
}

/// Transcript sequences keyed by accession.
#[derive(Debug, Clone, Default)]
pub struct SequenceIndex {
    sequences: AHashMap<String, Vec<u8>>,
}

impl SequenceIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a sequence; returns false if the accession was already present,
    /// in which case the first sequence is kept.
    pub fn insert(&mut self, accession: String, sequence: Vec<u8>) -> bool {
        if self.sequences.contains_key(&accession) {
            return false;
        }
        self.sequences.insert(accession, sequence);
        true
    }

    pub fn get(&self, accession: &str) -> Option<&[u8]> {
        self.sequences.get(accession).map(|s| s.as_slice())
    }

    pub fn contains(&self, accession: &str) -> bool {
        self.sequences.contains_key(accession)
    }

    pub fn len(&self) -> usize {
        self.sequences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequences.is_empty()
    }
}

/// Read a transcript FASTA into a sequence index.
pub fn read_sequences(path: &Path) -> Result<SequenceIndex> {
    let reader = open_input(path, "transcript FASTA")?;
    let index = read_sequences_reader(reader)
        .with_context(|| format!("Failed to read FASTA: {}", path.display()))?;
    info!("Loaded {} transcript sequences", index.len());
    Ok(index)
}

pub fn read_sequences_reader<R: BufRead>(reader: R) -> Result<SequenceIndex> {
    let mut index = SequenceIndex::new();
    let mut duplicates = 0;
    for record in fasta::Reader::from_bufread(reader).records() {
        let record = record.context("Malformed FASTA record")?;
        let accession = accession_from_id(record.id()).to_string();
        if !index.insert(accession.clone(), record.seq().to_vec()) {
            warn!("Duplicate sequence for {}; keeping the first", accession);
            duplicates += 1;
        }
    }
    if duplicates > 0 {
        warn!("Ignored {} duplicate FASTA records", duplicates);
    }
    Ok(index)
}

/// Whether each ORF sequence ends with one of `stop_codons`, keyed by the
/// full record id.
pub fn read_stop_codon_status(path: &Path, stop_codons: &[String]) -> Result<AHashMap<String, bool>> {
    let reader = open_input(path, "ORF FASTA")?;
    read_stop_codon_status_reader(reader, stop_codons)
        .with_context(|| format!("Failed to read FASTA: {}", path.display()))
}

pub fn read_stop_codon_status_reader<R: BufRead>(
    reader: R,
    stop_codons: &[String],
) -> Result<AHashMap<String, bool>> {
    let mut status = AHashMap::new();
    for record in fasta::Reader::from_bufread(reader).records() {
        let record = record.context("Malformed FASTA record")?;
        let seq = record.seq();
        let has_stop = stop_codons.iter().any(|codon| {
            let codon = codon.as_bytes();
            seq.len() >= codon.len() && seq[seq.len() - codon.len()..].eq_ignore_ascii_case(codon)
        });
        status.insert(record.id().to_string(), has_stop);
    }
    Ok(status)
}

//! GTF parsing for transcript models and reference start codons.
//!
//! Transcript models are read from `exon` rows grouped by `transcript_id`;
//! loci follow the PacBio `PB.<gene>.<isoform>` naming. Malformed rows and
//! transcripts are logged and excluded rather than failing the run.

use ahash::AHashMap;
use anyhow::{Context, Result};
use indexmap::IndexMap;
use log::warn;
use std::io::BufRead;
use std::path::Path;

use crate::error::StructureError;
use crate::orf::reference::{StartCodon, StartCodonIndex};
use crate::parser::open_input;
use crate::types::{Exon, Locus, Strand, TranscriptModel};

/// A transcript rejected while building models.
#[derive(Debug, Clone)]
pub struct RejectedTranscript {
    pub accession: String,
    pub locus_id: String,
    pub error: StructureError,
}

/// Result of parsing a transcript GTF.
#[derive(Debug, Clone, Default)]
pub struct TranscriptData {
    /// Loci in order of first appearance.
    pub loci: Vec<Locus>,
    pub rejected: Vec<RejectedTranscript>,
    /// Rows excluded because they could not be parsed.
    pub skipped_lines: usize,
}

impl TranscriptData {
    pub fn transcript_count(&self) -> usize {
        self.loci.iter().map(|l| l.transcripts.len()).sum()
    }

    /// All transcript models, consuming the loci.
    pub fn into_transcripts(self) -> Vec<TranscriptModel> {
        self.loci.into_iter().flat_map(|l| l.transcripts).collect()
    }
}

/// One tab-separated GTF row.
struct GtfRow<'a> {
    chrom: &'a str,
    feature: &'a str,
    start: i64,
    end: i64,
    strand: Strand,
    attributes: &'a str,
}

/// Parse a GTF row; `Err` carries the reason the row was excluded.
fn parse_row(line: &str) -> std::result::Result<GtfRow<'_>, String> {
    let fields: Vec<&str> = line.split('\t').collect();
    if fields.len() < 9 {
        return Err(format!("expected 9 columns, found {}", fields.len()));
    }
    let start = fields[3]
        .parse::<i64>()
        .map_err(|_| format!("invalid start '{}'", fields[3]))?;
    let end = fields[4]
        .parse::<i64>()
        .map_err(|_| format!("invalid end '{}'", fields[4]))?;
    let strand = fields[6]
        .parse::<Strand>()
        .map_err(|e| format!("{} (found '{}')", e, fields[6]))?;

    Ok(GtfRow {
        chrom: fields[0],
        feature: fields[2],
        start,
        end,
        strand,
        attributes: fields[8],
    })
}

/// Extract an attribute value from the GTF attributes string.
///
/// GTF attributes are in the format: key "value"; key "value"; ...
pub fn extract_attribute(attributes: &str, key: &str) -> Option<String> {
    attributes.split(';').find_map(|pair| {
        let pair = pair.trim();
        let (name, value) = pair.split_once(char::is_whitespace)?;
        if name != key {
            return None;
        }
        Some(value.trim().trim_matches('"').to_string())
    })
}

/// Locus of an accession: `PB.<gene>` for PacBio accessions, otherwise the
/// gene id, falling back to the accession itself.
pub fn locus_for(accession: &str, gene_id: Option<&str>) -> String {
    let mut parts = accession.split('.');
    if let (Some("PB"), Some(gene), Some(_)) = (parts.next(), parts.next(), parts.next()) {
        return format!("PB.{}", gene);
    }
    gene_id.unwrap_or(accession).to_string()
}

#[derive(Default)]
struct TranscriptBuilder {
    chrom: String,
    strand: Option<Strand>,
    gene_id: Option<String>,
    exons: Vec<Exon>,
    mixed_strand: bool,
    mixed_chrom: bool,
}

impl TranscriptBuilder {
    fn observe(&mut self, row: &GtfRow<'_>, gene_id: Option<String>) {
        if self.strand.is_none() {
            self.chrom = row.chrom.to_string();
            self.strand = Some(row.strand);
        } else {
            self.mixed_strand |= self.strand != Some(row.strand);
            self.mixed_chrom |= self.chrom != row.chrom;
        }
        if self.gene_id.is_none() {
            self.gene_id = gene_id;
        }
    }

    fn build(mut self, accession: String, locus_id: String) -> std::result::Result<TranscriptModel, StructureError> {
        if self.mixed_strand {
            return Err(StructureError::MixedStrand { accession });
        }
        if self.mixed_chrom {
            return Err(StructureError::MixedChromosome { accession });
        }
        let strand = self.strand.unwrap_or(Strand::Positive);
        // minus-strand rows may come in transcription order; any other
        // order is left for validation to reject
        let descending = self.exons.len() > 1 && self.exons.windows(2).all(|w| w[1].start < w[0].start);
        if strand == Strand::Negative && descending {
            self.exons.reverse();
        }
        TranscriptModel::new(self.chrom, locus_id, accession, strand, self.exons)
    }
}

/// Parse a transcript-model GTF (plain or gzip-compressed).
pub fn parse_transcripts(path: &Path) -> Result<TranscriptData> {
    let reader = open_input(path, "transcript GTF")?;
    parse_transcripts_reader(reader)
}

/// Parse transcript models from a reader.
pub fn parse_transcripts_reader<R: BufRead>(reader: R) -> Result<TranscriptData> {
    let mut builders: IndexMap<String, TranscriptBuilder> = IndexMap::new();
    let mut skipped_lines = 0;

    for (line_idx, line_result) in reader.lines().enumerate() {
        let line = line_result.context("Failed to read GTF line")?;
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let row = match parse_row(&line) {
            Ok(row) => row,
            Err(reason) => {
                warn!("Skipping GTF line {}: {}", line_idx + 1, reason);
                skipped_lines += 1;
                continue;
            }
        };
        if row.feature != "exon" && row.feature != "transcript" {
            continue;
        }

        let Some(accession) = extract_attribute(row.attributes, "transcript_id") else {
            warn!("Skipping GTF line {}: missing transcript_id", line_idx + 1);
            skipped_lines += 1;
            continue;
        };

        let builder = builders.entry(accession).or_default();
        builder.observe(&row, extract_attribute(row.attributes, "gene_id"));
        if row.feature == "exon" {
            builder.exons.push(Exon::new(row.start, row.end));
        }
    }

    let mut loci: IndexMap<String, Locus> = IndexMap::new();
    let mut rejected = Vec::new();
    for (accession, builder) in builders {
        let locus_id = locus_for(&accession, builder.gene_id.as_deref());
        match builder.build(accession.clone(), locus_id.clone()) {
            Ok(model) => loci
                .entry(locus_id.clone())
                .or_insert_with(|| Locus::new(locus_id))
                .add_transcript(model),
            Err(error) => {
                warn!("Rejecting transcript {}: {}", accession, error);
                rejected.push(RejectedTranscript {
                    accession,
                    locus_id,
                    error,
                });
            }
        }
    }

    Ok(TranscriptData {
        loci: loci.into_values().collect(),
        rejected,
        skipped_lines,
    })
}

/// Parse `start_codon` features of a reference GTF into a lookup index.
pub fn parse_start_codons(path: &Path) -> Result<StartCodonIndex> {
    let reader = open_input(path, "reference GTF")?;
    parse_start_codons_reader(reader)
}

/// Parse reference start codons from a reader.
pub fn parse_start_codons_reader<R: BufRead>(reader: R) -> Result<StartCodonIndex> {
    let mut index = StartCodonIndex::new();
    let mut skipped: AHashMap<String, usize> = AHashMap::new();

    for line_result in reader.lines() {
        let line = line_result.context("Failed to read reference GTF line")?;
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let row = match parse_row(&line) {
            Ok(row) if row.feature == "start_codon" => row,
            Ok(_) => continue,
            Err(reason) => {
                *skipped.entry(reason).or_default() += 1;
                continue;
            }
        };
        let Some(transcript_id) = extract_attribute(row.attributes, "transcript_id") else {
            *skipped.entry("missing transcript_id".to_string()).or_default() += 1;
            continue;
        };
        index.insert(StartCodon {
            chrom: row.chrom.to_string(),
            strand: row.strand,
            start: row.start,
            end: row.end,
            transcript_id,
        });
    }

    for (reason, count) in skipped {
        warn!("Skipped {} reference GTF lines: {}", count, reason);
    }
    Ok(index)
}

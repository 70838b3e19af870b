//! Core data structures for isocds.
//!
//! Transcript structures, classifier ORF candidates and the records produced
//! while mapping, scoring and calling ORFs.

use std::fmt;
use std::str::FromStr;

use crate::error::StructureError;

/// Strand orientation for genomic features.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Strand {
    Positive,
    Negative,
}

/// Error type for parsing strand from string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseStrandError;

impl fmt::Display for ParseStrandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid strand: expected '+' or '-'")
    }
}

impl std::error::Error for ParseStrandError {}

impl FromStr for Strand {
    type Err = ParseStrandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "+" => Ok(Strand::Positive),
            "-" => Ok(Strand::Negative),
            _ => Err(ParseStrandError),
        }
    }
}

impl Strand {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strand::Positive => "+",
            Strand::Negative => "-",
        }
    }
}

impl fmt::Display for Strand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An exon with 1-based inclusive genomic coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Exon {
    pub start: i64,
    pub end: i64,
}

impl Exon {
    pub fn new(start: i64, end: i64) -> Self {
        Exon { start, end }
    }

    /// Get exon length.
    pub fn length(&self) -> i64 {
        self.end - self.start + 1
    }
}

/// A splice junction: last base of the upstream exon and first base of the
/// downstream exon, in genomic order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Junction {
    pub donor: i64,
    pub acceptor: i64,
}

impl Junction {
    /// Whether both junction ends agree within `tolerance` bp.
    pub fn matches(&self, other: &Junction, tolerance: i64) -> bool {
        (self.donor - other.donor).abs() <= tolerance
            && (self.acceptor - other.acceptor).abs() <= tolerance
    }
}

/// Ordered junctions implied by a transcript's exon structure.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct IntronChain(pub Vec<Junction>);

impl IntronChain {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn junctions(&self) -> &[Junction] {
        &self.0
    }
}

/// A transcript model emitted by upstream clustering.
///
/// Exons are stored ascending by start on both strands.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptModel {
    pub chrom: String,
    pub locus_id: String,
    pub accession: String,
    pub strand: Strand,
    pub exons: Vec<Exon>,
}

impl TranscriptModel {
    /// Build a transcript and check its exon structure.
    pub fn new(
        chrom: String,
        locus_id: String,
        accession: String,
        strand: Strand,
        exons: Vec<Exon>,
    ) -> Result<Self, StructureError> {
        let transcript = TranscriptModel {
            chrom,
            locus_id,
            accession,
            strand,
            exons,
        };
        transcript.validate()?;
        Ok(transcript)
    }

    /// Check that exons are non-empty, well-formed, ascending and non-overlapping.
    pub fn validate(&self) -> Result<(), StructureError> {
        if self.exons.is_empty() {
            return Err(StructureError::EmptyExons {
                accession: self.accession.clone(),
            });
        }

        for (index, exon) in self.exons.iter().enumerate() {
            if exon.start < 1 || exon.end < exon.start {
                return Err(StructureError::InvalidExon {
                    accession: self.accession.clone(),
                    start: exon.start,
                    end: exon.end,
                });
            }
            if index > 0 {
                let prev = &self.exons[index - 1];
                if exon.start < prev.start {
                    return Err(StructureError::UnsortedExons {
                        accession: self.accession.clone(),
                        index,
                    });
                }
                if exon.start <= prev.end {
                    return Err(StructureError::OverlappingExons {
                        accession: self.accession.clone(),
                        index,
                    });
                }
            }
        }

        Ok(())
    }

    pub fn start(&self) -> i64 {
        self.exons.first().map_or(0, |e| e.start)
    }

    pub fn end(&self) -> i64 {
        self.exons.last().map_or(0, |e| e.end)
    }

    pub fn exon_count(&self) -> usize {
        self.exons.len()
    }

    pub fn is_single_exon(&self) -> bool {
        self.exons.len() == 1
    }

    /// Total length of the spliced transcript.
    pub fn spliced_length(&self) -> i64 {
        self.exons.iter().map(Exon::length).sum()
    }

    /// Whether genomic ranges intersect (strand and chromosome are not checked).
    pub fn overlaps(&self, other: &TranscriptModel) -> bool {
        self.start() <= other.end() && other.start() <= self.end()
    }

    pub fn intron_chain(&self) -> IntronChain {
        IntronChain(
            self.exons
                .windows(2)
                .map(|pair| Junction {
                    donor: pair[0].end,
                    acceptor: pair[1].start,
                })
                .collect(),
        )
    }
}

/// Transcript models sharing a gene identifier.
#[derive(Debug, Clone)]
pub struct Locus {
    pub locus_id: String,
    pub transcripts: Vec<TranscriptModel>,
}

impl Locus {
    pub fn new(locus_id: String) -> Self {
        Locus {
            locus_id,
            transcripts: Vec::new(),
        }
    }

    pub fn add_transcript(&mut self, transcript: TranscriptModel) {
        self.transcripts.push(transcript);
    }
}

/// A candidate ORF predicted by the coding-potential classifier.
#[derive(Debug, Clone, PartialEq)]
pub struct OrfCandidate {
    /// Full classifier identifier.
    pub id: String,
    pub accession: String,
    /// Classifier-internal rank of the ORF within the transcript.
    pub orf_rank: String,
    pub orf_strand: Strand,
    pub frame: u8,
    /// 1-based inclusive offsets into the spliced transcript.
    pub orf_start: i64,
    pub orf_end: i64,
    pub orf_len: i64,
    pub mrna_len: i64,
    pub fickett: f64,
    pub hexamer: f64,
    pub coding_probability: f64,
    pub has_stop_codon: bool,
}

/// A candidate whose offsets were mapped onto the genome.
#[derive(Debug, Clone, PartialEq)]
pub struct GenomicCds {
    pub candidate: OrfCandidate,
    pub chrom: String,
    pub strand: Strand,
    pub cds_start: i64,
    /// Genomic position of `orf_end`, when it falls inside the transcript.
    pub cds_end: Option<i64>,
    /// Reference transcripts whose start codon matches `cds_start`.
    pub reference_matches: Vec<String>,
}

impl GenomicCds {
    pub fn has_reference_match(&self) -> bool {
        !self.reference_matches.is_empty()
    }
}

/// Number of start codons upstream of an ORF.
///
/// `Unbounded` stands in for a transcript whose sequence is unavailable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum UpstreamAtgs {
    Count(usize),
    Unbounded,
}

impl UpstreamAtgs {
    pub fn as_f64(&self) -> f64 {
        match self {
            UpstreamAtgs::Count(n) => *n as f64,
            UpstreamAtgs::Unbounded => f64::INFINITY,
        }
    }
}

impl fmt::Display for UpstreamAtgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpstreamAtgs::Count(n) => write!(f, "{}", n),
            UpstreamAtgs::Unbounded => write!(f, "inf"),
        }
    }
}

/// A mapped candidate with its ATG-derived scores.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredOrf {
    pub cds: GenomicCds,
    pub upstream_atgs: UpstreamAtgs,
    pub atg_score: f64,
    pub composite_score: f64,
}

impl ScoredOrf {
    pub fn accession(&self) -> &str {
        &self.cds.candidate.accession
    }

    pub fn coding_probability(&self) -> f64 {
        self.cds.candidate.coding_probability
    }
}

/// Confidence attached to a called ORF.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Confidence {
    ClearBest,
    Plausible,
    LowQuality,
}

impl Confidence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Confidence::ClearBest => "Clear Best ORF",
            Confidence::Plausible => "Plausible ORF",
            Confidence::LowQuality => "Low Quality ORF",
        }
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The single ORF called for an accession.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectedOrf {
    pub orf: ScoredOrf,
    pub confidence: Confidence,
}

/// Granularity used when splitting work into partitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Granularity {
    /// One partition holding everything.
    Whole,
    /// One partition per chromosome (and strand while mapping).
    Chromosome,
}

/// Error type for parsing granularity from string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseGranularityError;

impl fmt::Display for ParseGranularityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid granularity: expected 'whole' or 'chromosome'")
    }
}

impl std::error::Error for ParseGranularityError {}

impl FromStr for Granularity {
    type Err = ParseGranularityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "whole" => Ok(Granularity::Whole),
            "chromosome" | "chrom" => Ok(Granularity::Chromosome),
            _ => Err(ParseGranularityError),
        }
    }
}

/// Sort key placing `PB.<gene>.<isoform>` accessions in numeric order.
///
/// Accessions that do not follow the pattern sort after, by name.
pub fn accession_sort_key(accession: &str) -> (u8, u64, u64, String) {
    let mut parts = accession.split('.');
    if let (Some("PB"), Some(gene), Some(isoform), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    {
        if let (Ok(g), Ok(i)) = (gene.parse::<u64>(), isoform.parse::<u64>()) {
            return (0, g, i, String::new());
        }
    }
    (1, 0, 0, accession.to_string())
}

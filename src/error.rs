//! Domain errors.
//!
//! I/O and parsing use `anyhow` with context; these enums cover the
//! recoverable structural and mapping failures that callers inspect.

use thiserror::Error;

/// Malformed transcript structure, rejected before comparison.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StructureError {
    #[error("transcript {accession} has no exons")]
    EmptyExons { accession: String },
    #[error("transcript {accession} has an invalid exon {start}-{end}")]
    InvalidExon {
        accession: String,
        start: i64,
        end: i64,
    },
    #[error("transcript {accession} has exons out of ascending order at exon {index}")]
    UnsortedExons { accession: String, index: usize },
    #[error("transcript {accession} has overlapping exons at exon {index}")]
    OverlappingExons { accession: String, index: usize },
    #[error("transcript {accession} has exons on both strands")]
    MixedStrand { accession: String },
    #[error("transcript {accession} has exons on more than one chromosome")]
    MixedChromosome { accession: String },
}

/// A candidate ORF that could not be placed on the genome.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MappingError {
    #[error("offset {offset} lies outside the spliced length {spliced_length} of {accession}")]
    OffsetOutOfRange {
        accession: String,
        offset: i64,
        spliced_length: i64,
    },
    #[error("no transcript model for {accession}")]
    MissingTranscript { accession: String },
}

/// A violation of the partitioning contract.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PartitionError {
    #[error("accession {accession} appears in partitions {first} and {second}")]
    SplitAccession {
        accession: String,
        first: String,
        second: String,
    },
}

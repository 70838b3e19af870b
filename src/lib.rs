//! isocds - Long-read isoform collapsing and ORF calling library.
//!
//! This library reduces redundant transcript models produced by long-read
//! sequencing to a non-redundant set, then places classifier-predicted ORFs
//! on the genome and calls one ORF per transcript.
//!
//! # Features
//!
//! - Parse transcript GTF, CPAT ORF tables and FASTA (with gzip support)
//! - Collapse models whose intron chain is contained in another's, with a
//!   fuzzy junction tolerance
//! - Map transcript offsets to genomic coordinates on either strand
//! - Match CDS starts against reference start codons
//! - Score candidates by coding probability and upstream start codons
//! - Run partitions in parallel with output independent of partitioning
//!
//! # Example
//!
//! ```ignore
//! use isocds::config::Config;
//! use isocds::orf::TranscriptIndex;
//! use isocds::parser::{parse_orf_table, parse_start_codons, parse_transcripts};
//! use isocds::pipeline::{call_orfs, CallInputs};
//! use std::path::Path;
//!
//! let config = Config::default();
//! let transcripts = TranscriptIndex::new(parse_transcripts(Path::new("collapsed.gtf"))?.into_transcripts());
//! let start_codons = parse_start_codons(Path::new("gencode.gtf"))?;
//! let outcome = call_orfs(
//!     CallInputs {
//!         candidates: parse_orf_table(Path::new("cpat.ORF_prob.tsv"))?,
//!         transcripts: &transcripts,
//!         start_codons: &start_codons,
//!         sequences: None,
//!     },
//!     &config,
//! )?;
//! ```

pub mod collapse;
pub mod config;
pub mod error;
pub mod orf;
pub mod output;
pub mod parser;
pub mod partition;
pub mod pipeline;
pub mod types;

pub use config::Config;
pub use error::{MappingError, PartitionError, StructureError};
pub use parser::{SequenceIndex, TranscriptData};
pub use types::{
    Confidence, Exon, Granularity, Locus, OrfCandidate, ScoredOrf, SelectedOrf, Strand, TranscriptModel,
};

//! Transcript-offset to genomic-coordinate mapping.
//!
//! Offsets are 1-based positions in the spliced transcript, counted from its
//! 5' end. On the minus strand the 5' end is the highest genomic coordinate,
//! so exons are walked in descending order and positions run backwards
//! within each exon.

use ahash::AHashMap;

use crate::error::MappingError;
use crate::types::{Exon, GenomicCds, OrfCandidate, Strand, TranscriptModel};

/// Exons in transcription order.
fn transcription_order(exons: &[Exon], strand: Strand) -> Box<dyn Iterator<Item = &Exon> + '_> {
    match strand {
        Strand::Positive => Box::new(exons.iter()),
        Strand::Negative => Box::new(exons.iter().rev()),
    }
}

/// Map a spliced-transcript offset to a genomic coordinate.
///
/// Returns `None` when the offset falls outside the spliced length.
pub fn offset_to_genomic(offset: i64, strand: Strand, exons: &[Exon]) -> Option<i64> {
    let mut cumulative = 0;
    for exon in transcription_order(exons, strand) {
        let prior = cumulative;
        cumulative += exon.length();
        if prior < offset && offset <= cumulative {
            let coord = match strand {
                Strand::Positive => exon.start + (offset - prior) - 1,
                Strand::Negative => exon.end - (offset - prior) + 1,
            };
            return Some(coord);
        }
    }
    None
}

/// Inverse of [`offset_to_genomic`]; `None` when `coord` is intronic or
/// outside the transcript.
pub fn genomic_to_offset(coord: i64, strand: Strand, exons: &[Exon]) -> Option<i64> {
    let mut cumulative = 0;
    for exon in transcription_order(exons, strand) {
        if exon.start <= coord && coord <= exon.end {
            let within = match strand {
                Strand::Positive => coord - exon.start + 1,
                Strand::Negative => exon.end - coord + 1,
            };
            return Some(cumulative + within);
        }
        cumulative += exon.length();
    }
    None
}

/// Map a candidate ORF onto its transcript's genomic structure.
///
/// The CDS start must map; a CDS end outside the transcript is kept as `None`.
pub fn map_candidate(
    candidate: &OrfCandidate,
    transcript: &TranscriptModel,
) -> Result<GenomicCds, MappingError> {
    let cds_start =
        offset_to_genomic(candidate.orf_start, transcript.strand, &transcript.exons).ok_or_else(
            || MappingError::OffsetOutOfRange {
                accession: candidate.accession.clone(),
                offset: candidate.orf_start,
                spliced_length: transcript.spliced_length(),
            },
        )?;
    let cds_end = offset_to_genomic(candidate.orf_end, transcript.strand, &transcript.exons);

    Ok(GenomicCds {
        candidate: candidate.clone(),
        chrom: transcript.chrom.clone(),
        strand: transcript.strand,
        cds_start,
        cds_end,
        reference_matches: Vec::new(),
    })
}

/// Immutable accession lookup over the canonical transcript set.
#[derive(Debug, Clone, Default)]
pub struct TranscriptIndex {
    by_accession: AHashMap<String, TranscriptModel>,
}

impl TranscriptIndex {
    /// Build the index; the first model seen for an accession wins.
    pub fn new(transcripts: impl IntoIterator<Item = TranscriptModel>) -> Self {
        let mut by_accession = AHashMap::new();
        for transcript in transcripts {
            by_accession
                .entry(transcript.accession.clone())
                .or_insert(transcript);
        }
        TranscriptIndex { by_accession }
    }

    pub fn get(&self, accession: &str) -> Option<&TranscriptModel> {
        self.by_accession.get(accession)
    }

    /// Like [`get`](Self::get), failing with [`MappingError::MissingTranscript`].
    pub fn lookup(&self, accession: &str) -> Result<&TranscriptModel, MappingError> {
        self.get(accession).ok_or_else(|| MappingError::MissingTranscript {
            accession: accession.to_string(),
        })
    }

    pub fn len(&self) -> usize {
        self.by_accession.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_accession.is_empty()
    }
}

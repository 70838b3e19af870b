//! Stage drivers for collapsing and ORF calling.
//!
//! `call_orfs` maps candidates per chromosome and strand, then selects per
//! chromosome. Both phases run through [`run_partitions`]; merged outputs are
//! sorted by accession so they do not depend on partitioning.

use std::fmt;

use ahash::AHashSet;
use anyhow::Result;
use log::{debug, info, warn};

use crate::collapse::{collapse_loci, Dropout};
use crate::config::Config;
use crate::orf::{map_candidate, score_cds, select_orfs, StartCodonIndex, TranscriptIndex};
use crate::parser::gtf::{RejectedTranscript, TranscriptData};
use crate::parser::SequenceIndex;
use crate::partition::{ensure_unsplit, partition_by, run_partitions, PartitionKey};
use crate::types::{accession_sort_key, OrfCandidate, ScoredOrf, SelectedOrf, TranscriptModel};

/// Result of collapsing all loci.
#[derive(Debug, Clone, Default)]
pub struct CollapseOutcome {
    pub kept: Vec<TranscriptModel>,
    pub dropped: Vec<Dropout>,
    pub rejected: Vec<RejectedTranscript>,
    /// Loci that lost every model.
    pub anomalous_loci: Vec<String>,
}

impl CollapseOutcome {
    /// Accessions of retained models.
    pub fn survivors(&self) -> AHashSet<String> {
        self.kept.iter().map(|t| t.accession.clone()).collect()
    }
}

/// Collapse every parsed locus.
///
/// A locus whose every model was rejected while parsing is reported as
/// anomalous along with loci that lost every model during collapsing.
pub fn collapse_transcripts(data: TranscriptData, tolerance: i64) -> CollapseOutcome {
    let parsed: AHashSet<&str> = data.loci.iter().map(|l| l.locus_id.as_str()).collect();
    let mut seen = AHashSet::new();
    let unparsed: Vec<String> = data
        .rejected
        .iter()
        .map(|r| r.locus_id.as_str())
        .filter(|id| !parsed.contains(id) && seen.insert(*id))
        .map(str::to_string)
        .collect();

    let mut outcome = CollapseOutcome {
        rejected: data.rejected,
        ..Default::default()
    };
    for result in collapse_loci(data.loci, tolerance) {
        if result.is_anomalous() {
            outcome.anomalous_loci.push(result.locus_id.clone());
        }
        outcome.kept.extend(result.kept);
        outcome.dropped.extend(result.dropped);
    }
    outcome.anomalous_loci.extend(unparsed);
    info!(
        "Collapsed to {} models; {} redundant, {} malformed",
        outcome.kept.len(),
        outcome.dropped.len(),
        outcome.rejected.len()
    );
    outcome
}

/// Why an accession has no called ORF.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrfDropReason {
    NoTranscriptModel,
    NoMappableCandidate,
}

impl fmt::Display for OrfDropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrfDropReason::NoTranscriptModel => write!(f, "no_transcript_model"),
            OrfDropReason::NoMappableCandidate => write!(f, "no_mappable_orf"),
        }
    }
}

/// An accession with candidates but no selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrfDropout {
    pub accession: String,
    pub reason: OrfDropReason,
}

/// Inputs to ORF calling. Lookup tables are shared read-only by every task.
pub struct CallInputs<'a> {
    pub candidates: Vec<OrfCandidate>,
    pub transcripts: &'a TranscriptIndex,
    pub start_codons: &'a StartCodonIndex,
    pub sequences: Option<&'a SequenceIndex>,
}

#[derive(Debug, Clone, Default)]
pub struct CallOutcome {
    /// Every mapped and scored candidate.
    pub mapped: Vec<ScoredOrf>,
    /// One ORF per accession.
    pub selected: Vec<SelectedOrf>,
    pub dropouts: Vec<OrfDropout>,
}

fn candidate_order(orf: &ScoredOrf) -> (i64, i64, String) {
    let c = &orf.cds.candidate;
    (c.orf_start, c.orf_end, c.id.clone())
}

/// Map, score and select ORFs for every accession.
pub fn call_orfs(inputs: CallInputs<'_>, config: &Config) -> Result<CallOutcome> {
    let CallInputs {
        candidates,
        transcripts,
        start_codons,
        sequences,
    } = inputs;

    let mut dropouts = Vec::new();
    let mut missing: AHashSet<String> = AHashSet::new();
    let mut expected: AHashSet<String> = AHashSet::new();
    let mut placed = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        match transcripts.lookup(&candidate.accession) {
            Ok(transcript) => {
                expected.insert(candidate.accession.clone());
                placed.push((candidate, transcript));
            }
            Err(e) => {
                if missing.insert(candidate.accession.clone()) {
                    warn!("Dropping ORFs of {}: {}", candidate.accession, e);
                    dropouts.push(OrfDropout {
                        accession: candidate.accession,
                        reason: OrfDropReason::NoTranscriptModel,
                    });
                }
            }
        }
    }

    let mapping_parts = partition_by(placed, |(_, t)| {
        PartitionKey::for_mapping(config.granularity, &t.chrom, t.strand)
    });
    ensure_unsplit(&mapping_parts, |(c, _)| c.accession.as_str())?;
    info!(
        "Mapping {} accessions across {} partitions",
        expected.len(),
        mapping_parts.len()
    );

    let mut mapped = run_partitions(mapping_parts, |key, items| {
        debug!("Partition {}: mapping {} candidates", key, items.len());
        let mut scored = Vec::with_capacity(items.len());
        for (candidate, transcript) in items {
            let mut cds = match map_candidate(&candidate, transcript) {
                Ok(cds) => cds,
                Err(e) => {
                    warn!("Excluding {}: {}", candidate.id, e);
                    continue;
                }
            };
            cds.reference_matches = start_codons
                .matches(&cds.chrom, cds.strand, cds.cds_start)
                .to_vec();
            let sequence = sequences.and_then(|s| s.get(&cds.candidate.accession));
            scored.push(score_cds(cds, sequence, config));
        }
        Ok(scored)
    })?;
    mapped.sort_by_cached_key(|o| (accession_sort_key(o.accession()), candidate_order(o)));

    let mapped_accessions: AHashSet<&str> = mapped.iter().map(|o| o.accession()).collect();
    for accession in &expected {
        if !mapped_accessions.contains(accession.as_str()) {
            warn!("No candidate of {} could be mapped", accession);
            dropouts.push(OrfDropout {
                accession: accession.clone(),
                reason: OrfDropReason::NoMappableCandidate,
            });
        }
    }
    dropouts.sort_by_cached_key(|d| accession_sort_key(&d.accession));

    let selection_parts = partition_by(mapped.clone(), |o| {
        PartitionKey::for_selection(config.granularity, &o.cds.chrom)
    });
    ensure_unsplit(&selection_parts, |o| o.accession())?;
    let threshold = config.low_quality_threshold;
    let mut selected = run_partitions(selection_parts, |key, orfs| {
        debug!("Partition {}: selecting among {} ORFs", key, orfs.len());
        Ok(select_orfs(orfs, threshold))
    })?;
    selected.sort_by_cached_key(|s| accession_sort_key(s.orf.accession()));

    info!(
        "Called {} ORFs from {} mapped candidates; {} accessions dropped",
        selected.len(),
        mapped.len(),
        dropouts.len()
    );
    Ok(CallOutcome {
        mapped,
        selected,
        dropouts,
    })
}

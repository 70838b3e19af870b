//! Removal of redundant transcript models within a locus.

use std::collections::VecDeque;

use log::{error, warn};
use rayon::prelude::*;

use crate::collapse::compare::{classify, Relation};
use crate::error::StructureError;
use crate::types::{Locus, TranscriptModel};

/// Why a transcript left the canonical set.
#[derive(Debug, Clone, PartialEq)]
pub enum DropReason {
    /// Structurally contained in (or identical to) a retained model.
    Redundant { kept_by: String, relation: Relation },
    /// Rejected before comparison.
    Malformed(StructureError),
}

impl DropReason {
    pub fn describe(&self) -> String {
        match self {
            DropReason::Redundant {
                kept_by,
                relation: Relation::Identical,
            } => format!("identical_to:{}", kept_by),
            DropReason::Redundant { kept_by, .. } => format!("contained_in:{}", kept_by),
            DropReason::Malformed(e) => format!("malformed:{}", e),
        }
    }
}

/// A transcript removed during collapsing.
#[derive(Debug, Clone)]
pub struct Dropout {
    pub transcript: TranscriptModel,
    pub reason: DropReason,
}

/// Outcome of collapsing one locus.
#[derive(Debug, Clone)]
pub struct CollapseResult {
    pub locus_id: String,
    pub kept: Vec<TranscriptModel>,
    pub dropped: Vec<Dropout>,
}

impl CollapseResult {
    /// A locus that had input but kept nothing.
    pub fn is_anomalous(&self) -> bool {
        self.kept.is_empty() && !self.dropped.is_empty()
    }
}

/// Collapse a locus into a set in which no retained model contains another.
///
/// Malformed models are rejected first. The rest are sorted by
/// `(start, end, accession)` and every overlapping pair is placed on a
/// worklist once. A pair is classified only while both members are alive;
/// containment removes the contained member and identity removes the later
/// one. Membership only shrinks and a pair's relation does not depend on other
/// models, so draining the worklist once reaches the fixed point in at most
/// one classification per overlapping pair.
pub fn collapse_locus(locus: Locus, tolerance: i64) -> CollapseResult {
    let mut dropped = Vec::new();
    let mut models = Vec::with_capacity(locus.transcripts.len());

    for transcript in locus.transcripts {
        match transcript.validate() {
            Ok(()) => models.push(transcript),
            Err(e) => {
                warn!("Rejecting {}: {}", transcript.accession, e);
                dropped.push(Dropout {
                    transcript,
                    reason: DropReason::Malformed(e),
                });
            }
        }
    }

    models.sort_by(|a, b| {
        a.start()
            .cmp(&b.start())
            .then(a.end().cmp(&b.end()))
            .then(a.accession.cmp(&b.accession))
    });

    let mut worklist = overlapping_pairs(&models);
    let mut alive = vec![true; models.len()];
    let mut absorbed_by: Vec<Option<(usize, Relation)>> = vec![None; models.len()];

    while let Some((i, j)) = worklist.pop_front() {
        if !alive[i] || !alive[j] {
            continue;
        }
        match classify(&models[i], &models[j], tolerance) {
            rel @ (Relation::AContainsB | Relation::Identical) => {
                alive[j] = false;
                absorbed_by[j] = Some((i, rel));
            }
            Relation::BContainsA => {
                alive[i] = false;
                absorbed_by[i] = Some((j, Relation::BContainsA));
            }
            Relation::Unrelated => {}
        }
    }

    let survivor_of = |mut idx: usize| {
        while let Some((by, _)) = absorbed_by[idx] {
            idx = by;
        }
        idx
    };

    let mut kept = Vec::new();
    let mut redundant = Vec::new();
    for (idx, model) in models.iter().enumerate() {
        if alive[idx] {
            kept.push(model.clone());
        } else if let Some((_, relation)) = absorbed_by[idx] {
            redundant.push(Dropout {
                transcript: model.clone(),
                reason: DropReason::Redundant {
                    kept_by: models[survivor_of(idx)].accession.clone(),
                    relation,
                },
            });
        }
    }
    dropped.extend(redundant);

    let result = CollapseResult {
        locus_id: locus.locus_id,
        kept,
        dropped,
    };
    if result.is_anomalous() {
        error!("Locus {} has no surviving transcripts", result.locus_id);
    }
    result
}

/// Overlapping index pairs `(i, j)`, `i < j`, over models sorted by start.
fn overlapping_pairs(models: &[TranscriptModel]) -> VecDeque<(usize, usize)> {
    let mut pairs = VecDeque::new();
    for i in 0..models.len() {
        for j in (i + 1)..models.len() {
            if models[j].start() > models[i].end() {
                break;
            }
            pairs.push_back((i, j));
        }
    }
    pairs
}

/// Collapse every locus independently on the current rayon pool.
///
/// Results come back in the order of `loci`.
pub fn collapse_loci(loci: Vec<Locus>, tolerance: i64) -> Vec<CollapseResult> {
    loci.into_par_iter()
        .map(|locus| collapse_locus(locus, tolerance))
        .collect()
}

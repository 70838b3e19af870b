//! Selection of one ORF per accession.
//!
//! Candidates whose CDS start matches a reference start codon win outright,
//! preferring the fewest upstream start codons. Without reference support the
//! highest composite score wins. Remaining ties go to the first candidate in
//! canonical order `(orf_start, orf_end, id)`, which keeps the choice
//! independent of input order.

use std::cmp::Ordering;

use indexmap::IndexMap;

use crate::types::{accession_sort_key, Confidence, ScoredOrf, SelectedOrf};

fn canonical_cmp(a: &ScoredOrf, b: &ScoredOrf) -> Ordering {
    let (ca, cb) = (&a.cds.candidate, &b.cds.candidate);
    ca.orf_start
        .cmp(&cb.orf_start)
        .then(ca.orf_end.cmp(&cb.orf_end))
        .then_with(|| ca.id.cmp(&cb.id))
}

/// Select the best ORF among one accession's mapped candidates.
///
/// Returns `None` for an empty candidate set.
pub fn select_orf(candidates: &[ScoredOrf], low_quality_threshold: f64) -> Option<SelectedOrf> {
    let with_reference = candidates.iter().filter(|c| c.cds.has_reference_match());

    let best = with_reference
        .min_by(|a, b| {
            a.upstream_atgs
                .cmp(&b.upstream_atgs)
                .then_with(|| canonical_cmp(a, b))
        })
        .or_else(|| {
            candidates.iter().min_by(|a, b| {
                b.composite_score
                    .total_cmp(&a.composite_score)
                    .then_with(|| canonical_cmp(a, b))
            })
        })?;

    let confidence = calling_confidence(best, candidates, low_quality_threshold);
    Some(SelectedOrf {
        orf: best.clone(),
        confidence,
    })
}

/// Label a selection against the accession's full candidate set.
///
/// "Clear Best" requires being the unique minimum by upstream count and the
/// unique maximum by coding probability.
fn calling_confidence(selected: &ScoredOrf, candidates: &[ScoredOrf], threshold: f64) -> Confidence {
    let beaten_or_tied_on_atgs = candidates
        .iter()
        .filter(|c| c.upstream_atgs <= selected.upstream_atgs)
        .count();
    let beaten_or_tied_on_score = candidates
        .iter()
        .filter(|c| c.coding_probability().total_cmp(&selected.coding_probability()) != Ordering::Less)
        .count();

    if beaten_or_tied_on_atgs == 1 && beaten_or_tied_on_score == 1 {
        Confidence::ClearBest
    } else if selected.coding_probability() <= threshold {
        Confidence::LowQuality
    } else {
        Confidence::Plausible
    }
}

/// Group scored candidates by accession and select one ORF for each.
///
/// Output is ordered by accession (`PB.<gene>.<isoform>` numerically).
pub fn select_orfs(scored: Vec<ScoredOrf>, low_quality_threshold: f64) -> Vec<SelectedOrf> {
    let mut by_accession: IndexMap<String, Vec<ScoredOrf>> = IndexMap::new();
    for orf in scored {
        by_accession
            .entry(orf.accession().to_string())
            .or_default()
            .push(orf);
    }

    let mut selected: Vec<SelectedOrf> = by_accession
        .values()
        .filter_map(|candidates| select_orf(candidates, low_quality_threshold))
        .collect();
    selected.sort_by_cached_key(|s| accession_sort_key(s.orf.accession()));
    selected
}

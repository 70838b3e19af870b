//! Structural comparison of two transcript models.
//!
//! Long reads are frequently truncated at the 5' end, so containment is
//! anchored at the 3' end: a shorter model is redundant when its junctions
//! match the 3'-most junctions of a longer model.

use crate::types::{Strand, TranscriptModel};

/// Structural relationship between two transcript models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Relation {
    Identical,
    AContainsB,
    BContainsA,
    Unrelated,
}

/// Classify how `a` and `b` relate under a fuzzy junction tolerance.
///
/// Only models on the same chromosome and strand with overlapping genomic
/// ranges can be anything but `Unrelated`.
pub fn classify(a: &TranscriptModel, b: &TranscriptModel, tolerance: i64) -> Relation {
    if a.chrom != b.chrom || a.strand != b.strand || !a.overlaps(b) {
        return Relation::Unrelated;
    }

    if a.is_single_exon() && b.is_single_exon() {
        return classify_single_exon(a, b, tolerance);
    }

    if a.exon_count() == b.exon_count() {
        if chains_match(a, b, 0, tolerance) {
            return Relation::Identical;
        }
        return Relation::Unrelated;
    }

    if a.exon_count() > b.exon_count() {
        if contains(a, b, tolerance) {
            return Relation::AContainsB;
        }
    } else if contains(b, a, tolerance) {
        return Relation::BContainsA;
    }

    Relation::Unrelated
}

/// Endpoint compared for single-exon models: the exon's genomic end on both
/// strands (the 3' end on `+`, the 5' end on `-`).
fn single_exon_anchor(t: &TranscriptModel) -> i64 {
    t.end()
}

fn classify_single_exon(a: &TranscriptModel, b: &TranscriptModel, tolerance: i64) -> Relation {
    if (single_exon_anchor(a) - single_exon_anchor(b)).abs() > tolerance {
        return Relation::Unrelated;
    }
    let diff = a.start() - b.start();
    if diff.abs() <= tolerance {
        Relation::Identical
    } else if diff < 0 {
        Relation::AContainsB
    } else {
        Relation::BContainsA
    }
}

/// Whether the chain of `short` equals `long`'s chain starting at junction
/// `offset`, each junction end within `tolerance`.
fn chains_match(long: &TranscriptModel, short: &TranscriptModel, offset: usize, tolerance: i64) -> bool {
    let long_chain = long.intron_chain();
    let short_chain = short.intron_chain();
    if offset + short_chain.len() > long_chain.len() {
        return false;
    }
    short_chain
        .junctions()
        .iter()
        .zip(&long_chain.junctions()[offset..])
        .all(|(s, l)| s.matches(l, tolerance))
}

/// Whether `long` (more exons) structurally contains `short`.
fn contains(long: &TranscriptModel, short: &TranscriptModel, tolerance: i64) -> bool {
    let n_long = long.exon_count();
    let n_short = short.exon_count();

    if n_short == 1 {
        // must sit in the 3'-terminal exon
        return match long.strand {
            Strand::Positive => short.start() >= long.exons[n_long - 1].start - tolerance,
            Strand::Negative => short.end() <= long.exons[0].end + tolerance,
        };
    }

    match long.strand {
        Strand::Positive => {
            let offset = n_long - n_short;
            let boundary = &long.exons[offset];
            chains_match(long, short, offset, tolerance)
                && boundary.start - tolerance <= short.start()
                && short.start() < boundary.end
        }
        Strand::Negative => {
            let boundary = &long.exons[n_short - 1];
            chains_match(long, short, 0, tolerance)
                && boundary.start < short.end()
                && short.end() <= boundary.end + tolerance
        }
    }
}

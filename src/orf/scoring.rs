//! Upstream start-codon counting and composite ORF scores.

use log::warn;

use crate::config::Config;
use crate::types::{GenomicCds, ScoredOrf, UpstreamAtgs};

/// Count non-overlapping, case-insensitive occurrences of `codon` in the
/// first `orf_start - 1` bases of `sequence`.
pub fn count_upstream_codons(sequence: &[u8], orf_start: i64, codon: &[u8]) -> usize {
    if codon.is_empty() || orf_start <= 1 {
        return 0;
    }
    let limit = ((orf_start - 1) as usize).min(sequence.len());
    let upstream = &sequence[..limit];

    let mut count = 0;
    let mut i = 0;
    while i + codon.len() <= upstream.len() {
        if upstream[i..i + codon.len()].eq_ignore_ascii_case(codon) {
            count += 1;
            i += codon.len();
        } else {
            i += 1;
        }
    }
    count
}

/// Logistic penalty on the number of upstream start codons.
///
/// `1 - 1 / (1 + exp(-growth * (count - shift)))`; an unbounded count scores 0.
pub fn atg_score(upstream: UpstreamAtgs, shift: f64, growth: f64) -> f64 {
    match upstream {
        UpstreamAtgs::Count(n) => 1.0 - 1.0 / (1.0 + (-growth * (n as f64 - shift)).exp()),
        UpstreamAtgs::Unbounded => 0.0,
    }
}

/// Score a mapped candidate.
///
/// Without a transcript sequence the upstream count is unbounded: the ATG
/// score and composite score drop to zero, but the candidate stays eligible.
pub fn score_cds(cds: GenomicCds, sequence: Option<&[u8]>, config: &Config) -> ScoredOrf {
    let upstream_atgs = match sequence {
        Some(seq) => UpstreamAtgs::Count(count_upstream_codons(
            seq,
            cds.candidate.orf_start,
            config.start_codon.as_bytes(),
        )),
        None => {
            warn!(
                "No sequence for {}; upstream {} count is unbounded for {}",
                cds.candidate.accession, config.start_codon, cds.candidate.id
            );
            UpstreamAtgs::Unbounded
        }
    };
    let atg_score = atg_score(upstream_atgs, config.atg_shift, config.atg_growth);
    let composite_score = cds.candidate.coding_probability * atg_score;

    ScoredOrf {
        cds,
        upstream_atgs,
        atg_score,
        composite_score,
    }
}

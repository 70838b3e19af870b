//! Cross-module tests for collapsing, mapping, selection and partitioning.
//!
//! These tests exercise properties that hold across the library rather than
//! the behavior of a single function.

use std::io::BufReader;

use isocds::collapse::{classify, collapse_locus, Relation};
use isocds::config::Config;
use isocds::orf::{genomic_to_offset, map_candidate, offset_to_genomic, score_cds, select_orf, TranscriptIndex};
use isocds::orf::{StartCodon, StartCodonIndex};
use isocds::parser::gtf::parse_transcripts_reader;
use isocds::parser::orf::parse_orf_table_reader;
use isocds::pipeline::{call_orfs, CallInputs};
use isocds::types::{
    Confidence, Exon, GenomicCds, Granularity, Locus, OrfCandidate, ScoredOrf, Strand, TranscriptModel,
    UpstreamAtgs,
};

// -------------------------------------------------------------------------
// Helper functions
// -------------------------------------------------------------------------

fn model(accession: &str, strand: Strand, exons: &[(i64, i64)]) -> TranscriptModel {
    TranscriptModel {
        chrom: "chr1".to_string(),
        locus_id: "PB.1".to_string(),
        accession: accession.to_string(),
        strand,
        exons: exons.iter().map(|&(s, e)| Exon::new(s, e)).collect(),
    }
}

fn candidate(accession: &str, rank: u32, orf_start: i64, orf_end: i64, coding: f64) -> OrfCandidate {
    OrfCandidate {
        id: format!("{}_ORF_{}", accession, rank),
        accession: accession.to_string(),
        orf_rank: rank.to_string(),
        orf_strand: Strand::Positive,
        frame: 1,
        orf_start,
        orf_end,
        orf_len: orf_end - orf_start + 1,
        mrna_len: 1000,
        fickett: 1.0,
        hexamer: 0.2,
        coding_probability: coding,
        has_stop_codon: true,
    }
}

/// Deterministic generator for structural fixtures.
struct Lcg(u64);

impl Lcg {
    fn next(&mut self, bound: i64) -> i64 {
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        ((self.0 >> 33) % bound as u64) as i64
    }
}

/// A locus of models sharing a junction backbone, with random 5'
/// truncations, junction jitter and exon skips.
fn random_locus(seed: u64, strand: Strand, n: usize) -> Locus {
    let backbone: Vec<(i64, i64)> = (0..6).map(|i| (1000 + i * 1000, 1200 + i * 1000)).collect();
    let mut rng = Lcg(seed);
    let mut locus = Locus::new("PB.1".to_string());

    for idx in 0..n {
        let keep = 2 + rng.next(5) as usize;
        let mut exons: Vec<(i64, i64)> = match strand {
            Strand::Positive => backbone[backbone.len() - keep..].to_vec(),
            Strand::Negative => backbone[..keep].to_vec(),
        };
        if rng.next(4) == 0 && exons.len() > 2 {
            exons.remove(1);
        }
        let jitter = rng.next(3) - 1;
        exons[1].0 += jitter;
        // 5' truncation within the first exon in transcription order
        match strand {
            Strand::Positive => exons[0].0 += rng.next(150),
            Strand::Negative => {
                let last = exons.len() - 1;
                exons[last].1 -= rng.next(150);
            }
        }
        locus.add_transcript(model(&format!("PB.1.{}", idx + 1), strand, &exons));
    }
    locus
}

// -------------------------------------------------------------------------
// 1. Structural Comparison Properties
// -------------------------------------------------------------------------

mod test_collapse_properties {
    use super::*;

    #[test]
    fn test_identical_at_zero_tolerance_implies_equal_chains() {
        for seed in 1..20 {
            let locus = random_locus(seed, Strand::Positive, 12);
            for a in &locus.transcripts {
                for b in &locus.transcripts {
                    if classify(a, b, 0) == Relation::Identical && a.exon_count() > 1 {
                        assert_eq!(a.intron_chain(), b.intron_chain());
                    }
                }
            }
        }
    }

    #[test]
    fn test_classify_is_antisymmetric() {
        let locus = random_locus(7, Strand::Negative, 15);
        for a in &locus.transcripts {
            for b in &locus.transcripts {
                let expected = match classify(a, b, 2) {
                    Relation::AContainsB => Relation::BContainsA,
                    Relation::BContainsA => Relation::AContainsB,
                    other => other,
                };
                assert_eq!(classify(b, a, 2), expected);
            }
        }
    }

    #[test]
    fn test_retained_models_are_unrelated() {
        for seed in 1..25 {
            for strand in [Strand::Positive, Strand::Negative] {
                for tolerance in [0, 1, 5] {
                    let result = collapse_locus(random_locus(seed, strand, 14), tolerance);
                    assert!(!result.kept.is_empty());
                    assert_eq!(result.kept.len() + result.dropped.len(), 14);
                    for (i, a) in result.kept.iter().enumerate() {
                        for b in &result.kept[i + 1..] {
                            assert_eq!(
                                classify(a, b, tolerance),
                                Relation::Unrelated,
                                "{} vs {} (seed {}, tol {})",
                                a.accession,
                                b.accession,
                                seed,
                                tolerance
                            );
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_collapse_ignores_input_order() {
        let locus = random_locus(11, Strand::Positive, 16);
        let mut reversed = locus.clone();
        reversed.transcripts.reverse();

        let kept = |l: Locus| {
            let mut accs: Vec<String> = collapse_locus(l, 1).kept.into_iter().map(|t| t.accession).collect();
            accs.sort();
            accs
        };
        assert_eq!(kept(locus), kept(reversed));
    }

    #[test]
    fn test_single_exon_end_tolerance() {
        let a = model("PB.1.1", Strand::Positive, &[(500, 1000)]);
        let b = model("PB.1.2", Strand::Positive, &[(500, 1002)]);
        assert_eq!(classify(&a, &b, 2), Relation::Identical);
        assert_eq!(classify(&a, &b, 0), Relation::Unrelated);
    }
}

// -------------------------------------------------------------------------
// 2. Coordinate Mapping Tests
// -------------------------------------------------------------------------

mod test_mapping {
    use super::*;

    #[test]
    fn test_offset_in_second_exon() {
        let transcript = model("PB.1.1", Strand::Positive, &[(100, 149), (200, 249)]);
        let cds = map_candidate(&candidate("PB.1.1", 1, 60, 90, 0.9), &transcript).unwrap();
        assert_eq!(cds.cds_start, 209);
        assert_eq!(cds.cds_end, Some(239));
    }

    #[test]
    fn test_round_trip_every_offset() {
        for strand in [Strand::Positive, Strand::Negative] {
            let transcript = model("PB.1.1", strand, &[(100, 149), (200, 210), (400, 499)]);
            let total = transcript.spliced_length();
            assert_eq!(total, 161);
            for offset in 1..=total {
                let coord = offset_to_genomic(offset, strand, &transcript.exons).unwrap();
                assert_eq!(genomic_to_offset(coord, strand, &transcript.exons), Some(offset));
            }
            assert!(offset_to_genomic(total + 1, strand, &transcript.exons).is_none());
        }
    }

    #[test]
    fn test_unmappable_start_is_an_error() {
        let transcript = model("PB.1.1", Strand::Negative, &[(100, 149)]);
        assert!(map_candidate(&candidate("PB.1.1", 1, 51, 60, 0.9), &transcript).is_err());
        let edge = map_candidate(&candidate("PB.1.1", 1, 50, 60, 0.9), &transcript).unwrap();
        assert_eq!(edge.cds_start, 100);
        assert_eq!(edge.cds_end, None);
    }
}

// -------------------------------------------------------------------------
// 3. Selection Tests
// -------------------------------------------------------------------------

mod test_selection {
    use super::*;

    fn scored(id: u32, orf_start: i64, coding: f64, atgs: usize, matched: bool) -> ScoredOrf {
        let config = Config::default();
        let mut cds = GenomicCds {
            candidate: candidate("PB.1.1", id, orf_start, orf_start + 299, coding),
            chrom: "chr1".to_string(),
            strand: Strand::Positive,
            cds_start: 1000 + orf_start,
            cds_end: None,
            reference_matches: Vec::new(),
        };
        if matched {
            cds.reference_matches.push("ENST1".to_string());
        }
        // a sequence holding exactly `atgs` start codons before the ORF
        let mut seq = b"ATG".repeat(atgs);
        seq.resize(orf_start as usize + 300, b'C');
        score_cds(cds, Some(seq.as_slice()), &config)
    }

    #[test]
    fn test_reference_match_beats_higher_composite() {
        let candidates = vec![scored(1, 100, 0.99, 0, false), scored(2, 400, 0.80, 3, true)];
        assert!(candidates[0].composite_score > candidates[1].composite_score);
        assert_eq!(candidates[1].upstream_atgs, UpstreamAtgs::Count(3));

        let selected = select_orf(&candidates, 0.364).unwrap();
        assert_eq!(selected.orf.cds.candidate.id, "PB.1.1_ORF_2");
    }

    #[test]
    fn test_selection_invariant_to_permutation() {
        let candidates = vec![
            scored(1, 100, 0.7, 2, false),
            scored(2, 200, 0.7, 2, false),
            scored(3, 50, 0.6, 1, false),
            scored(4, 300, 0.9, 5, true),
            scored(5, 350, 0.9, 5, true),
        ];
        let expected = select_orf(&candidates, 0.364).unwrap();
        let mut rng = Lcg(3);
        for _ in 0..30 {
            let mut shuffled = candidates.clone();
            for i in (1..shuffled.len()).rev() {
                let j = rng.next(i as i64 + 1) as usize;
                shuffled.swap(i, j);
            }
            assert_eq!(select_orf(&shuffled, 0.364).unwrap(), expected);
        }
        assert_eq!(expected.orf.cds.candidate.id, "PB.1.1_ORF_4");
        assert_eq!(expected.confidence, Confidence::Plausible);
    }

    #[test]
    fn test_missing_sequence_remains_eligible() {
        let config = Config::default();
        let cds = GenomicCds {
            candidate: candidate("PB.1.1", 1, 10, 300, 0.9),
            chrom: "chr1".to_string(),
            strand: Strand::Positive,
            cds_start: 1010,
            cds_end: Some(1300),
            reference_matches: Vec::new(),
        };
        let orf = score_cds(cds, None, &config);
        assert_eq!(orf.upstream_atgs, UpstreamAtgs::Unbounded);
        assert_eq!(orf.composite_score, 0.0);
        let selected = select_orf(&[orf], config.low_quality_threshold).unwrap();
        assert_eq!(selected.orf.cds.candidate.id, "PB.1.1_ORF_1");
    }
}

// -------------------------------------------------------------------------
// 4. Partitioned Calling Tests
// -------------------------------------------------------------------------

mod test_partitioning {
    use super::*;

    const GTF: &str = "chr1\tPacBio\texon\t100\t199\t.\t+\t.\tgene_id \"PB.1\"; transcript_id \"PB.1.1\";
chr1\tPacBio\texon\t300\t399\t.\t+\t.\tgene_id \"PB.1\"; transcript_id \"PB.1.1\";
chr1\tPacBio\texon\t5000\t5199\t.\t-\t.\tgene_id \"PB.2\"; transcript_id \"PB.2.1\";
chr2\tPacBio\texon\t700\t899\t.\t+\t.\tgene_id \"PB.3\"; transcript_id \"PB.3.1\";
chr2\tPacBio\texon\t950\t999\t.\t+\t.\tgene_id \"PB.3\"; transcript_id \"PB.3.1\";
chrM\tPacBio\texon\t10\t300\t.\t-\t.\tgene_id \"PB.10\"; transcript_id \"PB.10.1\";
";

    const ORFS: &str = "ID\tmRNA\tORF_strand\tORF_frame\tORF_start\tORF_end\tORF\tFickett\tHexamer\tCoding_prob
PB.1.1_ORF_1\t200\t+\t1\t10\t150\t141\t1.0\t0.1\t0.9
PB.1.1_ORF_2\t200\t+\t2\t110\t190\t81\t1.0\t0.1\t0.5
PB.2.1_ORF_1\t200\t+\t1\t1\t120\t120\t1.0\t0.1\t0.7
PB.3.1_ORF_1\t250\t+\t3\t30\t240\t211\t1.0\t0.1\t0.2
PB.10.1_ORF_1\t291\t+\t1\t5\t200\t196\t1.0\t0.1\t0.6
PB.10.1_ORF_2\t291\t+\t2\t500\t600\t101\t1.0\t0.1\t0.6
";

    fn run(granularity: Granularity, reversed: bool) -> isocds::pipeline::CallOutcome {
        let data = parse_transcripts_reader(BufReader::new(GTF.as_bytes())).unwrap();
        let transcripts = TranscriptIndex::new(data.into_transcripts());
        let start_codons = StartCodonIndex::from_codons(vec![StartCodon {
            chrom: "chr1".to_string(),
            strand: Strand::Positive,
            start: 309,
            end: 311,
            transcript_id: "ENST9".to_string(),
        }]);
        let mut candidates = parse_orf_table_reader(BufReader::new(ORFS.as_bytes())).unwrap();
        if reversed {
            candidates.reverse();
        }

        let mut config = Config::default();
        config.granularity = granularity;
        call_orfs(
            CallInputs {
                candidates,
                transcripts: &transcripts,
                start_codons: &start_codons,
                sequences: None,
            },
            &config,
        )
        .unwrap()
    }

    #[test]
    fn test_one_vs_many_partitions() {
        let whole = run(Granularity::Whole, false);
        let split = run(Granularity::Chromosome, true);
        assert_eq!(whole.mapped, split.mapped);
        assert_eq!(whole.selected, split.selected);
        assert_eq!(whole.dropouts, split.dropouts);
    }

    #[test]
    fn test_calls_across_partitions() {
        let outcome = run(Granularity::Chromosome, false);
        let accs: Vec<&str> = outcome.selected.iter().map(|s| s.orf.accession()).collect();
        assert_eq!(accs, vec!["PB.1.1", "PB.2.1", "PB.3.1", "PB.10.1"]);

        // offset 110 lands 10 bases into the second exon
        let pb11 = &outcome.selected[0];
        assert_eq!(pb11.orf.cds.candidate.id, "PB.1.1_ORF_2");
        assert_eq!(pb11.orf.cds.cds_start, 309);

        let pb21 = &outcome.selected[1];
        assert_eq!(pb21.orf.cds.cds_start, 5199);

        assert_eq!(outcome.selected[2].confidence, Confidence::ClearBest);
        // the second PB.10.1 candidate lies past the transcript end
        assert_eq!(outcome.mapped.len(), 5);
        assert!(outcome.dropouts.is_empty());
    }
}

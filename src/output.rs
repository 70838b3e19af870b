//! Output formatting for isocds results.
//!
//! Tab-separated ORF tables, collapse dropout reports, and routing of the
//! original GTF and FASTA records into kept and dropout files.

use ahash::AHashSet;
use anyhow::{Context, Result};
use bio::io::fasta;
use std::io::{BufRead, Write};

use crate::collapse::Dropout;
use crate::parser::fasta::accession_from_id;
use crate::parser::gtf::{extract_attribute, RejectedTranscript};
use crate::pipeline::OrfDropout;
use crate::types::{ScoredOrf, SelectedOrf};

const SCORED_HEADER: &str = "pb_acc\tID\torf_rank\tlen\tchrom\tstrand\torf_strand\torf_frame\torf_start\torf_end\torf_len\tcds_start\tcds_end\tfickett\thexamer\tcoding_score\tupstream_atgs\tatg_score\torf_score\tgencode_atg\thas_stop_codon";

fn py_bool(value: bool) -> &'static str {
    if value {
        "True"
    } else {
        "False"
    }
}

/// Format the columns shared by the mapped and selected tables.
pub fn format_scored_fields(orf: &ScoredOrf) -> String {
    let cds = &orf.cds;
    let c = &cds.candidate;
    let cds_end = cds
        .cds_end
        .map(|e| e.to_string())
        .unwrap_or_else(|| "NA".to_string());
    let gencode_atg = if cds.reference_matches.is_empty() {
        "NA".to_string()
    } else {
        cds.reference_matches.join(",")
    };

    format!(
        "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{:.6}\t{:.6}\t{:.6}\t{}\t{:.6}\t{:.6}\t{}\t{}",
        c.accession,
        c.id,
        c.orf_rank,
        c.mrna_len,
        cds.chrom,
        cds.strand,
        c.orf_strand,
        c.frame,
        c.orf_start,
        c.orf_end,
        c.orf_len,
        cds.cds_start,
        cds_end,
        c.fickett,
        c.hexamer,
        c.coding_probability,
        orf.upstream_atgs,
        orf.atg_score,
        orf.composite_score,
        gencode_atg,
        py_bool(c.has_stop_codon),
    )
}

/// Write every mapped and scored candidate.
pub fn write_mapped_table<W: Write>(writer: &mut W, orfs: &[ScoredOrf]) -> Result<()> {
    writeln!(writer, "{}", SCORED_HEADER)?;
    for orf in orfs {
        writeln!(writer, "{}", format_scored_fields(orf))?;
    }
    Ok(())
}

pub fn format_selected_line(selected: &SelectedOrf) -> String {
    format!(
        "{}\t{}",
        format_scored_fields(&selected.orf),
        selected.confidence
    )
}

/// Write one row per accession with its called ORF.
pub fn write_selected_table<W: Write>(writer: &mut W, selected: &[SelectedOrf]) -> Result<()> {
    writeln!(writer, "{}\torf_calling_confidence", SCORED_HEADER)?;
    for s in selected {
        writeln!(writer, "{}", format_selected_line(s))?;
    }
    Ok(())
}

/// Write accessions for which no ORF could be called.
pub fn write_orf_dropouts<W: Write>(writer: &mut W, dropouts: &[OrfDropout]) -> Result<()> {
    writeln!(writer, "pb_acc\treason")?;
    for d in dropouts {
        writeln!(writer, "{}\t{}", d.accession, d.reason)?;
    }
    Ok(())
}

/// Write the collapse dropout report: transcripts rejected while parsing,
/// then redundant models.
pub fn write_collapse_dropouts<W: Write>(
    writer: &mut W,
    dropouts: &[Dropout],
    rejected: &[RejectedTranscript],
) -> Result<()> {
    writeln!(writer, "accession\tlocus\treason")?;
    for r in rejected {
        writeln!(writer, "{}\t{}\tmalformed:{}", r.accession, r.locus_id, r.error)?;
    }
    for d in dropouts {
        writeln!(
            writer,
            "{}\t{}\t{}",
            d.transcript.accession,
            d.transcript.locus_id,
            d.reason.describe()
        )?;
    }
    Ok(())
}

/// Copy GTF lines into `kept` when their transcript survived and into
/// `dropped` otherwise. Lines without a `transcript_id` go to `kept`.
///
/// Returns the number of lines written to each output.
pub fn route_gtf_records<R, K, D>(
    reader: R,
    survivors: &AHashSet<String>,
    kept: &mut K,
    dropped: &mut D,
) -> Result<(usize, usize)>
where
    R: BufRead,
    K: Write,
    D: Write,
{
    let (mut n_kept, mut n_dropped) = (0, 0);
    for line_result in reader.lines() {
        let line = line_result.context("Failed to read GTF line")?;
        let accession = line
            .split('\t')
            .nth(8)
            .and_then(|attrs| extract_attribute(attrs, "transcript_id"));
        match accession {
            Some(acc) if !survivors.contains(&acc) => {
                writeln!(dropped, "{}", line)?;
                n_dropped += 1;
            }
            _ => {
                writeln!(kept, "{}", line)?;
                n_kept += 1;
            }
        }
    }
    Ok((n_kept, n_dropped))
}

/// Copy FASTA records into `kept` or `dropped` by accession.
pub fn route_fasta_records<R, K, D>(
    reader: R,
    survivors: &AHashSet<String>,
    kept: K,
    dropped: D,
) -> Result<(usize, usize)>
where
    R: BufRead,
    K: Write,
    D: Write,
{
    let mut kept_writer = fasta::Writer::new(kept);
    let mut dropped_writer = fasta::Writer::new(dropped);
    let (mut n_kept, mut n_dropped) = (0, 0);

    for record in fasta::Reader::from_bufread(reader).records() {
        let record = record.context("Malformed FASTA record")?;
        if survivors.contains(accession_from_id(record.id())) {
            kept_writer.write_record(&record)?;
            n_kept += 1;
        } else {
            dropped_writer.write_record(&record)?;
            n_dropped += 1;
        }
    }
    kept_writer.flush()?;
    dropped_writer.flush()?;
    Ok((n_kept, n_dropped))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collapse::{DropReason, Relation};
    use crate::error::StructureError;
    use crate::types::{Confidence, Exon, GenomicCds, OrfCandidate, Strand, TranscriptModel, UpstreamAtgs};
    use std::io::BufReader;

    fn scored() -> ScoredOrf {
        ScoredOrf {
            cds: GenomicCds {
                candidate: OrfCandidate {
                    id: "PB.1.1_ORF_1".to_string(),
                    accession: "PB.1.1".to_string(),
                    orf_rank: "1".to_string(),
                    orf_strand: Strand::Positive,
                    frame: 2,
                    orf_start: 60,
                    orf_end: 359,
                    orf_len: 300,
                    mrna_len: 1200,
                    fickett: 1.25,
                    hexamer: -0.5,
                    coding_probability: 0.9,
                    has_stop_codon: true,
                },
                chrom: "chr1".to_string(),
                strand: Strand::Negative,
                cds_start: 5000,
                cds_end: None,
                reference_matches: vec!["ENST1".to_string(), "ENST2".to_string()],
            },
            upstream_atgs: UpstreamAtgs::Count(3),
            atg_score: 0.5,
            composite_score: 0.45,
        }
    }

    #[test]
    fn test_format_scored_fields() {
        let line = format_scored_fields(&scored());
        let fields: Vec<&str> = line.split('\t').collect();
        assert_eq!(fields.len(), SCORED_HEADER.split('\t').count());
        assert_eq!(fields[0], "PB.1.1");
        assert_eq!(fields[5], "-");
        assert_eq!(fields[11], "5000");
        assert_eq!(fields[12], "NA");
        assert_eq!(fields[14], "-0.500000");
        assert_eq!(fields[16], "3");
        assert_eq!(fields[19], "ENST1,ENST2");
        assert_eq!(fields[20], "True");
    }

    #[test]
    fn test_selected_table_has_confidence() {
        let selected = SelectedOrf {
            orf: scored(),
            confidence: Confidence::ClearBest,
        };
        let mut buf = Vec::new();
        write_selected_table(&mut buf, &[selected]).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert!(lines[0].ends_with("\torf_calling_confidence"));
        assert!(lines[1].ends_with("\tClear Best ORF"));
    }

    #[test]
    fn test_unbounded_upstream_prints_inf() {
        let mut orf = scored();
        orf.upstream_atgs = UpstreamAtgs::Unbounded;
        orf.cds.reference_matches.clear();
        let line = format_scored_fields(&orf);
        assert!(line.contains("\tinf\t"));
        assert!(line.contains("\tNA\tTrue"));
    }

    #[test]
    fn test_write_collapse_dropouts() {
        let transcript = TranscriptModel {
            chrom: "chr1".to_string(),
            locus_id: "PB.1".to_string(),
            accession: "PB.1.2".to_string(),
            strand: Strand::Positive,
            exons: vec![Exon::new(100, 200)],
        };
        let dropouts = vec![Dropout {
            transcript,
            reason: DropReason::Redundant {
                kept_by: "PB.1.1".to_string(),
                relation: Relation::AContainsB,
            },
        }];
        let mut buf = Vec::new();
        let rejected = vec![RejectedTranscript {
            accession: "PB.1.3".to_string(),
            locus_id: "PB.1".to_string(),
            error: StructureError::EmptyExons {
                accession: "PB.1.3".to_string(),
            },
        }];
        write_collapse_dropouts(&mut buf, &dropouts, &rejected).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "accession\tlocus\treason");
        assert_eq!(lines[1], "PB.1.3\tPB.1\tmalformed:transcript PB.1.3 has no exons");
        assert_eq!(lines[2], "PB.1.2\tPB.1\tcontained_in:PB.1.1");
    }

    #[test]
    fn test_route_gtf_records() {
        let gtf = "#header
chr1\tPacBio\ttranscript\t100\t200\t.\t+\t.\tgene_id \"PB.1\"; transcript_id \"PB.1.1\";
chr1\tPacBio\texon\t100\t200\t.\t+\t.\tgene_id \"PB.1\"; transcript_id \"PB.1.1\";
chr1\tPacBio\texon\t150\t200\t.\t+\t.\tgene_id \"PB.1\"; transcript_id \"PB.1.2\";
";
        let survivors: AHashSet<String> = ["PB.1.1".to_string()].into_iter().collect();
        let (mut kept, mut dropped) = (Vec::new(), Vec::new());
        let counts = route_gtf_records(BufReader::new(gtf.as_bytes()), &survivors, &mut kept, &mut dropped).unwrap();
        assert_eq!(counts, (3, 1));
        let dropped = String::from_utf8(dropped).unwrap();
        assert!(dropped.contains("PB.1.2"));
        assert!(!String::from_utf8(kept).unwrap().contains("PB.1.2"));
    }

    #[test]
    fn test_route_fasta_records() {
        let fa = ">PB.1.1|chr1\nACGT\n>PB.1.2\nGGCC\n";
        let survivors: AHashSet<String> = ["PB.1.1".to_string()].into_iter().collect();
        let (mut kept, mut dropped) = (Vec::new(), Vec::new());
        let counts =
            route_fasta_records(BufReader::new(fa.as_bytes()), &survivors, &mut kept, &mut dropped).unwrap();
        assert_eq!(counts, (1, 1));
        assert_eq!(String::from_utf8(kept).unwrap(), ">PB.1.1|chr1\nACGT\n");
        assert_eq!(String::from_utf8(dropped).unwrap(), ">PB.1.2\nGGCC\n");
    }
}

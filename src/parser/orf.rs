//! CPAT ORF table parsing.

use ahash::AHashMap;
use anyhow::{Context, Result};
use log::warn;
use std::io::BufRead;
use std::path::Path;

use crate::parser::open_input;
use crate::types::{OrfCandidate, Strand};

const ORF_COLUMNS: usize = 10;

/// Split a CPAT ORF id into accession and rank.
///
/// `PB.1.1|chr1:100-900(+)|transcript/1_ORF_2` gives `("PB.1.1", "2")`.
pub fn parse_orf_id(id: &str) -> Option<(String, String)> {
    let mut fields = id.split('_');
    let first = fields.next()?;
    let rank = fields.next_back()?;
    // `<accession>_<misc>_<rank>` needs a misc field
    fields.next()?;

    let accession = first.split('|').next().unwrap_or(first);
    if accession.is_empty() || rank.is_empty() {
        return None;
    }
    Some((accession.to_string(), rank.to_string()))
}

fn parse_field<T: std::str::FromStr>(fields: &[&str], idx: usize, name: &str) -> std::result::Result<T, String> {
    fields[idx]
        .trim()
        .parse::<T>()
        .map_err(|_| format!("invalid {} '{}'", name, fields[idx]))
}

fn parse_orf_line(line: &str) -> std::result::Result<OrfCandidate, String> {
    let fields: Vec<&str> = line.split('\t').collect();
    if fields.len() < ORF_COLUMNS {
        return Err(format!("expected {} columns, found {}", ORF_COLUMNS, fields.len()));
    }

    let id = fields[0].trim();
    let (accession, orf_rank) = parse_orf_id(id).ok_or_else(|| format!("unrecognised ORF id '{}'", id))?;
    let orf_strand = fields[2]
        .trim()
        .parse::<Strand>()
        .map_err(|e| format!("{} (found '{}')", e, fields[2]))?;
    let orf_start: i64 = parse_field(&fields, 4, "ORF_start")?;
    let orf_end: i64 = parse_field(&fields, 5, "ORF_end")?;
    if orf_start < 1 || orf_end < orf_start {
        return Err(format!("invalid ORF span {}-{}", orf_start, orf_end));
    }
    let coding_probability: f64 = parse_field(&fields, 9, "Coding_prob")?;
    if !(0.0..=1.0).contains(&coding_probability) {
        return Err(format!("Coding_prob {} outside [0, 1]", coding_probability));
    }

    Ok(OrfCandidate {
        id: id.to_string(),
        accession,
        orf_rank,
        orf_strand,
        frame: parse_field(&fields, 3, "ORF_frame")?,
        orf_start,
        orf_end,
        orf_len: parse_field(&fields, 6, "ORF")?,
        mrna_len: parse_field(&fields, 1, "mRNA")?,
        fickett: parse_field(&fields, 7, "Fickett")?,
        hexamer: parse_field(&fields, 8, "Hexamer")?,
        coding_probability,
        has_stop_codon: false,
    })
}

/// Parse a CPAT ORF table (plain or gzip-compressed).
pub fn parse_orf_table(path: &Path) -> Result<Vec<OrfCandidate>> {
    let reader = open_input(path, "ORF table")?;
    parse_orf_table_reader(reader)
}

/// Parse ORF candidates from a reader. `ID` header rows are skipped.
pub fn parse_orf_table_reader<R: BufRead>(reader: R) -> Result<Vec<OrfCandidate>> {
    let mut candidates = Vec::new();
    let mut skipped = 0;

    for (line_idx, line_result) in reader.lines().enumerate() {
        let line = line_result.context("Failed to read ORF table line")?;
        if line.trim().is_empty() || line.starts_with('#') {
            continue;
        }
        if line.split('\t').next().map(str::trim) == Some("ID") {
            continue;
        }
        match parse_orf_line(&line) {
            Ok(candidate) => candidates.push(candidate),
            Err(reason) => {
                warn!("Skipping ORF table line {}: {}", line_idx + 1, reason);
                skipped += 1;
            }
        }
    }

    if skipped > 0 {
        warn!("Skipped {} malformed ORF table lines", skipped);
    }
    Ok(candidates)
}

/// Set `has_stop_codon` from the ORF FASTA status; ids absent from the
/// FASTA stay false.
pub fn apply_stop_codon_status(candidates: &mut [OrfCandidate], status: &AHashMap<String, bool>) {
    for candidate in candidates {
        candidate.has_stop_codon = status.get(&candidate.id).copied().unwrap_or(false);
    }
}

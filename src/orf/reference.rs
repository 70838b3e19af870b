//! Exact matching of mapped CDS starts against reference start codons.

use ahash::AHashMap;

use crate::types::Strand;

/// A `start_codon` feature from the reference annotation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartCodon {
    pub chrom: String,
    pub strand: Strand,
    pub start: i64,
    pub end: i64,
    pub transcript_id: String,
}

/// Reference start codons keyed by chromosome, strand and the coordinate of
/// the first translated base (`start` on `+`, `end` on `-`).
#[derive(Debug, Clone, Default)]
pub struct StartCodonIndex {
    by_position: AHashMap<(String, Strand), AHashMap<i64, Vec<String>>>,
}

impl StartCodonIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_codons(codons: impl IntoIterator<Item = StartCodon>) -> Self {
        let mut index = Self::new();
        for codon in codons {
            index.insert(codon);
        }
        index
    }

    pub fn insert(&mut self, codon: StartCodon) {
        let key = match codon.strand {
            Strand::Positive => codon.start,
            Strand::Negative => codon.end,
        };
        let ids = self
            .by_position
            .entry((codon.chrom, codon.strand))
            .or_default()
            .entry(key)
            .or_default();
        if !ids.contains(&codon.transcript_id) {
            ids.push(codon.transcript_id);
        }
    }

    /// Reference transcript ids whose start codon sits exactly at `cds_start`.
    pub fn matches(&self, chrom: &str, strand: Strand, cds_start: i64) -> &[String] {
        self.by_position
            .get(&(chrom.to_string(), strand))
            .and_then(|positions| positions.get(&cds_start))
            .map(|ids| ids.as_slice())
            .unwrap_or(&[])
    }

    /// Number of distinct indexed positions.
    pub fn len(&self) -> usize {
        self.by_position.values().map(|p| p.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

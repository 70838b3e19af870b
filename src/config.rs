//! Configuration and defaults for isocds.
//!
//! This module contains the configuration structure and default values
//! that control isoform collapsing and ORF calling.

use crate::types::Granularity;

/// Default stop codons used to flag complete ORFs.
pub const DEFAULT_STOP_CODONS: [&str; 3] = ["TAG", "TAA", "TGA"];

/// Coding probability at or below which a called ORF is low quality.
pub const DEFAULT_LOW_QUALITY_THRESHOLD: f64 = 0.364;

/// Configuration for collapsing and ORF calling.
#[derive(Debug, Clone)]
pub struct Config {
    /// Maximum junction distance in bp tolerated when comparing structures.
    pub fuzzy_tolerance: i64,
    /// Start codon counted upstream of each ORF.
    pub start_codon: String,
    /// Codons marking a complete ORF.
    pub stop_codons: Vec<String>,
    /// Upstream-ATG count at which the ATG score drops to 0.5.
    pub atg_shift: f64,
    /// Slope of the ATG score sigmoid.
    pub atg_growth: f64,
    /// Coding probability threshold for "Low Quality ORF".
    pub low_quality_threshold: f64,
    /// Partition granularity for mapping and selection.
    pub granularity: Granularity,
    /// Number of worker threads.
    pub threads: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            fuzzy_tolerance: 0,
            start_codon: "ATG".to_string(),
            stop_codons: DEFAULT_STOP_CODONS.iter().map(|s| s.to_string()).collect(),
            atg_shift: 10.0,
            atg_growth: 0.5,
            low_quality_threshold: DEFAULT_LOW_QUALITY_THRESHOLD,
            granularity: Granularity::Chromosome,
            threads: 8,
        }
    }
}

impl Config {
    /// Create a new config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the fuzzy junction tolerance.
    ///
    /// Returns false (leaving the config unchanged) for negative values.
    pub fn set_tolerance(&mut self, tolerance: i64) -> bool {
        if tolerance < 0 {
            return false;
        }
        self.fuzzy_tolerance = tolerance;
        true
    }

    /// Set the start codon from a nucleotide triplet.
    pub fn set_start_codon(&mut self, codon: &str) -> bool {
        let codon = codon.to_ascii_uppercase();
        if codon.len() != 3 || !codon.bytes().all(|b| matches!(b, b'A' | b'C' | b'G' | b'T')) {
            return false;
        }
        self.start_codon = codon;
        true
    }

    /// Parse and validate stop codons from a comma-separated string.
    pub fn parse_stop_codons(&mut self, codons_str: &str) -> bool {
        let mut codons = Vec::new();
        for codon in codons_str.split(',') {
            let codon = codon.to_ascii_uppercase();
            if codon.len() != 3 || !codon.bytes().all(|b| matches!(b, b'A' | b'C' | b'G' | b'T')) {
                return false;
            }
            if !codons.contains(&codon) {
                codons.push(codon);
            }
        }
        self.stop_codons = codons;
        true
    }

    /// Set the sigmoid constants of the ATG score. Growth must be positive.
    pub fn set_atg_sigmoid(&mut self, shift: f64, growth: f64) -> bool {
        if !shift.is_finite() || !growth.is_finite() || growth <= 0.0 {
            return false;
        }
        self.atg_shift = shift;
        self.atg_growth = growth;
        true
    }

    /// Set the low-quality threshold; must lie in [0, 1].
    pub fn set_low_quality_threshold(&mut self, threshold: f64) -> bool {
        if !(0.0..=1.0).contains(&threshold) {
            return false;
        }
        self.low_quality_threshold = threshold;
        true
    }
}

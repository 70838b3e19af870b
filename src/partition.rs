//! Partitioned parallel execution.
//!
//! Work is split into independent partitions keyed by chromosome (and strand
//! while mapping). Each partition is one task on the current rayon pool; the
//! join waits for every task and concatenates results in key order. Any
//! failing partition fails the whole run.

use std::collections::BTreeMap;
use std::fmt;

use ahash::AHashMap;
use anyhow::{Context, Result};
use rayon::prelude::*;

use crate::error::PartitionError;
use crate::types::{Granularity, Strand};

/// Identifies one independent unit of work.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PartitionKey {
    Whole,
    Chrom(String),
    ChromStrand(String, Strand),
}

impl PartitionKey {
    /// Key for mapping work: plus and minus strands use disjoint walks.
    pub fn for_mapping(granularity: Granularity, chrom: &str, strand: Strand) -> Self {
        match granularity {
            Granularity::Whole => PartitionKey::Whole,
            Granularity::Chromosome => PartitionKey::ChromStrand(chrom.to_string(), strand),
        }
    }

    /// Key for selection work.
    pub fn for_selection(granularity: Granularity, chrom: &str) -> Self {
        match granularity {
            Granularity::Whole => PartitionKey::Whole,
            Granularity::Chromosome => PartitionKey::Chrom(chrom.to_string()),
        }
    }
}

impl fmt::Display for PartitionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PartitionKey::Whole => write!(f, "all"),
            PartitionKey::Chrom(chrom) => write!(f, "{}", chrom),
            PartitionKey::ChromStrand(chrom, strand) => write!(f, "{}{}", chrom, strand),
        }
    }
}

/// Group items into partitions, preserving input order within each.
pub fn partition_by<T, F>(items: Vec<T>, key_fn: F) -> BTreeMap<PartitionKey, Vec<T>>
where
    F: Fn(&T) -> PartitionKey,
{
    let mut partitions: BTreeMap<PartitionKey, Vec<T>> = BTreeMap::new();
    for item in items {
        partitions.entry(key_fn(&item)).or_default().push(item);
    }
    partitions
}

/// Check that no accession has items in more than one partition.
pub fn ensure_unsplit<T, F>(
    partitions: &BTreeMap<PartitionKey, Vec<T>>,
    accession_fn: F,
) -> Result<(), PartitionError>
where
    F: Fn(&T) -> &str,
{
    let mut owner: AHashMap<&str, &PartitionKey> = AHashMap::new();
    for (key, items) in partitions {
        for item in items {
            let accession = accession_fn(item);
            match owner.get(accession) {
                Some(&first) if first != key => {
                    return Err(PartitionError::SplitAccession {
                        accession: accession.to_string(),
                        first: first.to_string(),
                        second: key.to_string(),
                    });
                }
                Some(_) => {}
                None => {
                    owner.insert(accession, key);
                }
            }
        }
    }
    Ok(())
}

/// Run `task` on every partition in parallel and concatenate the results in
/// partition key order.
pub fn run_partitions<T, R, F>(partitions: BTreeMap<PartitionKey, Vec<T>>, task: F) -> Result<Vec<R>>
where
    T: Send,
    R: Send,
    F: Fn(&PartitionKey, Vec<T>) -> Result<Vec<R>> + Sync,
{
    let units: Vec<(PartitionKey, Vec<T>)> = partitions.into_iter().collect();
    let results: Vec<Result<Vec<R>>> = units
        .into_par_iter()
        .map(|(key, items)| task(&key, items).with_context(|| format!("Partition {} failed", key)))
        .collect();

    let mut merged = Vec::new();
    for result in results {
        merged.extend(result?);
    }
    Ok(merged)
}

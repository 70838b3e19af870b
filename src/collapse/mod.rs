//! Isoform collapsing: structural comparison and redundancy removal.

pub mod collapser;
pub mod compare;

pub use collapser::{collapse_loci, collapse_locus, CollapseResult, DropReason, Dropout};
pub use compare::{classify, Relation};
